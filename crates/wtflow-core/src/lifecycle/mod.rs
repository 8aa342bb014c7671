//! 環境のライフサイクル
//!
//! 状態遷移: absent → provisioning → active → stopped → absent
//! （remove はどの状態からでも absent に戻す）
//!
//! レジストリと生成済み定義の整合性を保ちながら、作成・削除・起動・停止を順序立てて実行します。
//! ベストエフォートのステップの失敗は [`Warning`] として [`Outcome`] に積まれ、
//! 操作自体は成功として返ります。

mod collaborators;
mod operate;
mod outcome;
mod provision;

pub use collaborators::{HookRunner, LinkCleaner, Runtime, Vcs};
pub use outcome::{Outcome, Warning, WarningStep};

use crate::context::{ContextResolver, EnvKind, EnvironmentContext};
use crate::error::Result;
use crate::hooks::ShellHookRunner;
use crate::links::NodeModulesLinkCleaner;
use crate::port::PortMapping;
use std::path::PathBuf;
use std::time::Duration;

/// ベースブランチのデフォルト
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// ヘルス待機の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// 起動後にヘルスチェック付きサービスの準備完了を待つか
    pub wait_for_health: bool,
    pub health_poll_interval: Duration,
    pub health_timeout: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            wait_for_health: true,
            health_poll_interval: Duration::from_secs(2),
            health_timeout: Duration::from_secs(120),
        }
    }
}

/// create の入力
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: String,
    /// 未指定なら環境名と同じブランチ
    pub branch: Option<String>,
    /// 未指定なら `main`
    pub base: Option<String>,
    pub force: bool,
    pub skip_hooks: bool,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// remove の入力
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    pub delete_branch: bool,
    pub delete_remote: bool,
    pub remove_volumes: bool,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub name: String,
    pub slot: u32,
    pub path: PathBuf,
    pub branch: String,
    pub ports: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub name: String,
    /// ワークツリーが最初から存在しなかった
    pub already_absent: bool,
    pub released_slot: Option<u32>,
    pub branch: Option<String>,
    pub branch_deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    /// (環境名, 失敗理由)
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub environment: EnvKind,
    pub namespace: String,
    pub slot: u32,
    /// (サービス名, URL)
    pub urls: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopped {
    pub environment: EnvKind,
    pub already_stopped: bool,
    pub links_removed: usize,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub environment: EnvKind,
    pub slot: u32,
    pub namespace: String,
    pub working_dir: PathBuf,
    pub definition_path: PathBuf,
    pub definition_exists: bool,
    pub ports: Vec<PortMapping>,
    /// ランタイムの ps 出力
    pub containers: Option<String>,
    /// (サービス名, IP アドレス)
    pub addresses: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentState {
    Absent,
    /// スロットだけある、またはディレクトリはあるが定義がない
    Provisioning,
    Active,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSummary {
    pub name: String,
    pub slot: Option<u32>,
    pub path: PathBuf,
    pub branch: Option<String>,
    pub state: EnvironmentState,
    /// (サービス名, `main` ポートのホストポート)
    pub main_ports: Vec<(String, u32)>,
}

/// ライフサイクルの司令塔
pub struct Orchestrator {
    resolver: ContextResolver,
    vcs: Box<dyn Vcs>,
    runtime: Box<dyn Runtime>,
    hooks: Box<dyn HookRunner>,
    links: Box<dyn LinkCleaner>,
    options: LifecycleOptions,
}

impl Orchestrator {
    pub fn new(resolver: ContextResolver, vcs: Box<dyn Vcs>, runtime: Box<dyn Runtime>) -> Self {
        Self {
            resolver,
            vcs,
            runtime,
            hooks: Box::new(ShellHookRunner),
            links: Box::new(NodeModulesLinkCleaner),
            options: LifecycleOptions::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn HookRunner>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_link_cleaner(mut self, links: Box<dyn LinkCleaner>) -> Self {
        self.links = links;
        self
    }

    pub fn with_options(mut self, options: LifecycleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    /// 対象環境のコンテキストを解決
    pub fn context(&self, name: Option<&str>) -> Result<EnvironmentContext> {
        self.resolver.resolve(name)
    }
}
