//! プロジェクト設定

use super::service::ServiceSpec;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_NAME: &str = "project";
pub const DEFAULT_WORKTREE_DIR: &str = ".worktrees";
pub const DEFAULT_SECRETS_FILE: &str = ".env";
pub const DEFAULT_PORT_OFFSET: u32 = 1000;
pub const DEFAULT_MAX_WORKTREES: u32 = 5;

/// wtflow.kdl 全体の設定
///
/// 1回の起動につき1度だけロードされ、以降は変更されない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    pub ports: PortPolicy,
    /// 宣言順のサービスカタログ
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub rewrites: Vec<RewriteRule>,
    #[serde(default)]
    pub hooks: Hooks,
}

impl ProjectConfig {
    /// 名前でサービスを検索
    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    /// 名前付き環境の名前空間プレフィックス（`{project}-wt`）
    pub fn env_prefix(&self) -> String {
        format!("{}-wt", self.project.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    /// ワークツリー格納ディレクトリ（プロジェクトルートからの相対パス）
    pub worktree_dir: String,
    /// 新しいワークツリーへコピーするローカルシークレットファイル
    pub secrets_file: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            worktree_dir: DEFAULT_WORKTREE_DIR.to_string(),
            secrets_file: DEFAULT_SECRETS_FILE.to_string(),
        }
    }
}

/// ポート割り当てポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPolicy {
    pub offset: u32,
    pub max_worktrees: u32,
}

impl Default for PortPolicy {
    fn default() -> Self {
        Self {
            offset: DEFAULT_PORT_OFFSET,
            max_worktrees: DEFAULT_MAX_WORKTREES,
        }
    }
}

/// パッケージ名前空間の書き換えルール（ローカルリンク用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default)]
    pub post_create: Vec<String>,
}
