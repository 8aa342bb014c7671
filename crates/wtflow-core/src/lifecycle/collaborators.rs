//! 外部コラボレーターのインターフェース
//!
//! git・コンテナランタイム・シェルフック・ローカルリンクはすべてここで抽象化し、
//! オーケストレーターはトレイト越しにのみ呼び出す。

use crate::model::RewriteRule;
use anyhow::Result;
use std::path::Path;

/// バージョン管理（ワークツリー操作）
pub trait Vcs {
    /// リモートを取得（オフラインでも続行できるよう呼び出し側は失敗を許容する）
    fn fetch(&self) -> Result<()>;

    /// `base` から `branch` のワークツリーを `path` に作成
    ///
    /// `branch` が既に存在する場合はそれを再利用する。
    fn create_worktree(&self, path: &Path, branch: &str, base: &str) -> Result<()>;

    fn remove_worktree(&self, path: &Path) -> Result<()>;

    fn branch_exists(&self, branch: &str) -> Result<bool>;

    fn current_branch(&self, worktree: &Path) -> Result<String>;

    fn has_uncommitted_changes(&self, worktree: &Path) -> Result<bool>;

    /// ブランチを削除（`remote` が true ならリモートからも）
    fn delete_branch(&self, branch: &str, remote: bool) -> Result<()>;
}

/// コンテナランタイム
pub trait Runtime {
    fn is_available(&self) -> bool;

    fn up(
        &self,
        definition: &Path,
        namespace: &str,
        build: bool,
        services: &[String],
    ) -> Result<()>;

    fn down(&self, definition: &Path, namespace: &str, remove_volumes: bool) -> Result<()>;

    /// ログを表示（follow の中断は正常終了として扱う）
    fn logs(
        &self,
        definition: &Path,
        namespace: &str,
        follow: bool,
        services: &[String],
    ) -> Result<()>;

    fn ps(&self, definition: &Path, namespace: &str) -> Result<String>;

    fn is_running(&self, container: &str) -> Result<bool>;

    /// ヘルスチェックがない実行中コンテナは healthy とみなす
    fn is_healthy(&self, container: &str) -> Result<bool>;

    /// `namespace` のネットワーク上のアドレスを優先して返す
    fn container_ip(&self, namespace: &str, container: &str) -> Result<Option<String>>;
}

/// 作成後フックの実行
pub trait HookRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<()>;
}

/// ローカルパッケージリンクの掃除
pub trait LinkCleaner {
    /// 削除した件数を返す
    fn clean(&self, dir: &Path, rules: &[RewriteRule]) -> Result<usize>;
}
