//! プロジェクトルートの検出

use crate::error::{EnvError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// プロジェクトルートを上書きする環境変数
pub const PROJECT_ROOT_ENV: &str = "WTFLOW_PROJECT_ROOT";

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 WTFLOW_PROJECT_ROOT
/// 2. `start` から上に向かって `.git` ディレクトリを探す
///
/// ワークツリー内の `.git` はファイルなので、ワークツリーから検索しても
/// メインのチェックアウトが見つかる。
#[tracing::instrument(skip(start), fields(start = %start.display()))]
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking WTFLOW_PROJECT_ROOT");
        if path.is_dir() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "WTFLOW_PROJECT_ROOT is not a directory, ignoring");
    }

    search_upward(start)
}

fn search_upward(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        debug!(checking = %current.display(), "Looking for .git directory");
        if current.join(".git").is_dir() {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }

        if !current.pop() {
            break;
        }
    }

    warn!(start_dir = %start.display(), "Project root not found");
    Err(EnvError::ProjectRootNotFound(start.to_path_buf()))
}
