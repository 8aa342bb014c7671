//! 設定ファイルのロード

use crate::error::Result;
use crate::model::ProjectConfig;
use crate::parser::parse_config_file;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// 設定ファイル名
pub const CONFIG_FILE: &str = "wtflow.kdl";

/// 設定ファイルのパス
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE)
}

/// プロジェクトルートの wtflow.kdl を読み込む
///
/// ファイルがなければデフォルト設定を返す。ワークツリー内のコピーは読まない。
#[instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn load_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(ProjectConfig::default());
    }

    let config = parse_config_file(&path)?;
    info!(
        project = %config.project.name,
        services = config.services.len(),
        "Config loaded"
    );
    Ok(config)
}
