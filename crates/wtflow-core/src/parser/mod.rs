//! KDLパーサー
//!
//! wtflow.kdl をパースして [`ProjectConfig`] を生成します。

mod service;

pub use service::{parse_healthcheck, parse_service};

use crate::context::is_compose_name;
use crate::error::{EnvError, Result};
use crate::model::{ProjectConfig, RewriteRule};
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::fs;
use std::path::Path;

/// KDLファイルをパース
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| EnvError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config_string(&content)
}

/// KDL文字列をパース
pub fn parse_config_string(content: &str) -> Result<ProjectConfig> {
    let doc: KdlDocument = content.parse()?;
    let mut config = ProjectConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(name) = arg_string(node, 0) {
                    config.project.name = name;
                }
                if let Some(dir) = prop_string(node, "worktree_dir") {
                    config.project.worktree_dir = dir;
                }
                if let Some(secrets) = prop_string(node, "secrets") {
                    config.project.secrets_file = secrets;
                }
            }
            "ports" => {
                if let Some(offset) = prop_u32(node, "offset")? {
                    config.ports.offset = offset;
                }
                if let Some(max) = prop_u32(node, "max_worktrees")? {
                    config.ports.max_worktrees = max;
                }
            }
            "service" => {
                let service = parse_service(node)?;
                if config.service(&service.name).is_some() {
                    return Err(EnvError::InvalidConfig(format!(
                        "サービス '{}' が重複して定義されています",
                        service.name
                    )));
                }
                config.services.push(service);
            }
            "rewrite" => match (arg_string(node, 0), arg_string(node, 1)) {
                (Some(from), Some(to)) => config.rewrites.push(RewriteRule { from, to }),
                _ => {
                    return Err(EnvError::InvalidConfig(
                        "rewrite には2つの引数が必要です: rewrite \"@from\" \"@to\"".to_string(),
                    ));
                }
            },
            "hooks" => {
                if let Some(children) = node.children() {
                    for hook in children.nodes() {
                        if hook.name().value() == "post_create" {
                            config.hooks.post_create.extend(
                                hook.entries()
                                    .iter()
                                    .filter_map(|e| e.value().as_string().map(String::from)),
                            );
                        }
                    }
                }
            }
            _ => {
                // 不明なノードはスキップ
            }
        }
    }

    validate_config(&config)?;
    Ok(config)
}

/// ロード後の整合性チェック
///
/// project 名が Compose のプロジェクト名として使えること、
/// 最大スロットでもホストポートが 65535 を超えないこと、
/// サービス名が参照構文 `{service.port.host}` と衝突しないこと、
/// depends_on の参照先が存在することを確認する。
pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    if config.project.name.is_empty() {
        return Err(EnvError::InvalidConfig("project 名が空です".to_string()));
    }
    if !is_compose_name(&config.project.name) {
        return Err(EnvError::InvalidConfig(format!(
            "project 名 '{}' は英小文字・数字・ハイフン・アンダースコアのみ使用できます（先頭は英小文字か数字）",
            config.project.name
        )));
    }
    if config.ports.max_worktrees == 0 {
        return Err(EnvError::InvalidConfig(
            "ports.max_worktrees は1以上である必要があります".to_string(),
        ));
    }

    let reach = u64::from(config.ports.offset) * u64::from(config.ports.max_worktrees);
    for service in &config.services {
        if service.name.contains('.') {
            return Err(EnvError::InvalidConfig(format!(
                "サービス名 '{}' に '.' は使用できません",
                service.name
            )));
        }
        for port in &service.ports {
            if u64::from(port.base) + reach > u64::from(u16::MAX) {
                return Err(EnvError::InvalidConfig(format!(
                    "サービス '{}' のポート '{}' ({}) は最大スロットで 65535 を超えます（offset={}, max_worktrees={}）",
                    service.name,
                    port.name,
                    port.base,
                    config.ports.offset,
                    config.ports.max_worktrees
                )));
            }
        }
    }

    for service in &config.services {
        for dep in service.depends_on.keys() {
            if config.service(dep).is_none() {
                return Err(EnvError::InvalidConfig(format!(
                    "サービス '{}' の依存先 '{}' が定義されていません",
                    service.name, dep
                )));
            }
        }
    }

    Ok(())
}

/// n 番目の位置引数を文字列として取得
pub(crate) fn arg_string(node: &KdlNode, index: usize) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .and_then(|e| e.value().as_string())
        .map(String::from)
}

/// 名前付きプロパティを文字列として取得
pub(crate) fn prop_string(node: &KdlNode, key: &str) -> Option<String> {
    node.get(key).and_then(|v| v.as_string()).map(String::from)
}

fn prop_u32(node: &KdlNode, key: &str) -> Result<Option<u32>> {
    match node.get(key).and_then(|v| v.as_integer()) {
        Some(v) => u32::try_from(v).map(Some).map_err(|_| {
            EnvError::InvalidConfig(format!("{} の値が範囲外です: {}", key, v))
        }),
        None => Ok(None),
    }
}

/// 環境変数値として使えるように KDL 値を文字列化
pub(crate) fn value_to_string(value: &KdlValue) -> String {
    match value {
        KdlValue::String(s) => s.clone(),
        KdlValue::Integer(i) => i.to_string(),
        KdlValue::Float(f) => f.to_string(),
        KdlValue::Bool(b) => b.to_string(),
        KdlValue::Null => String::new(),
    }
}
