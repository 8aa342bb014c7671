//! 生成される Docker Compose 定義
//!
//! 生成物は毎回まるごと書き直され、手で編集されることはない。
//! マップはすべて BTreeMap、サービスはカタログ順で出力されるため、
//! 同じ入力からは常に同じバイト列が得られる。

use crate::error::{EnvError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 1環境分の Compose ファイル
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeFile {
    /// Compose プロジェクト名（= 名前空間）
    pub name: String,
    pub services: ServiceMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, ComposeNetwork>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, ComposeVolume>,
}

impl ComposeFile {
    pub fn service(&self, name: &str) -> Option<&ComposeService> {
        self.services.get(name)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// 挿入順を保持するサービスマップ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceMap(Vec<(String, ComposeService)>);

impl ServiceMap {
    pub fn insert(&mut self, name: String, service: ComposeService) {
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = service,
            None => self.0.push((name, service)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ComposeService> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ServiceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, service) in &self.0 {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

/// サービス1つ分の実行定義
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeService {
    pub container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<ComposeBuild>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// `"host:container"` 形式
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<ComposeHealthcheck>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub depends_on: BTreeMap<String, DependsOn>,
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeBuild {
    pub context: String,
    pub dockerfile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeHealthcheck {
    pub test: Vec<String>,
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    pub retries: u32,
    pub start_period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependsOn {
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeNetwork {
    pub name: String,
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeVolume {
    pub name: String,
}

/// 定義ファイルを書き出す（親ディレクトリがなければ作成）
pub fn write_definition(path: &Path, compose: &ComposeFile) -> Result<()> {
    let yaml = compose.to_yaml()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| EnvError::IoError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    fs::write(path, yaml).map_err(|e| EnvError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), services = compose.services.len(), "Wrote compose definition");
    Ok(())
}
