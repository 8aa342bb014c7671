//! サービスカタログ定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// ビルドファイル未指定時のデフォルト名
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// サービス定義（カタログの1エントリ）
///
/// KDL形式：
/// ```kdl
/// service "api" {
///     build context="./api"
///     port "main" 3000
///     env {
///         DB_PORT "{db.main.host}"
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub source: ServiceSource,
    pub command: Option<String>,
    /// 宣言順を保持したポート一覧（名前はサービス内で一意）
    #[serde(default)]
    pub ports: Vec<PortSpec>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub healthcheck: Option<HealthCheckSpec>,
    /// 依存サービス名 → 起動条件 (service_started, service_healthy, ...)
    #[serde(default)]
    pub depends_on: BTreeMap<String, String>,
    #[serde(default)]
    pub mounts: Vec<BindMount>,
    #[serde(default)]
    pub volumes: Vec<NamedVolume>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, source: ServiceSource) -> Self {
        Self {
            name: name.into(),
            source,
            command: None,
            ports: Vec::new(),
            environment: BTreeMap::new(),
            healthcheck: None,
            depends_on: BTreeMap::new(),
            mounts: Vec::new(),
            volumes: Vec::new(),
        }
    }

    /// 名前でポートを検索
    pub fn port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// イメージの取得元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSource {
    /// ビルド済みイメージ
    Image(String),
    /// ローカルビルド
    Build {
        context: PathBuf,
        dockerfile: Option<String>,
    },
}

/// 名前付きベースポート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    /// コンテナ側のポート。スロット 0 ではホスト側も同じ値になる
    pub base: u16,
}

/// ヘルスチェック設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    /// HTTP プローブのパス（`main` ポートに対して実行）
    pub path: Option<String>,
    /// シェルプローブ
    pub test: Option<String>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub retries: Option<u32>,
    pub start_period: Option<String>,
}

/// バインドマウント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    /// ワークツリーからの相対パス
    pub host: String,
    pub container: String,
}

/// 名前付きボリューム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedVolume {
    pub name: String,
    pub container: String,
}
