//! カタログから環境ごとの Compose 定義を生成
//!
//! 生成は (環境名, スロット, 設定) の純粋関数で、整形式の設定に対して失敗しない。
//! 解決できない参照は展開されずに残るだけでエラーにはならない。

use crate::compose::{
    ComposeBuild, ComposeFile, ComposeHealthcheck, ComposeNetwork, ComposeService, ComposeVolume,
    DependsOn,
};
use crate::model::{DEFAULT_DOCKERFILE, HealthCheckSpec, ProjectConfig, ServiceSource, ServiceSpec};
use crate::port::host_port;
use crate::template::resolve_references;
use tracing::{debug, instrument};

pub const DEFAULT_HEALTH_INTERVAL: &str = "10s";
pub const DEFAULT_HEALTH_RETRIES: u32 = 5;
pub const DEFAULT_HEALTH_START_PERIOD: &str = "30s";

/// HTTP ヘルスチェックの対象となるポート名
pub const MAIN_PORT: &str = "main";

/// 環境の名前空間
///
/// メイン環境はプロジェクト名、名前付き環境は `{project}-wt-{name}`。
pub fn namespace(config: &ProjectConfig, environment: Option<&str>) -> String {
    match environment {
        None => config.project.name.clone(),
        Some(name) => format!("{}-{}", config.env_prefix(), name),
    }
}

/// コンテナ名 `{namespace}-{service}`
pub fn container_name(namespace: &str, service: &str) -> String {
    format!("{}-{}", namespace, service)
}

/// 1環境分の定義を生成
///
/// `environment` が `None` ならメイン環境（スロット 0）として扱う。
#[instrument(skip(config), fields(project = %config.project.name))]
pub fn generate_definition(
    config: &ProjectConfig,
    environment: Option<&str>,
    slot: u32,
) -> ComposeFile {
    let namespace = namespace(config, environment);
    let mut compose = ComposeFile {
        name: namespace.clone(),
        ..Default::default()
    };

    for spec in &config.services {
        let service = generate_service(config, spec, &namespace, environment, slot, &mut compose);
        compose.services.insert(spec.name.clone(), service);
    }

    compose.networks.insert(
        namespace.clone(),
        ComposeNetwork {
            name: namespace,
            driver: "bridge".to_string(),
        },
    );

    debug!(
        services = compose.services.len(),
        volumes = compose.volumes.len(),
        "Generated definition"
    );
    compose
}

fn generate_service(
    config: &ProjectConfig,
    spec: &ServiceSpec,
    namespace: &str,
    environment: Option<&str>,
    slot: u32,
    compose: &mut ComposeFile,
) -> ComposeService {
    let (image, build) = match &spec.source {
        ServiceSource::Image(image) => (Some(image.clone()), None),
        ServiceSource::Build {
            context,
            dockerfile,
        } => (
            None,
            Some(ComposeBuild {
                context: context.display().to_string(),
                dockerfile: dockerfile
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string()),
            }),
        ),
    };

    // コンテナ側のポートはずらさない
    let ports = spec
        .ports
        .iter()
        .map(|port| {
            format!(
                "{}:{}",
                host_port(port.base, slot, config.ports.offset),
                port.base
            )
        })
        .collect();

    let environment_vars = spec
        .environment
        .iter()
        .map(|(key, value)| (key.clone(), resolve_references(value, config, slot)))
        .collect();

    let mut volumes: Vec<String> = spec
        .mounts
        .iter()
        .map(|m| format!("{}:{}", m.host, m.container))
        .collect();

    for volume in &spec.volumes {
        // メイン環境は既存ボリュームとの互換のため素の名前を使う
        let qualified = match environment {
            None => volume.name.clone(),
            Some(_) => format!("{}-{}", namespace, volume.name),
        };
        volumes.push(format!("{}:{}", qualified, volume.container));
        compose
            .volumes
            .entry(qualified.clone())
            .or_insert(ComposeVolume { name: qualified });
    }

    let depends_on = spec
        .depends_on
        .iter()
        .map(|(dep, condition)| {
            (
                dep.clone(),
                DependsOn {
                    condition: condition.clone(),
                },
            )
        })
        .collect();

    ComposeService {
        container_name: container_name(namespace, &spec.name),
        image,
        build,
        command: spec.command.clone(),
        ports,
        environment: environment_vars,
        volumes,
        healthcheck: spec
            .healthcheck
            .as_ref()
            .and_then(|hc| synthesize_healthcheck(spec, hc)),
        depends_on,
        networks: vec![namespace.to_string()],
    }
}

/// ヘルスチェックを組み立てる
///
/// path と `main` ポートがあれば HTTP プローブ（コンテナ内部ポート）、
/// なければ test のシェルプローブ、どちらもなければ出力しない。
fn synthesize_healthcheck(spec: &ServiceSpec, hc: &HealthCheckSpec) -> Option<ComposeHealthcheck> {
    let main_port = spec.port(MAIN_PORT).map(|p| p.base);

    let test = match (&hc.path, main_port, &hc.test) {
        (Some(path), Some(port), _) => vec![
            "CMD".to_string(),
            "curl".to_string(),
            "-f".to_string(),
            format!("http://localhost:{}{}", port, path),
        ],
        (_, _, Some(test)) => vec!["CMD-SHELL".to_string(), test.clone()],
        _ => return None,
    };

    Some(ComposeHealthcheck {
        test,
        interval: hc
            .interval
            .clone()
            .unwrap_or_else(|| DEFAULT_HEALTH_INTERVAL.to_string()),
        timeout: hc.timeout.clone(),
        retries: hc.retries.unwrap_or(DEFAULT_HEALTH_RETRIES),
        start_period: hc
            .start_period
            .clone()
            .unwrap_or_else(|| DEFAULT_HEALTH_START_PERIOD.to_string()),
    })
}

#[cfg(test)]
mod tests;
