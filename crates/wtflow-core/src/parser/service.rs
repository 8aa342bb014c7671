//! サービスノードのパース

use super::{arg_string, prop_string, value_to_string};
use crate::error::{EnvError, Result};
use crate::model::{
    BindMount, HealthCheckSpec, NamedVolume, PortSpec, ServiceSource, ServiceSpec,
};
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// service ノードをパース
pub fn parse_service(node: &KdlNode) -> Result<ServiceSpec> {
    let name = arg_string(node, 0)
        .ok_or_else(|| EnvError::InvalidConfig("service requires a name".to_string()))?;

    let mut image: Option<String> = None;
    let mut build: Option<ServiceSource> = None;
    let mut service = ServiceSpec::new(&name, ServiceSource::Image(String::new()));

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "image" => {
                    image = arg_string(child, 0);
                }
                "build" => {
                    // build "./api" または build context="./api" dockerfile="Dockerfile.dev"
                    let context = prop_string(child, "context")
                        .or_else(|| arg_string(child, 0))
                        .ok_or_else(|| {
                            EnvError::InvalidConfig(format!(
                                "サービス '{}' の build に context がありません",
                                name
                            ))
                        })?;
                    build = Some(ServiceSource::Build {
                        context: PathBuf::from(context),
                        dockerfile: prop_string(child, "dockerfile"),
                    });
                }
                "command" => {
                    service.command = arg_string(child, 0);
                }
                "port" => {
                    let port = parse_port(&name, child)?;
                    if service.port(&port.name).is_some() {
                        return Err(EnvError::InvalidConfig(format!(
                            "サービス '{}' のポート名 '{}' が重複しています",
                            name, port.name
                        )));
                    }
                    service.ports.push(port);
                }
                // env と environment 両方をサポート
                "environment" | "env" => {
                    if let Some(envs) = child.children() {
                        service.environment.extend(parse_string_map(envs));
                    }
                }
                "healthcheck" => {
                    service.healthcheck = Some(parse_healthcheck(child));
                }
                "depends_on" => {
                    if let Some(deps) = child.children() {
                        service.depends_on.extend(parse_string_map(deps));
                    }
                    // 位置引数形式: depends_on "db" "cache"
                    for dep in child.entries().iter().filter(|e| e.name().is_none()) {
                        if let Some(dep) = dep.value().as_string() {
                            service
                                .depends_on
                                .insert(dep.to_string(), "service_started".to_string());
                        }
                    }
                }
                "mount" => {
                    let (host, container) = parse_pair(&name, child)?;
                    service.mounts.push(BindMount { host, container });
                }
                "volume" => {
                    let (volume, container) = parse_pair(&name, child)?;
                    service.volumes.push(NamedVolume {
                        name: volume,
                        container,
                    });
                }
                _ => {}
            }
        }
    }

    service.source = match (image, build) {
        (_, Some(build)) => build,
        (Some(image), None) => ServiceSource::Image(image),
        (None, None) => {
            return Err(EnvError::InvalidConfig(format!(
                "サービス '{}' に image または build が指定されていません",
                name
            )));
        }
    };

    Ok(service)
}

/// port "main" 3000
fn parse_port(service: &str, node: &KdlNode) -> Result<PortSpec> {
    let name = arg_string(node, 0).ok_or_else(|| {
        EnvError::InvalidConfig(format!("サービス '{}' の port に名前がありません", service))
    })?;

    let base = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(1)
        .and_then(|e| e.value().as_integer())
        .ok_or_else(|| {
            EnvError::InvalidConfig(format!(
                "サービス '{}' の port '{}' に番号がありません",
                service, name
            ))
        })?;

    let base = u16::try_from(base).map_err(|_| {
        EnvError::InvalidConfig(format!(
            "サービス '{}' の port '{}' が範囲外です: {}",
            service, name, base
        ))
    })?;

    Ok(PortSpec { name, base })
}

/// mount / volume ノードの2引数をパース
fn parse_pair(service: &str, node: &KdlNode) -> Result<(String, String)> {
    match (arg_string(node, 0), arg_string(node, 1)) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(EnvError::InvalidConfig(format!(
            "サービス '{}' の {} には2つの引数が必要です",
            service,
            node.name().value()
        ))),
    }
}

/// `KEY "value"` 形式の子ノードを文字列マップに変換
fn parse_string_map(doc: &KdlDocument) -> BTreeMap<String, String> {
    doc.nodes()
        .iter()
        .map(|n| {
            let key = n.name().value().to_string();
            let value = n
                .entries()
                .first()
                .map(|e| value_to_string(e.value()))
                .unwrap_or_default();
            (key, value)
        })
        .collect()
}

/// healthcheck path="/health" interval="10s" retries=5 start_period="30s"
/// healthcheck test="pg_isready -U postgres"
pub fn parse_healthcheck(node: &KdlNode) -> HealthCheckSpec {
    HealthCheckSpec {
        path: prop_string(node, "path"),
        test: prop_string(node, "test"),
        interval: prop_string(node, "interval"),
        timeout: prop_string(node, "timeout"),
        retries: node
            .get("retries")
            .and_then(|v| v.as_integer())
            .and_then(|v| u32::try_from(v).ok()),
        start_period: prop_string(node, "start_period"),
    }
}
