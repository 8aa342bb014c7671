//! コンテナの状態確認（bollard）
//!
//! オーケストレーターは同期 API なので、専用の current-thread ランタイムで
//! bollard の inspect を block_on する。

use crate::error::{ContainerError, Result};
use bollard::Docker;
use bollard::models::{ContainerInspectResponse, ContainerState, HealthStatusEnum};
use bollard::query_parameters::InspectContainerOptions;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

pub struct ContainerInspector {
    runtime: Runtime,
    docker: Docker,
}

impl ContainerInspector {
    /// ローカルの Docker デーモンに接続
    pub fn connect() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ContainerError::RuntimeInit(e.to_string()))?;
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        Ok(Self { runtime, docker })
    }

    /// コンテナ情報を取得（存在しなければ None）
    pub fn inspect(&self, container: &str) -> Result<Option<ContainerInspectResponse>> {
        let result = self.runtime.block_on(
            self.docker
                .inspect_container(container, None::<InspectContainerOptions>),
        );

        match result {
            Ok(info) => Ok(Some(info)),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!(container = %container, "Container not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_running(&self, container: &str) -> Result<bool> {
        Ok(self
            .inspect(container)?
            .and_then(|info| info.state)
            .is_some_and(|state| state.running.unwrap_or(false)))
    }

    pub fn is_healthy(&self, container: &str) -> Result<bool> {
        Ok(self
            .inspect(container)?
            .and_then(|info| info.state)
            .is_some_and(|state| is_ready(&state)))
    }

    /// コンテナの IP アドレス（`network` のものを優先）
    pub fn ip_address(&self, container: &str, network: Option<&str>) -> Result<Option<String>> {
        Ok(self
            .inspect(container)?
            .and_then(|info| ip_from_inspect(&info, network)))
    }
}

/// 実行中かつ healthy か
///
/// ヘルスチェックがないコンテナは実行中であれば準備完了とみなす。
pub fn is_ready(state: &ContainerState) -> bool {
    if !state.running.unwrap_or(false) {
        return false;
    }

    match state.health.as_ref().and_then(|h| h.status.as_ref()) {
        Some(status) => *status == HealthStatusEnum::HEALTHY,
        None => true,
    }
}

/// inspect 結果から IP アドレスを取り出す
pub fn ip_from_inspect(info: &ContainerInspectResponse, network: Option<&str>) -> Option<String> {
    let networks = info.network_settings.as_ref()?.networks.as_ref()?;

    let preferred = network
        .and_then(|name| networks.get(name))
        .and_then(|endpoint| endpoint.ip_address.clone())
        .filter(|ip| !ip.is_empty());

    preferred.or_else(|| {
        let mut names: Vec<_> = networks.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| networks[name].ip_address.clone())
            .find(|ip| !ip.is_empty())
    })
}
