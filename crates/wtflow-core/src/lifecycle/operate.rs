//! 起動・停止・状態確認

use super::outcome::Warnings;
use super::{
    EnvironmentState, EnvironmentSummary, Orchestrator, Outcome, Started, StatusReport, Stopped,
    WarningStep,
};
use crate::compose::write_definition;
use crate::context::{EnvironmentContext, definition_path, worktree_path};
use crate::error::{EnvError, Result};
use crate::generator::{MAIN_PORT, container_name, generate_definition, namespace};
use crate::model::ServiceSpec;
use crate::port::{host_port, port_table};
use crate::waiter::wait_until;
use tracing::{debug, info, instrument};

impl Orchestrator {
    /// 環境を起動
    ///
    /// 名前付き環境では定義を毎回生成し直す。メイン環境では定義がない場合のみ生成する。
    #[instrument(skip(self, services))]
    pub fn start(
        &self,
        name: Option<&str>,
        build: bool,
        services: &[String],
    ) -> Result<Outcome<Started>> {
        let ctx = self.resolver.resolve(name)?;
        let mut warnings = Warnings::default();

        if !self.runtime.is_available() {
            return Err(EnvError::RuntimeUnavailable(
                "docker compose が見つかりません".to_string(),
            ));
        }

        if !ctx.is_main() || !ctx.has_definition() {
            let compose = generate_definition(&ctx.config, ctx.name(), ctx.slot);
            write_definition(&ctx.definition_path, &compose)?;
        }

        self.runtime
            .up(&ctx.definition_path, &ctx.namespace, build, services)?;
        info!(namespace = %ctx.namespace, slot = ctx.slot, "Environment started");

        let targets = selected_services(&ctx, services);

        if self.options.wait_for_health {
            for spec in targets.iter().filter(|s| has_probe(s)) {
                let container = container_name(&ctx.namespace, &spec.name);
                debug!(container = %container, "Waiting for healthy container");
                let healthy = wait_until(
                    self.options.health_poll_interval,
                    self.options.health_timeout,
                    || self.runtime.is_healthy(&container).unwrap_or(false),
                );
                if !healthy {
                    warnings.push(
                        WarningStep::HealthWait,
                        format!(
                            "サービス '{}' が {} 秒以内に healthy になりませんでした",
                            spec.name,
                            self.options.health_timeout.as_secs()
                        ),
                    );
                }
            }
        }

        let urls = targets
            .iter()
            .filter_map(|spec| {
                spec.port(MAIN_PORT).map(|port| {
                    let host = host_port(port.base, ctx.slot, ctx.config.ports.offset);
                    (spec.name.clone(), format!("http://localhost:{}", host))
                })
            })
            .collect();

        Ok(warnings.finish(Started {
            environment: ctx.kind.clone(),
            namespace: ctx.namespace.clone(),
            slot: ctx.slot,
            urls,
        }))
    }

    /// 環境を停止
    #[instrument(skip(self))]
    pub fn stop(
        &self,
        name: Option<&str>,
        remove_volumes: bool,
        clean_local_links: bool,
    ) -> Result<Outcome<Stopped>> {
        let ctx = self.resolver.resolve(name)?;
        let mut warnings = Warnings::default();

        let already_stopped = !ctx.has_definition();
        let mut links_removed = 0;
        if already_stopped {
            debug!(path = %ctx.definition_path.display(), "No definition, nothing to stop");
        } else {
            self.runtime
                .down(&ctx.definition_path, &ctx.namespace, remove_volumes)?;
            info!(namespace = %ctx.namespace, "Environment stopped");

            // リンク掃除は停止した環境に対してのみ行う
            if clean_local_links && !ctx.config.rewrites.is_empty() {
                match self.links.clean(&ctx.working_dir, &ctx.config.rewrites) {
                    Ok(count) => links_removed = count,
                    Err(e) => warnings.push(
                        WarningStep::LinkCleanup,
                        format!("ローカルリンクの削除に失敗しました: {}", e),
                    ),
                }
            }
        }

        Ok(warnings.finish(Stopped {
            environment: ctx.kind.clone(),
            already_stopped,
            links_removed,
        }))
    }

    /// 環境の状態（読み取りのみ）
    #[instrument(skip(self))]
    pub fn status(&self, name: Option<&str>) -> Result<Outcome<StatusReport>> {
        let ctx = self.resolver.resolve(name)?;
        let mut warnings = Warnings::default();
        let definition_exists = ctx.has_definition();

        let mut containers = None;
        let mut addresses = Vec::new();
        if definition_exists {
            match self.runtime.ps(&ctx.definition_path, &ctx.namespace) {
                Ok(output) => containers = Some(output),
                Err(e) => warnings.push(
                    WarningStep::ContainerStatus,
                    format!("コンテナ状態の取得に失敗しました: {}", e),
                ),
            }

            for spec in &ctx.config.services {
                let container = container_name(&ctx.namespace, &spec.name);
                match self.runtime.container_ip(&ctx.namespace, &container) {
                    Ok(Some(ip)) => addresses.push((spec.name.clone(), ip)),
                    Ok(None) => {}
                    Err(e) => warnings.push(
                        WarningStep::ContainerIp,
                        format!("{} の IP アドレスを取得できませんでした: {}", container, e),
                    ),
                }
            }
        }

        Ok(warnings.finish(StatusReport {
            environment: ctx.kind.clone(),
            slot: ctx.slot,
            namespace: ctx.namespace.clone(),
            working_dir: ctx.working_dir.clone(),
            definition_path: ctx.definition_path.clone(),
            definition_exists,
            ports: ctx.ports(),
            containers,
            addresses,
        }))
    }

    /// ログを表示
    ///
    /// 定義がなければ何もせず false を返す。
    #[instrument(skip(self, services))]
    pub fn logs(
        &self,
        name: Option<&str>,
        follow: bool,
        services: &[String],
    ) -> Result<Outcome<bool>> {
        let ctx = self.resolver.resolve(name)?;
        if !ctx.has_definition() {
            debug!(path = %ctx.definition_path.display(), "No definition, no logs");
            return Ok(Outcome::clean(false));
        }

        self.runtime
            .logs(&ctx.definition_path, &ctx.namespace, follow, services)?;
        Ok(Outcome::clean(true))
    }

    /// 既知の名前付き環境を列挙
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Outcome<Vec<EnvironmentSummary>>> {
        let root = self.resolver.project_root();
        let config = self.resolver.config();
        let slots = self.resolver.registry().load();

        let summaries = self
            .known_names()?
            .into_iter()
            .map(|name| {
                let path = worktree_path(root, config, &name);
                let slot = slots.get(&name).copied();
                let exists = path.exists();
                let branch = if exists {
                    self.vcs.current_branch(&path).ok()
                } else {
                    None
                };

                let state = match (slot, exists) {
                    (None, false) => EnvironmentState::Absent,
                    (Some(_), true) if definition_path(root, config, Some(&name)).exists() => {
                        let ns = namespace(config, Some(&name));
                        let running = config.services.iter().any(|s| {
                            self.runtime
                                .is_running(&container_name(&ns, &s.name))
                                .unwrap_or(false)
                        });
                        if running {
                            EnvironmentState::Active
                        } else {
                            EnvironmentState::Stopped
                        }
                    }
                    _ => EnvironmentState::Provisioning,
                };

                let main_ports = slot
                    .map(|slot| {
                        port_table(config, slot)
                            .into_iter()
                            .filter(|m| m.port == MAIN_PORT)
                            .map(|m| (m.service, m.host))
                            .collect()
                    })
                    .unwrap_or_default();

                EnvironmentSummary {
                    name,
                    slot,
                    path,
                    branch,
                    state,
                    main_ports,
                }
            })
            .collect();

        Ok(Outcome::clean(summaries))
    }
}

/// 起動対象のサービス（指定がなければ全サービス）
fn selected_services<'a>(ctx: &'a EnvironmentContext, services: &[String]) -> Vec<&'a ServiceSpec> {
    ctx.config
        .services
        .iter()
        .filter(|s| services.is_empty() || services.contains(&s.name))
        .collect()
}

/// 生成定義にヘルスチェックが出力されるか
fn has_probe(spec: &ServiceSpec) -> bool {
    spec.healthcheck.as_ref().is_some_and(|hc| {
        hc.test.is_some() || (hc.path.is_some() && spec.port(MAIN_PORT).is_some())
    })
}
