//! docker compose CLI ラッパー

use crate::error::{ContainerError, Result};
use crate::inspect::ContainerInspector;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, warn};
use wtflow_core::lifecycle::Runtime;

/// Ctrl-C で中断されたときの終了コード
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// `docker compose` を使うランタイム
pub struct DockerCompose {
    inspector: Option<ContainerInspector>,
}

impl DockerCompose {
    pub fn new() -> Self {
        let inspector = match ContainerInspector::connect() {
            Ok(inspector) => Some(inspector),
            Err(e) => {
                warn!(error = %e, "Container inspection unavailable");
                None
            }
        };
        Self { inspector }
    }

    fn inspector(&self) -> Result<&ContainerInspector> {
        self.inspector.as_ref().ok_or_else(|| {
            ContainerError::DockerConnectionFailed("Docker API に接続されていません".to_string())
        })
    }

    fn command(args: &[OsString]) -> Command {
        debug!(
            "Running: docker {}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let mut cmd = Command::new("docker");
        cmd.args(args);
        cmd
    }

    /// 標準入出力を引き継いで実行
    fn run_inherited(args: Vec<OsString>) -> Result<ExitStatus> {
        Ok(Self::command(&args).status()?)
    }

    fn check(args: &[OsString], status: ExitStatus, stderr: String) -> Result<()> {
        if status.success() {
            return Ok(());
        }
        Err(ContainerError::CommandFailed {
            command: describe(args),
            code: status.code().unwrap_or(-1),
            stderr,
        })
    }
}

impl Default for DockerCompose {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for DockerCompose {
    fn is_available(&self) -> bool {
        Command::new("docker")
            .args(["compose", "version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn up(
        &self,
        definition: &Path,
        namespace: &str,
        build: bool,
        services: &[String],
    ) -> anyhow::Result<()> {
        let args = up_args(definition, namespace, build, services);
        let status = Self::run_inherited(args.clone())?;
        Ok(Self::check(&args, status, String::new())?)
    }

    fn down(&self, definition: &Path, namespace: &str, remove_volumes: bool) -> anyhow::Result<()> {
        let args = down_args(definition, namespace, remove_volumes);
        let output = Self::command(&args).output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Ok(Self::check(&args, output.status, stderr)?)
    }

    fn logs(
        &self,
        definition: &Path,
        namespace: &str,
        follow: bool,
        services: &[String],
    ) -> anyhow::Result<()> {
        let args = logs_args(definition, namespace, follow, services);
        let status = Self::run_inherited(args.clone())?;
        if follow && was_interrupted(&status) {
            debug!("Log follow interrupted");
            return Ok(());
        }
        Ok(Self::check(&args, status, String::new())?)
    }

    fn ps(&self, definition: &Path, namespace: &str) -> anyhow::Result<String> {
        let args = ps_args(definition, namespace);
        let output = Self::command(&args).output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Self::check(&args, output.status, stderr)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn is_running(&self, container: &str) -> anyhow::Result<bool> {
        Ok(self.inspector()?.is_running(container)?)
    }

    fn is_healthy(&self, container: &str) -> anyhow::Result<bool> {
        Ok(self.inspector()?.is_healthy(container)?)
    }

    fn container_ip(&self, namespace: &str, container: &str) -> anyhow::Result<Option<String>> {
        // 生成定義のネットワーク名は名前空間と同じ
        Ok(self.inspector()?.ip_address(container, Some(namespace))?)
    }
}

/// `docker compose -f <def> -p <ns>`
fn base_args(definition: &Path, namespace: &str) -> Vec<OsString> {
    vec![
        "compose".into(),
        "-f".into(),
        definition.as_os_str().to_owned(),
        "-p".into(),
        namespace.into(),
    ]
}

pub fn up_args(
    definition: &Path,
    namespace: &str,
    build: bool,
    services: &[String],
) -> Vec<OsString> {
    let mut args = base_args(definition, namespace);
    args.push("up".into());
    args.push("-d".into());
    if build {
        args.push("--build".into());
    }
    args.extend(services.iter().map(OsString::from));
    args
}

pub fn down_args(definition: &Path, namespace: &str, remove_volumes: bool) -> Vec<OsString> {
    let mut args = base_args(definition, namespace);
    args.push("down".into());
    if remove_volumes {
        args.push("-v".into());
    }
    args
}

pub fn logs_args(
    definition: &Path,
    namespace: &str,
    follow: bool,
    services: &[String],
) -> Vec<OsString> {
    let mut args = base_args(definition, namespace);
    args.push("logs".into());
    if follow {
        args.push("-f".into());
    }
    args.extend(services.iter().map(OsString::from));
    args
}

pub fn ps_args(definition: &Path, namespace: &str) -> Vec<OsString> {
    let mut args = base_args(definition, namespace);
    args.push("ps".into());
    args
}

fn describe(args: &[OsString]) -> String {
    let sub = args
        .get(5)
        .map(|a| a.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("docker compose {}", sub)
}

/// SIGINT/SIGTERM または終了コード 130 で終わったか
fn was_interrupted(status: &ExitStatus) -> bool {
    if status.code() == Some(INTERRUPTED_EXIT_CODE) {
        return true;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        // SIGINT = 2, SIGTERM = 15
        if matches!(status.signal(), Some(2) | Some(15)) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_up_args() {
        let args = up_args(
            Path::new("/p/.worktrees/x/docker-compose.x.yml"),
            "shop-wt-x",
            true,
            &["api".to_string()],
        );

        assert_eq!(
            strings(args),
            vec![
                "compose",
                "-f",
                "/p/.worktrees/x/docker-compose.x.yml",
                "-p",
                "shop-wt-x",
                "up",
                "-d",
                "--build",
                "api"
            ]
        );
    }

    #[test]
    fn test_down_args() {
        let plain = strings(down_args(Path::new("dc.yml"), "shop", false));
        assert_eq!(plain.last().map(String::as_str), Some("down"));

        let with_volumes = strings(down_args(Path::new("dc.yml"), "shop", true));
        assert_eq!(&with_volumes[5..], ["down", "-v"]);
    }

    #[test]
    fn test_logs_args() {
        let args = strings(logs_args(Path::new("dc.yml"), "shop", true, &[]));
        assert_eq!(&args[5..], ["logs", "-f"]);
    }

    #[test]
    fn test_ps_args() {
        let args = strings(ps_args(Path::new("dc.yml"), "shop"));
        assert_eq!(&args[..], ["compose", "-f", "dc.yml", "-p", "shop", "ps"]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&down_args(Path::new("dc.yml"), "shop", true)),
            "docker compose down"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_interrupted_status() {
        use std::os::unix::process::ExitStatusExt;

        assert!(was_interrupted(&ExitStatus::from_raw(130 << 8)));
        assert!(was_interrupted(&ExitStatus::from_raw(2)));
        assert!(!was_interrupted(&ExitStatus::from_raw(0)));
        assert!(!was_interrupted(&ExitStatus::from_raw(1 << 8)));
    }
}
