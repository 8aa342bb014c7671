//! 作成後フック

use crate::lifecycle::HookRunner;
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// `sh -c <command>` でフックを実行する
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellHookRunner;

impl HookRunner for ShellHookRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<()> {
        tracing::debug!(dir = %dir.display(), "Running: sh -c {}", command);

        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .status()
            .with_context(|| format!("フック '{}' を起動できませんでした", command))?;

        if !status.success() {
            bail!("終了コード {}", status.code().unwrap_or(-1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_runs_in_directory() {
        let temp_dir = tempdir().unwrap();

        ShellHookRunner
            .run("echo ok > hook.txt", temp_dir.path())
            .unwrap();
        assert!(temp_dir.path().join("hook.txt").exists());
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let temp_dir = tempdir().unwrap();

        let result = ShellHookRunner.run("exit 3", temp_dir.path());
        assert!(result.unwrap_err().to_string().contains('3'));
    }
}
