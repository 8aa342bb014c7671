//! git CLI ラッパー

use crate::error::{GitError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use wtflow_core::lifecycle::Vcs;

const REMOTE: &str = "origin";

/// メインチェックアウトを起点に git を操作する
///
/// 削除は `worktree_root` の配下に限る。
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
    worktree_root: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>, worktree_root: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            worktree_root: worktree_root.into(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// `git -C <dir> <args>` を実行して stdout を返す
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        debug!(dir = %dir.display(), "Running: git {}", args.join(" "));

        let output = Command::new("git").arg("-C").arg(dir).args(args).output()?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.first().copied().unwrap_or_default()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// 参照が存在するか（`show-ref --verify`）
    fn ref_exists(&self, reference: &str) -> Result<bool> {
        let status = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(["show-ref", "--verify", "--quiet", reference])
            .status()?;
        Ok(status.success())
    }

    /// ワークツリーの起点（`origin/{base}` を優先）
    pub fn resolve_start_point(&self, base: &str) -> Result<String> {
        if self.ref_exists(&format!("refs/remotes/{}/{}", REMOTE, base))? {
            return Ok(format!("{}/{}", REMOTE, base));
        }
        if self.ref_exists(&format!("refs/heads/{}", base))? {
            return Ok(base.to_string());
        }
        Err(GitError::BaseNotFound(base.to_string()))
    }

    fn create(&self, path: &Path, branch: &str, base: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path_str = path.to_string_lossy();

        if self.branch_exists_local(branch)? {
            info!(branch = %branch, "Reusing existing branch");
            self.run(&self.repo, &["worktree", "add", &path_str, branch])?;
        } else {
            let start = self.resolve_start_point(base)?;
            info!(branch = %branch, start = %start, "Creating worktree from start point");
            self.run(
                &self.repo,
                &["worktree", "add", "-b", branch, &path_str, &start],
            )?;
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(path = %path.display(), "Worktree directory already gone, pruning");
            self.run(&self.repo, &["worktree", "prune"])?;
            return Ok(());
        }

        let target = self.contained_path(path)?;
        let path_str = target.to_string_lossy();
        match self.run(&self.repo, &["worktree", "remove", "--force", &path_str]) {
            Ok(_) => Ok(()),
            Err(e) => {
                // 登録されていないディレクトリは直接消して管理情報を掃除する
                warn!(
                    path = %target.display(),
                    error = %e,
                    "git worktree remove failed, deleting directory"
                );
                if target.exists() {
                    fs::remove_dir_all(&target)?;
                }
                self.run(&self.repo, &["worktree", "prune"])?;
                Ok(())
            }
        }
    }

    /// 正規化したうえで `worktree_root` の真に内側にあるパスだけを返す
    fn contained_path(&self, path: &Path) -> Result<PathBuf> {
        let outside = || GitError::OutsideWorktreeRoot(path.to_path_buf());
        let root = self.worktree_root.canonicalize().map_err(|_| outside())?;
        let target = path.canonicalize().map_err(|_| outside())?;

        if target != root && target.starts_with(&root) {
            Ok(target)
        } else {
            Err(outside())
        }
    }

    fn branch_exists_local(&self, branch: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/heads/{}", branch))
    }
}

impl Vcs for GitCli {
    fn fetch(&self) -> anyhow::Result<()> {
        self.run(&self.repo, &["fetch", REMOTE, "--prune"])?;
        Ok(())
    }

    fn create_worktree(&self, path: &Path, branch: &str, base: &str) -> anyhow::Result<()> {
        Ok(self.create(path, branch, base)?)
    }

    fn remove_worktree(&self, path: &Path) -> anyhow::Result<()> {
        Ok(self.remove(path)?)
    }

    fn branch_exists(&self, branch: &str) -> anyhow::Result<bool> {
        Ok(self.branch_exists_local(branch)?)
    }

    fn current_branch(&self, worktree: &Path) -> anyhow::Result<String> {
        let output = self.run(worktree, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(output.trim().to_string())
    }

    fn has_uncommitted_changes(&self, worktree: &Path) -> anyhow::Result<bool> {
        let output = self.run(worktree, &["status", "--porcelain"])?;
        Ok(is_dirty(&output))
    }

    fn delete_branch(&self, branch: &str, remote: bool) -> anyhow::Result<()> {
        self.run(&self.repo, &["branch", "-D", branch])?;
        info!(branch = %branch, "Deleted local branch");
        if remote {
            self.run(&self.repo, &["push", REMOTE, "--delete", branch])?;
            info!(branch = %branch, "Deleted remote branch");
        }
        Ok(())
    }
}

/// `status --porcelain` の出力に変更があるか
pub fn is_dirty(porcelain: &str) -> bool {
    porcelain.lines().any(|line| !line.trim().is_empty())
}
