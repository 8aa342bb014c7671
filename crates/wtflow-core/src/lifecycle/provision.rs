//! 環境の作成・削除

use super::outcome::Warnings;
use super::{
    CleanupReport, CreateRequest, Created, DEFAULT_BASE_BRANCH, Orchestrator, Outcome,
    RemoveOptions, Removed, WarningStep,
};
use crate::compose::write_definition;
use crate::context::{MAIN_ENVIRONMENT, definition_path, validate_environment_name, worktree_path};
use crate::error::{EnvError, Result};
use crate::generator::{generate_definition, namespace};
use crate::port::port_table;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

impl Orchestrator {
    /// 名前付き環境を作成
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub fn create(&self, request: &CreateRequest) -> Result<Outcome<Created>> {
        validate_environment_name(&request.name)?;
        let name = request.name.as_str();
        let root = self.resolver.project_root();
        let config = self.resolver.config();
        let registry = self.resolver.registry();
        let mut warnings = Warnings::default();

        // 1. スロット割り当て
        let fresh = registry.get(name).is_none();
        let slot = registry.assign(name)?;
        let release_if_fresh = || {
            if fresh && let Err(e) = registry.release(name) {
                warn!(error = %e, "Failed to release slot after aborted create");
            }
        };

        // 2. 既存ディレクトリの扱い
        let path = worktree_path(root, config, name);
        if path.exists() {
            if !request.force {
                release_if_fresh();
                return Err(EnvError::AlreadyExists {
                    name: name.to_string(),
                    path,
                });
            }
            info!(path = %path.display(), "Removing existing worktree (--force)");
            if let Err(e) = self.vcs.remove_worktree(&path) {
                release_if_fresh();
                return Err(e.into());
            }
        }

        // 3. リモート取得（オフラインなら警告のみ）
        if let Err(e) = self.vcs.fetch() {
            warnings.push(
                WarningStep::Fetch,
                format!("リモートの取得に失敗しました（ローカルのブランチを使用します）: {}", e),
            );
        }

        // 4. ワークツリー作成
        let branch = request.branch.clone().unwrap_or_else(|| name.to_string());
        let base = request.base.as_deref().unwrap_or(DEFAULT_BASE_BRANCH);
        if let Err(e) = self.vcs.create_worktree(&path, &branch, base) {
            release_if_fresh();
            return Err(e.into());
        }
        info!(path = %path.display(), branch = %branch, base = %base, "Worktree created");

        // 5. シークレットファイルのコピー
        if let Err(e) = copy_secrets(root, &path, &config.project.secrets_file) {
            warnings.push(
                WarningStep::SecretsCopy,
                format!("{} のコピーに失敗しました: {}", config.project.secrets_file, e),
            );
        }

        // 6. 定義ファイル生成
        let compose = generate_definition(config, Some(name), slot);
        let def_path = definition_path(root, config, Some(name));
        if let Err(e) = write_definition(&def_path, &compose) {
            warnings.push(
                WarningStep::Definition,
                format!("定義ファイルの生成に失敗しました: {}", e),
            );
        }

        // 7. 作成後フック
        if !request.skip_hooks {
            for hook in &config.hooks.post_create {
                debug!(hook = %hook, "Running post-create hook");
                if let Err(e) = self.hooks.run(hook, &path) {
                    warnings.push(
                        WarningStep::Hook,
                        format!("フック '{}' が失敗しました: {}", hook, e),
                    );
                }
            }
        }

        Ok(warnings.finish(Created {
            name: name.to_string(),
            slot,
            path,
            branch,
            ports: port_table(config, slot),
        }))
    }

    /// 名前付き環境を削除
    #[instrument(skip(self, options))]
    pub fn remove(&self, name: &str, options: RemoveOptions) -> Result<Outcome<Removed>> {
        // 名前はそのままパスになるため、格納ディレクトリの外を指せないことを先に保証する
        validate_environment_name(name)?;
        let root = self.resolver.project_root();
        let config = self.resolver.config();
        let registry = self.resolver.registry();
        let mut warnings = Warnings::default();

        let path = worktree_path(root, config, name);
        if !path.exists() {
            // ディレクトリが消えていてもスロット記録は残っていることがある
            let released_slot = registry.get(name);
            if released_slot.is_some() {
                registry.release(name)?;
            }
            debug!("Worktree already absent");
            return Ok(warnings.finish(Removed {
                name: name.to_string(),
                already_absent: true,
                released_slot,
                branch: None,
                branch_deleted: false,
            }));
        }

        let branch = self.vcs.current_branch(&path).ok();

        if !options.force && self.vcs.has_uncommitted_changes(&path)? {
            return Err(EnvError::DirtyWorkingTree(name.to_string()));
        }

        let def_path = definition_path(root, config, Some(name));
        if def_path.exists() {
            let ns = namespace(config, Some(name));
            if let Err(e) = self.runtime.down(&def_path, &ns, options.remove_volumes) {
                warnings.push(
                    WarningStep::RuntimeShutdown,
                    format!("コンテナの停止に失敗しました: {}", e),
                );
            }
        }

        self.vcs.remove_worktree(&path)?;
        let released_slot = registry.get(name);
        registry.release(name)?;
        info!(slot = ?released_slot, "Worktree removed");

        let mut branch_deleted = false;
        if options.delete_branch
            && let Some(branch) = &branch
        {
            match self.vcs.delete_branch(branch, options.delete_remote) {
                Ok(()) => branch_deleted = true,
                Err(e) => warnings.push(
                    WarningStep::BranchDelete,
                    format!("ブランチ '{}' の削除に失敗しました: {}", branch, e),
                ),
            }
        }

        Ok(warnings.finish(Removed {
            name: name.to_string(),
            already_absent: false,
            released_slot,
            branch,
            branch_deleted,
        }))
    }

    /// すべての名前付き環境を削除
    ///
    /// 1つの失敗は他の削除を止めない。
    #[instrument(skip(self))]
    pub fn cleanup_all(&self, force: bool, remove_volumes: bool) -> Result<Outcome<CleanupReport>> {
        let mut warnings = Warnings::default();
        let mut report = CleanupReport::default();

        for name in self.known_names()? {
            let options = RemoveOptions {
                force,
                remove_volumes,
                ..Default::default()
            };
            match self.remove(&name, options) {
                Ok(outcome) => {
                    warnings.extend(outcome.warnings);
                    report.removed.push(name);
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "Cleanup failed for environment");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Cleanup finished"
        );
        Ok(warnings.finish(report))
    }

    /// レジストリとワークツリー格納ディレクトリの和集合
    pub(crate) fn known_names(&self) -> Result<BTreeSet<String>> {
        let mut names: BTreeSet<String> = self.resolver.registry().load().into_keys().collect();

        let storage = self.resolver.storage_root();
        if storage.is_dir() {
            for entry in fs::read_dir(&storage)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().to_string();
                names.insert(name);
            }
        }

        names.retain(|name| !name.starts_with('.') && name != MAIN_ENVIRONMENT);
        Ok(names)
    }
}

/// プロジェクトルートのシークレットファイルを新しいワークツリーへコピー
///
/// コピー元がない、またはコピー先が既にある場合は何もしない。
fn copy_secrets(root: &Path, worktree: &Path, file: &str) -> std::io::Result<()> {
    let source = root.join(file);
    let destination = worktree.join(file);
    if !source.is_file() || destination.exists() {
        debug!(source = %source.display(), "Skipping secrets copy");
        return Ok(());
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&source, &destination)?;
    debug!(destination = %destination.display(), "Copied secrets file");
    Ok(())
}
