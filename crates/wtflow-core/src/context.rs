//! 実行コンテキストの解決
//!
//! カレントディレクトリ（または明示的な環境名）から、操作対象の環境を決定します。

use crate::discovery::find_project_root;
use crate::error::{EnvError, Result};
use crate::generator::namespace;
use crate::loader::load_config;
use crate::model::ProjectConfig;
use crate::port::{PortMapping, port_table};
use crate::registry::SlotRegistry;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// メイン環境の定義ファイル名
pub const MAIN_DEFINITION_FILE: &str = "docker-compose.yml";

/// メイン環境の予約名
pub const MAIN_ENVIRONMENT: &str = "main";

/// Compose のプロジェクト名として使える文字列か（`[a-z0-9][a-z0-9_-]*`）
pub fn is_compose_name(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
}

/// 名前付き環境の名前を検証
///
/// 環境名はワークツリーのパスの1セグメントであり、名前空間の一部にもなる。
/// そのため Compose のプロジェクト名と同じ文字種に限り、`main` は予約する。
pub fn validate_environment_name(name: &str) -> Result<()> {
    if is_compose_name(name) && !name.eq_ignore_ascii_case(MAIN_ENVIRONMENT) {
        Ok(())
    } else {
        Err(EnvError::InvalidEnvironmentName(name.to_string()))
    }
}

/// 環境の種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvKind {
    /// スロット 0 のメインチェックアウト
    Main,
    Named(String),
}

impl EnvKind {
    pub fn name(&self) -> Option<&str> {
        match self {
            EnvKind::Main => None,
            EnvKind::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvKind::Main => write!(f, "main"),
            EnvKind::Named(name) => write!(f, "{}", name),
        }
    }
}

/// 解決済みの実行コンテキスト（永続化されない）
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub project_root: PathBuf,
    pub working_dir: PathBuf,
    pub kind: EnvKind,
    pub slot: u32,
    pub definition_path: PathBuf,
    pub namespace: String,
    pub config: ProjectConfig,
}

impl EnvironmentContext {
    pub fn is_main(&self) -> bool {
        self.kind == EnvKind::Main
    }

    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    pub fn ports(&self) -> Vec<PortMapping> {
        port_table(&self.config, self.slot)
    }

    pub fn has_definition(&self) -> bool {
        self.definition_path.exists()
    }
}

/// ワークツリー格納ディレクトリ
pub fn storage_root(project_root: &Path, config: &ProjectConfig) -> PathBuf {
    project_root.join(&config.project.worktree_dir)
}

/// 名前付き環境のワークツリーパス
pub fn worktree_path(project_root: &Path, config: &ProjectConfig, name: &str) -> PathBuf {
    storage_root(project_root, config).join(name)
}

/// 定義ファイルのパス
pub fn definition_path(
    project_root: &Path,
    config: &ProjectConfig,
    environment: Option<&str>,
) -> PathBuf {
    match environment {
        None => project_root.join(MAIN_DEFINITION_FILE),
        Some(name) => worktree_path(project_root, config, name)
            .join(format!("docker-compose.{}.yml", name)),
    }
}

/// プロジェクトルート・設定・作業ディレクトリからコンテキストを解決する
#[derive(Debug, Clone)]
pub struct ContextResolver {
    project_root: PathBuf,
    config: ProjectConfig,
    cwd: PathBuf,
}

impl ContextResolver {
    pub fn new(project_root: PathBuf, config: ProjectConfig, cwd: PathBuf) -> Self {
        Self {
            project_root,
            config,
            cwd,
        }
    }

    /// `cwd` からプロジェクトルートを探し、設定を読み込む
    pub fn discover(cwd: &Path) -> Result<Self> {
        let project_root = find_project_root(cwd)?;
        let config = load_config(&project_root)?;
        Ok(Self::new(project_root, config, cwd.to_path_buf()))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn storage_root(&self) -> PathBuf {
        storage_root(&self.project_root, &self.config)
    }

    pub fn registry(&self) -> SlotRegistry {
        SlotRegistry::for_config(&self.project_root, &self.config)
    }

    /// 作業ディレクトリから環境名を推定する
    ///
    /// `{root}/{worktree_dir}/` の直下のセグメントが環境名になる。
    pub fn detect_name(&self) -> Option<String> {
        let storage = self.storage_root();
        let relative = self
            .cwd
            .strip_prefix(&storage)
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| {
                // シンボリックリンク経由のパスでも一致させる
                let cwd = self.cwd.canonicalize().ok()?;
                let storage = storage.canonicalize().ok()?;
                cwd.strip_prefix(&storage).ok().map(Path::to_path_buf)
            })?;

        match relative.components().next() {
            Some(Component::Normal(segment)) => {
                let name = segment.to_string_lossy().to_string();
                (!name.starts_with('.')).then_some(name)
            }
            _ => None,
        }
    }

    /// コンテキストを解決
    ///
    /// 明示的な名前はパスからの推定より優先される。`main` はメイン環境を指す。
    #[instrument(skip(self))]
    pub fn resolve(&self, explicit: Option<&str>) -> Result<EnvironmentContext> {
        let name = match explicit {
            Some(MAIN_ENVIRONMENT) => None,
            Some(name) => {
                validate_environment_name(name)?;
                Some(name.to_string())
            }
            None => self.detect_name(),
        };

        let Some(name) = name else {
            debug!("Resolved main environment");
            return Ok(EnvironmentContext {
                project_root: self.project_root.clone(),
                working_dir: self.project_root.clone(),
                kind: EnvKind::Main,
                slot: 0,
                definition_path: definition_path(&self.project_root, &self.config, None),
                namespace: namespace(&self.config, None),
                config: self.config.clone(),
            });
        };

        let working_dir = worktree_path(&self.project_root, &self.config, &name);
        if !working_dir.exists() {
            return Err(EnvError::EnvironmentNotFound(name));
        }

        let slot = self
            .registry()
            .get(&name)
            .ok_or_else(|| EnvError::SlotNotAssigned(name.clone()))?;

        debug!(name = %name, slot, "Resolved named environment");
        Ok(EnvironmentContext {
            project_root: self.project_root.clone(),
            definition_path: definition_path(&self.project_root, &self.config, Some(&name)),
            namespace: namespace(&self.config, Some(&name)),
            working_dir,
            kind: EnvKind::Named(name),
            slot,
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectInfo;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn project() -> (TempDir, ProjectConfig) {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        let config = ProjectConfig {
            project: ProjectInfo {
                name: "shop".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        (temp_dir, config)
    }

    fn resolver(root: &Path, config: &ProjectConfig, cwd: PathBuf) -> ContextResolver {
        ContextResolver::new(root.to_path_buf(), config.clone(), cwd)
    }

    #[test]
    fn test_main_context() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();

        let ctx = resolver(root, &config, root.join("apps"))
            .resolve(None)
            .unwrap();
        assert!(ctx.is_main());
        assert_eq!(ctx.slot, 0);
        assert_eq!(ctx.working_dir, root);
        assert_eq!(ctx.definition_path, root.join("docker-compose.yml"));
        assert_eq!(ctx.namespace, "shop");
    }

    #[test]
    fn test_named_context_from_path() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        let worktree = root.join(".worktrees/feature-x");
        fs::create_dir_all(worktree.join("src")).unwrap();
        let slot = SlotRegistry::for_config(root, &config)
            .assign("feature-x")
            .unwrap();

        let ctx = resolver(root, &config, worktree.join("src"))
            .resolve(None)
            .unwrap();
        assert_eq!(ctx.kind, EnvKind::Named("feature-x".to_string()));
        assert_eq!(ctx.slot, slot);
        assert_eq!(ctx.working_dir, worktree);
        assert_eq!(
            ctx.definition_path,
            worktree.join("docker-compose.feature-x.yml")
        );
        assert_eq!(ctx.namespace, "shop-wt-feature-x");
    }

    #[test]
    fn test_explicit_name_overrides_path() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".worktrees/a")).unwrap();
        fs::create_dir_all(root.join(".worktrees/b")).unwrap();
        let registry = SlotRegistry::for_config(root, &config);
        registry.assign("a").unwrap();
        registry.assign("b").unwrap();

        let ctx = resolver(root, &config, root.join(".worktrees/a"))
            .resolve(Some("b"))
            .unwrap();
        assert_eq!(ctx.name(), Some("b"));
        assert_eq!(ctx.slot, 2);
    }

    #[test]
    fn test_missing_environment() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();

        let result = resolver(root, &config, root.to_path_buf()).resolve(Some("ghost"));
        assert!(matches!(result, Err(EnvError::EnvironmentNotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_slot_not_assigned() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".worktrees/manual")).unwrap();

        let result = resolver(root, &config, root.to_path_buf()).resolve(Some("manual"));
        assert!(matches!(result, Err(EnvError::SlotNotAssigned(_))));
    }

    #[test]
    fn test_explicit_main_is_main_environment() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();

        let ctx = resolver(root, &config, root.to_path_buf())
            .resolve(Some("main"))
            .unwrap();
        assert!(ctx.is_main());
        assert_eq!(ctx.slot, 0);
    }

    #[test]
    fn test_explicit_name_must_stay_inside_storage() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".worktrees/a")).unwrap();
        let resolver = resolver(root, &config, root.to_path_buf());

        for name in ["..", "", "a/../..", ".", "/etc", "Feature.v2", "MAIN"] {
            let result = resolver.resolve(Some(name));
            assert!(
                matches!(result, Err(EnvError::InvalidEnvironmentName(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_out_of_range_slot_is_not_assigned() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".worktrees/a")).unwrap();
        fs::write(root.join(".worktrees/.slots.json"), r#"{"a": 5000000}"#).unwrap();

        let result = resolver(root, &config, root.to_path_buf()).resolve(Some("a"));
        assert!(matches!(result, Err(EnvError::SlotNotAssigned(name)) if name == "a"));
    }

    #[test]
    fn test_compose_name_charset() {
        for valid in ["shop", "feature-x", "wt_1", "2024-q1", "a"] {
            assert!(is_compose_name(valid), "{}", valid);
        }
        for invalid in ["", "Feature", "v1.2", "-lead", "_lead", "a b", "a/b", ".."] {
            assert!(!is_compose_name(invalid), "{}", invalid);
        }
    }

    #[test]
    fn test_main_is_reserved() {
        assert!(validate_environment_name("main").is_err());
        assert!(validate_environment_name("mainline").is_ok());
    }

    #[test]
    fn test_storage_root_itself_is_main() {
        let (temp_dir, config) = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".worktrees")).unwrap();

        let resolver = resolver(root, &config, root.join(".worktrees"));
        assert_eq!(resolver.detect_name(), None);
    }

    #[test]
    fn test_discover_from_worktree() {
        let (temp_dir, _) = project();
        let root = temp_dir.path();
        fs::write(root.join("wtflow.kdl"), "project \"shop\"\n").unwrap();
        let worktree = root.join(".worktrees/feature");
        fs::create_dir_all(&worktree).unwrap();
        fs::write(worktree.join(".git"), "gitdir: elsewhere").unwrap();

        let resolver = ContextResolver::discover(&worktree).unwrap();
        assert_eq!(resolver.project_root(), root);
        assert_eq!(resolver.config().project.name, "shop");
        assert_eq!(resolver.detect_name().as_deref(), Some("feature"));
    }
}
