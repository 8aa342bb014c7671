use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// `.git` ディレクトリを持つ一時プロジェクト
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join(".git")).unwrap();
        Self { root }
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("wtflow.kdl"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_slots(&self, content: &str) {
        let dir = self.root.path().join(".worktrees");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".slots.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn create_worktree_dir(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join(".worktrees").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

pub const SHOP_CONFIG: &str = r#"
project "shop"
ports offset=1000 max_worktrees=3

service "api" {
    image "node:20"
    port "main" 3000
    env {
        WEB_URL "http://localhost:{web.main.host}"
    }
}

service "web" {
    image "node:20"
    port "main" 5173
}
"#;
