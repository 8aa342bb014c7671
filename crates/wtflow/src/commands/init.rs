use colored::Colorize;
use std::fs;
use std::path::Path;
use wtflow_core::{CONFIG_FILE, DEFAULT_PROJECT_NAME, find_project_root, is_compose_name};

/// wtflow.kdl の雛形
const STARTER: &str = r#"// wtflow 設定ファイル
// ワークツリーごとにポートを offset ずつずらして起動します

project "{name}" worktree_dir=".worktrees" secrets=".env"
ports offset=1000 max_worktrees=5

service "db" {
    image "postgres:16"
    port "main" 5432
    env {
        POSTGRES_PASSWORD "postgres"
    }
    healthcheck test="pg_isready -U postgres"
    volume "db-data" "/var/lib/postgresql/data"
}

service "api" {
    build context="./api"
    port "main" 3000
    env {
        DATABASE_URL "postgres://postgres:postgres@db:5432/postgres"
        PUBLIC_URL "http://localhost:{api.main.host}"
    }
    healthcheck path="/health"
    depends_on {
        db "service_healthy"
    }
}

// hooks {
//     post_create "pnpm install"
// }
"#;

pub fn handle(cwd: &Path, force: bool) -> anyhow::Result<()> {
    let root = find_project_root(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    let path = root.join(CONFIG_FILE);

    if path.exists() && !force {
        anyhow::bail!(
            "{} は既に存在します\nヒント: --force で上書きできます",
            path.display()
        );
    }

    let name = project_name(root.file_name().and_then(|n| n.to_str()).unwrap_or_default());
    fs::write(&path, render_starter(&name))?;

    println!("{} {} を作成しました", "✓".green(), path.display());
    println!("  次のステップ: wtflow create <name>");
    Ok(())
}

/// ディレクトリ名を Compose のプロジェクト名に使える形へ整える
pub fn project_name(dir_name: &str) -> String {
    let mut name = String::new();
    for c in dir_name.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if matches!(c, '-' | '_') {
            name.push(c);
        } else if !name.is_empty() && !name.ends_with('-') {
            name.push('-');
        }
    }
    let name = name
        .trim_start_matches(['-', '_'])
        .trim_end_matches('-')
        .to_string();

    if is_compose_name(&name) {
        name
    } else {
        DEFAULT_PROJECT_NAME.to_string()
    }
}

pub fn render_starter(name: &str) -> String {
    STARTER.replace("{name}", name)
}
