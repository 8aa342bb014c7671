use colored::Colorize;
use std::path::Path;
use tracing::debug;
use wtflow_container::DockerCompose;
use wtflow_core::{ContextResolver, Orchestrator, PortMapping, Warning};
use wtflow_git::GitCli;

/// カレントディレクトリからオーケストレーターを組み立てる
pub fn orchestrator(cwd: &Path) -> anyhow::Result<Orchestrator> {
    let resolver = ContextResolver::discover(cwd)?;
    debug!(root = %resolver.project_root().display(), "Resolved project root");
    let git = GitCli::new(resolver.project_root(), resolver.storage_root());
    Ok(Orchestrator::new(
        resolver,
        Box::new(git),
        Box::new(DockerCompose::new()),
    ))
}

/// 警告を黄色で表示（終了コードには影響しない）
pub fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    for warning in warnings {
        println!("{} {}", "⚠".yellow(), warning.to_string().yellow());
    }
}

/// ポート表を表示
pub fn print_ports(ports: &[PortMapping]) {
    if ports.is_empty() {
        println!("  {}", "(ポートなし)".dimmed());
        return;
    }
    for mapping in ports {
        println!(
            "  {:<20} localhost:{} → {}",
            format!("{}.{}", mapping.service, mapping.port).cyan(),
            mapping.host.to_string().bold(),
            mapping.container
        );
    }
}

/// 環境名の表示用ラベル
pub fn env_label(name: Option<&str>) -> String {
    name.unwrap_or("main").to_string()
}
