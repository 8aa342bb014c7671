use crate::utils;
use colored::Colorize;
use std::path::Path;
use wtflow_core::EnvironmentState;

pub fn handle(cwd: &Path) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;
    let outcome = orchestrator.list()?;

    if outcome.value.is_empty() {
        println!("{}", "ワークツリーはありません".dimmed());
        println!("  wtflow create <name> で作成できます");
        return Ok(());
    }

    println!(
        "{}",
        format!("ワークツリー一覧 ({} 個):", outcome.value.len()).bold()
    );
    for env in &outcome.value {
        let state = match env.state {
            EnvironmentState::Active => "active".green(),
            EnvironmentState::Stopped => "stopped".dimmed(),
            EnvironmentState::Provisioning => "provisioning".yellow(),
            EnvironmentState::Absent => "absent".red(),
        };
        let slot = env
            .slot
            .map(|s| format!("#{}", s))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<24} {:<4} {:<14} {}",
            env.name.cyan(),
            slot,
            state,
            env.branch.as_deref().unwrap_or("-")
        );
        for (service, port) in &env.main_ports {
            println!("      {} → http://localhost:{}", service, port);
        }
    }

    utils::print_warnings(&outcome.warnings);
    Ok(())
}
