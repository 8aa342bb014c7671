use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(
    cwd: &Path,
    name: Option<&str>,
    volumes: bool,
    clean_links: bool,
) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    println!("{}", "環境を停止中...".yellow());
    let outcome = orchestrator.stop(name, volumes, clean_links)?;
    let stopped = &outcome.value;

    if stopped.already_stopped {
        println!("  ℹ {} は起動していません", stopped.environment.to_string().cyan());
    } else {
        println!("  {} {} を停止しました", "✓".green(), stopped.environment.to_string().cyan());
    }
    if stopped.links_removed > 0 {
        println!(
            "  {} ローカルリンクを {} 件削除しました",
            "✓".green(),
            stopped.links_removed
        );
    }

    utils::print_warnings(&outcome.warnings);
    Ok(())
}
