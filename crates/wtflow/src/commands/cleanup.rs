use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(cwd: &Path, force: bool, volumes: bool) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    println!("{}", "すべてのワークツリーを削除中...".yellow());
    let outcome = orchestrator.cleanup_all(force, volumes)?;
    let report = &outcome.value;

    for name in &report.removed {
        println!("  {} {}", "✓".green(), name);
    }
    for (name, reason) in &report.failed {
        println!("  {} {}: {}", "✗".red(), name, reason);
    }
    if report.removed.is_empty() && report.failed.is_empty() {
        println!("  ℹ 削除するワークツリーはありません");
    }

    utils::print_warnings(&outcome.warnings);

    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} 個のワークツリーを削除できませんでした",
            report.failed.len()
        );
    }
    Ok(())
}
