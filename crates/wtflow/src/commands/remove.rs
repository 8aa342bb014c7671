use crate::utils;
use colored::Colorize;
use std::path::Path;
use wtflow_core::RemoveOptions;

pub fn handle(cwd: &Path, name: &str, options: RemoveOptions) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    println!("{}", format!("ワークツリー '{}' を削除中...", name).yellow());
    let outcome = orchestrator.remove(name, options)?;
    let removed = &outcome.value;

    if removed.already_absent {
        println!("  ℹ ワークツリーは既に存在しません");
    } else {
        println!("  {} ワークツリーを削除しました", "✓".green());
    }
    if let Some(slot) = removed.released_slot {
        println!("  {} スロット {} を解放しました", "✓".green(), slot);
    }
    if removed.branch_deleted
        && let Some(branch) = &removed.branch
    {
        println!("  {} ブランチ {} を削除しました", "✓".green(), branch.cyan());
    }

    utils::print_warnings(&outcome.warnings);
    Ok(())
}
