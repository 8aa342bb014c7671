use crate::utils;
use colored::Colorize;
use std::path::Path;
use wtflow_core::CreateRequest;

pub fn handle(
    cwd: &Path,
    name: String,
    branch: Option<String>,
    base: String,
    force: bool,
    skip_hooks: bool,
) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    println!("{}", format!("ワークツリー '{}' を作成中...", name).blue());
    let request = CreateRequest {
        name,
        branch,
        base: Some(base),
        force,
        skip_hooks,
    };
    let outcome = orchestrator.create(&request)?;
    let created = &outcome.value;

    println!();
    println!("{} ワークツリーを作成しました", "✓".green());
    println!("  名前:     {}", created.name.cyan());
    println!("  ブランチ: {}", created.branch.cyan());
    println!("  スロット: {}", created.slot.to_string().cyan());
    println!("  パス:     {}", created.path.display());
    println!();
    println!("{}", "ポート:".bold());
    utils::print_ports(&created.ports);

    utils::print_warnings(&outcome.warnings);

    println!();
    println!(
        "{} cd {} && wtflow dev",
        "次のステップ:".bold(),
        created.path.display()
    );
    Ok(())
}
