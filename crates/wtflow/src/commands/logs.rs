use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(
    cwd: &Path,
    name: Option<&str>,
    follow: bool,
    services: &[String],
) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    let outcome = orchestrator.logs(name, follow, services)?;
    if !outcome.value {
        println!(
            "  ℹ {} の定義ファイルがありません（wtflow dev で起動してください）",
            utils::env_label(name).cyan()
        );
    }
    Ok(())
}
