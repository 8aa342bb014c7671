use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(
    cwd: &Path,
    name: Option<&str>,
    build: bool,
    services: &[String],
) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;

    println!("{}", "環境を起動中...".green());
    let outcome = orchestrator.start(name, build, services)?;
    let started = &outcome.value;

    println!();
    println!(
        "{} {} を起動しました（スロット {}）",
        "✓".green(),
        started.environment.to_string().cyan(),
        started.slot
    );
    println!("  名前空間: {}", started.namespace);
    if !started.urls.is_empty() {
        println!();
        println!("{}", "URL:".bold());
        for (service, url) in &started.urls {
            println!("  {:<16} {}", service.cyan(), url);
        }
    }

    utils::print_warnings(&outcome.warnings);
    Ok(())
}
