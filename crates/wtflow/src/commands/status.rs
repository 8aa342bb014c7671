use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(cwd: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let orchestrator = utils::orchestrator(cwd)?;
    let outcome = orchestrator.status(name)?;
    let report = &outcome.value;

    println!("{}", format!("環境: {}", report.environment).bold());
    println!("  スロット:   {}", report.slot);
    println!("  名前空間:   {}", report.namespace);
    println!("  作業パス:   {}", report.working_dir.display());
    if report.definition_exists {
        println!("  定義:       {}", report.definition_path.display());
    } else {
        println!("  定義:       {}", "(未生成)".dimmed());
    }

    println!();
    println!("{}", "ポート:".bold());
    utils::print_ports(&report.ports);

    if let Some(containers) = &report.containers {
        println!();
        println!("{}", "コンテナ:".bold());
        print!("{}", containers);
    }

    if !report.addresses.is_empty() {
        println!();
        println!("{}", "アドレス:".bold());
        for (service, ip) in &report.addresses {
            println!("  {:<16} {}", service.cyan(), ip);
        }
    }

    utils::print_warnings(&outcome.warnings);
    Ok(())
}
