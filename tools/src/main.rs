//! dq-runner: headless data-quality and risk runner.
//!
//! Usage:
//!   dq-runner generate --seed 42 --db ./data/banking.db
//!   dq-runner quality  --db ./data/banking.db
//!   dq-runner risk     --db ./data/banking.db --report risk.json
//!   dq-runner all      --config config/dq.json --retries 2
//!
//! Violations are reported, never turned into a failing exit code; only
//! errors (unreadable dataset, failed stage) exit non-zero.

use anyhow::{bail, Result};
use bankdq_core::{
    aggregator::{JsonReportSink, RunReport},
    config::DqConfig,
    pipeline::{Pipeline, Stage},
    result::CheckStatus,
    store::DqStore,
};
use std::env;
use std::path::Path;

const USAGE: &str = "usage: dq-runner <generate|quality|risk|all> [--db PATH] [--config PATH] [--seed N] [--report PATH] [--retries N]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!(USAGE);
    };
    let db = parse_str(&args, "--db").unwrap_or("./data/banking.db");
    let config_path = parse_str(&args, "--config");
    let report_path = parse_str(&args, "--report");

    let mut config = match config_path {
        Some(path) => DqConfig::load(path)?,
        None => DqConfig::default(),
    };
    config.generator.seed = parse_arg(&args, "--seed", config.generator.seed);

    let stage = match command {
        "all" => None,
        other => match Stage::parse(other) {
            Some(stage) => Some(stage),
            None => bail!("unknown command '{other}'\n{USAGE}"),
        },
    };
    // Retries only apply to the full pipeline unless asked for.
    let retries = parse_arg(&args, "--retries", if stage.is_none() { 1u32 } else { 0 });

    println!("dq-runner");
    println!("  command:   {command}");
    println!("  db:        {db}");
    println!("  seed:      {}", config.generator.seed);
    println!("  retries:   {retries}");
    println!();

    if let Some(dir) = Path::new(db).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let store = DqStore::open(db)?;
    store.migrate()?;
    log::info!("dataset store ready at {db}");

    let mut pipeline = Pipeline::new(store, config).with_retries(retries);
    let report = match stage {
        Some(stage) => pipeline.run_stage(stage)?,
        None => pipeline.run_all()?,
    };

    if let Some(path) = report_path {
        let mut sink = JsonReportSink::new(path);
        report.publish(&mut sink)?;
        sink.flush()?;
        println!("report written to {path}");
    }

    print_summary(&pipeline.run_id, &report, stage);
    Ok(())
}

fn print_summary(run_id: &str, report: &RunReport, stage: Option<Stage>) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");

    if matches!(stage, Some(Stage::Generate)) {
        println!("  dataset generated");
        return;
    }

    if !report.quality.is_empty() {
        println!();
        println!("=== DATA QUALITY ===");
        for r in &report.quality {
            if r.status != CheckStatus::Pass {
                println!(
                    "  {:<5} {:<28} {:<32} {:>6} | {}",
                    r.status.as_str(),
                    r.check_name,
                    r.target(),
                    r.affected_rows,
                    r.message
                );
            }
        }
        println!(
            "  {} checks, {} not passing",
            report.quality.len(),
            report.quality_failures().count()
        );
    }

    if !report.risk.is_empty() {
        println!();
        println!("=== RISK AUDIT ===");
        for r in &report.risk {
            println!(
                "  {:<5} {:<32} {:>6} | {}",
                r.status.as_str(),
                r.check_name,
                r.affected_rows,
                r.message
            );
        }
        println!("  risk tags:      {}", report.risk_tags.len());
    }

    println!();
    println!("  errors:         {}", report.error_count());
    println!("  verdict:        {}", report.verdict());
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn parse_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
