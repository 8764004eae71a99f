//! dwell - Main Entry Point
//!
//! Usage: `dwell <session.json> [--realtime] [--config <config.json>]`

use dwell_browser::{run_realtime, run_simulated, CliArgs, LogSink, SessionScript};
use dwell_engine::TrackerConfig;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    let config = match args.config_path {
        Some(path) => TrackerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => TrackerConfig::default(),
    }
    .with_env_overrides()?;

    log::info!("Starting dwell session {}...", args.session_path);
    let script = SessionScript::load(&args.session_path)?;

    let sink = LogSink::new();
    let labels = sink.labels();
    let summary = if args.realtime {
        run_realtime(&script, config, sink)?
    } else {
        run_simulated(&script, config, sink)?
    };

    for (id, total) in &summary.totals {
        let label = labels.borrow().get(id).cloned().unwrap_or_default();
        println!("{id}\t{:.3}s\t{label}", total.as_secs_f64());
    }
    println!("hidden\t{:.3}s", summary.hidden.as_secs_f64());
    log::info!("Report: {}", summary.report.to_json());

    Ok(())
}
