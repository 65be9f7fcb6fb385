//! Installcast: install-count prediction from raw listing values.
//!
//! Main entry point for the command-line front end.
//!
//! ```bash
//! installcast predict <listing.json> [--model-dir <dir>]
//! installcast smoke <cases.json> [--model-dir <dir>]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use installcast::adapters::json::{load_listing, load_smoke_cases, JsonMetadataSource};
use installcast::adapters::linear::LinearRegressor;
use installcast::config::PredictorConfig;
use installcast::PredictionService;

enum Command {
    Predict(PathBuf),
    Smoke(PathBuf),
}

fn usage() -> String {
    "Usage: installcast <predict <listing.json> | smoke <cases.json>> [--model-dir <dir>]"
        .to_string()
}

fn parse_args(config: &mut PredictorConfig) -> Result<Command> {
    let mut args = std::env::args().skip(1);
    let mut command: Option<String> = None;
    let mut input: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model-dir" => {
                let v = args.next().ok_or_else(|| anyhow!(usage()))?;
                config.model_dir = PathBuf::from(v);
            }
            "-h" | "--help" => bail!(usage()),
            _ => {
                if command.is_none() {
                    command = Some(arg);
                } else if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    bail!(usage());
                }
            }
        }
    }

    let input = input.ok_or_else(|| anyhow!(usage()))?;
    match command.as_deref() {
        Some("predict") => Ok(Command::Predict(input)),
        Some("smoke") => Ok(Command::Smoke(input)),
        _ => bail!(usage()),
    }
}

fn main() -> Result<()> {
    // Logs go to stderr (or a file) so stdout carries only the result.
    let log_mode = std::env::var("INSTALLCAST_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, _guard) = if log_mode == "file" {
        let log_file = std::env::var("INSTALLCAST_LOG_FILE")
            .unwrap_or_else(|_| "installcast.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let mut config = PredictorConfig::from_env();
    let command = parse_args(&mut config)?;

    let regressor = Arc::new(LinearRegressor::load(&config.model_path())?);
    let source = JsonMetadataSource::new(config.metadata_path());
    let service = PredictionService::load(&source, Arc::clone(&regressor))?;
    regressor.check_layout(service.metadata())?;

    match command {
        Command::Predict(path) => {
            let listing = load_listing(&path)
                .with_context(|| format!("Failed to read listing {}", path.display()))?;
            println!("{}", service.render(&listing));
        }
        Command::Smoke(path) => {
            let cases = load_smoke_cases(&path)
                .with_context(|| format!("Failed to read smoke cases {}", path.display()))?;
            let results = service.verify_smoke_cases(&cases, config.smoke_tolerance);

            let mut failed = 0;
            for result in &results {
                if result.passed() {
                    println!("ok    {}", result.name);
                    continue;
                }
                failed += 1;
                println!("FAIL  {}", result.name);
                if let Some((expected, actual)) = result.width_mismatch {
                    println!("      expected {expected} columns, built {actual}");
                }
                for m in &result.mismatches {
                    println!(
                        "      {}: expected {:.6}, got {:.6}",
                        m.column, m.expected, m.actual
                    );
                }
            }
            println!("{} passed, {failed} failed", results.len() - failed);

            if failed > 0 {
                bail!("{failed} smoke case(s) diverge");
            }
        }
    }

    Ok(())
}
