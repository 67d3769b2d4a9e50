//! Batch replay binary
//!
//! Usage: `ledger-replay <bundle.json> [output.json]`
//!
//! Reads a feed bundle, replays it and writes the lots, change rows, note rows and run
//! report as JSON. Output goes to stdout when no output path is given.

use specimen_ledger_core::SystemClock;
use specimen_ledger_replay::metrics::register_replay_metrics;
use specimen_ledger_replay::{FeedBundle, IngestError, ReplayConfig, ReplayEngine};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_replay=info,specimen_ledger_replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("usage: ledger-replay <bundle.json> [output.json]");
        std::process::exit(2);
    };
    let output_path = args.next();

    let config = ReplayConfig::from_env();
    tracing::info!(?config, "Loaded configuration");
    register_replay_metrics();

    let input = FeedBundle::from_path(&input_path)?.into_input(&config)?;
    let engine = ReplayEngine::new(config);
    let output = engine.run(input, Arc::new(SystemClock))?;

    match output_path {
        Some(path) => {
            let file = std::fs::File::create(&path).map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writer.flush()?;
            tracing::info!(%path, "Wrote replay output");
        },
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writeln!(writer)?;
        },
    }

    if engine.config().report_anomalies {
        eprint!("{}", output.report.anomalies());
    }

    Ok(())
}
