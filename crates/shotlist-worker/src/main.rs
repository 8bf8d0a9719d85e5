//! Shotlist extraction CLI.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shotlist_models::{ShotlistFilter, TextBucket};
use shotlist_worker::{ShotlistBackends, ShotlistConfig, ShotlistPipeline, ShotlistRequest};

/// Extract a timestamped shot breakdown with on-screen text from a video.
#[derive(Debug, Parser)]
#[command(name = "shotlist", version, about)]
struct Cli {
    /// Video file to analyze
    input: PathBuf,

    /// Scene-change sensitivity threshold (0.05 - 0.95)
    #[arg(short, long, env = "SHOTLIST_SENSITIVITY")]
    sensitivity: Option<f64>,

    /// Keep only shots carrying text from the included buckets
    #[arg(long)]
    only_with_text: bool,

    /// Bucket to report (titles, lowerThirds, locations, other); repeatable
    #[arg(long = "include-bucket", value_name = "BUCKET")]
    include_buckets: Vec<TextBucket>,

    /// Omit base64 stills from the output
    #[arg(long)]
    no_stills: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shotlist=info,warn"));

    // stdout carries the result, logs go to stderr
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = ShotlistConfig::from_env();
    info!(work_dir = %config.work_dir.display(), "Starting shotlist");

    let mut request = ShotlistRequest::new(cli.input)
        .with_filter(ShotlistFilter::new(cli.only_with_text, cli.include_buckets));
    if let Some(sensitivity) = cli.sensitivity {
        request = request.with_sensitivity(sensitivity);
    }
    if cli.no_stills {
        request = request.without_stills();
    }

    let backends = ShotlistBackends::ffmpeg(&config);
    let pipeline = ShotlistPipeline::new(config, backends);

    let result = match pipeline.run(request).await {
        Ok(result) => result,
        Err(e) => {
            error!("Shotlist extraction failed: {}", e);
            return Err(e.into());
        }
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(())
}
