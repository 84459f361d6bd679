use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use oil_gamlss::config::{Config, DEFAULT_CONFIG_PATH};
use oil_gamlss::pipeline::{self, DataSource};

#[derive(Parser, Debug)]
#[command(name = "oil-gamlss")]
#[command(about = "GAMLSS analysis and next-day oil price forecast", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults apply when it is absent.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Dataset CSV, overriding `data.path`.
    #[arg(short = 'd', long = "data", conflicts_with = "synthetic")]
    data: Option<PathBuf>,
    /// Generate a synthetic dataset with this many rows instead of reading a file.
    #[arg(long = "synthetic", value_name = "ROWS")]
    synthetic: Option<usize>,
    /// Split seed (also seeds the synthetic generator).
    #[arg(long = "seed")]
    seed: Option<u64>,
    #[arg(long = "json", value_name = "PATH")]
    json: Option<PathBuf>,
    #[arg(long = "plot-dir", value_name = "DIR")]
    plot_dir: Option<PathBuf>,
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(&config.logging.level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    // stdout carries the report only.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.with_ansi(false).json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.split.seed = seed;
    }
    if let Some(path) = cli.json {
        config.output.json_path = Some(path);
    }
    if let Some(dir) = cli.plot_dir {
        config.output.plot_dir = Some(dir);
    }
    init_tracing(&config);

    let source = match (cli.synthetic, cli.data) {
        (Some(rows), _) => DataSource::Synthetic {
            rows,
            seed: config.split.seed,
        },
        (None, Some(path)) => DataSource::Csv(path),
        (None, None) => DataSource::Csv(config.data.path.clone()),
    };
    tracing::info!(source = %source.describe(), "Starting oil-gamlss");

    let report = pipeline::run(&config, &source)?;
    print!("{}", report.render_text());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
