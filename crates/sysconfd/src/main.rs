//! sysconfd
//!
//! Host configuration agent. Reads request payloads as JSON lines on stdin,
//! answers each with `{"request_uuid": ...}` and executes the queued
//! commands one request at a time.
//!
//! ```text
//! echo '{"ipbx": ["dialplan reload"], "chown_autoprov_config": ["x"]}' | sysconfd
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sysconf_requests::SystemProcessRunner;
use tokio::io::BufReader;

mod config;
mod driver;
mod runtime;

use config::{Config, DEFAULT_CONFIG_PATH, NODE_UUID_ENV};
use runtime::Runtime;

#[derive(Parser)]
#[command(name = "sysconfd", version, about = "Host configuration agent")]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, help = "path of the TOML config file")]
    config: PathBuf,

    #[arg(
        long,
        default_value = "info",
        help = "default log filter, RUST_LOG takes precedence"
    )]
    log_level: String,

    #[arg(long, help = "print the effective configuration and exit")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries responses, logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = Config::load(&cli.config)?;
    config.resolve_node_uuid(std::env::var(NODE_UUID_ENV).ok());
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    log::info!("Starting sysconfd {}", env!("CARGO_PKG_VERSION"));
    let runtime = Runtime::start(&config, Arc::new(SystemProcessRunner))?;

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        served = driver::serve_lines(runtime.handlers(), stdin, tokio::io::stdout()) => {
            let served = served.context("request input failed")?;
            log::info!("Input closed after {served} requests, serving bus events until interrupted");
            tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
        }
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("failed to listen for Ctrl-C")?;
        }
    }

    runtime.shutdown();
    log::info!("sysconfd stopped");
    Ok(())
}
