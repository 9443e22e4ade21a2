//! Overpayment server
//!
//! Serves the loan overpayment calculator over HTTP.

use clap::Parser;
use credit_overpayment_rs::config::{build_config, CliArgs};
use credit_overpayment_rs::server::{build_calculator, Server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loan overpayment calculator backed by the central bank key rate
#[derive(Parser, Debug)]
#[command(name = "overpayment_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Key rate endpoint of the central bank service
    #[arg(long)]
    rate_service_url: Option<String>,

    /// Do not call the rate service, always use the default rate
    #[arg(long)]
    offline: bool,
}

impl From<Args> for CliArgs {
    fn from(args: Args) -> Self {
        CliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            rate_service_url: args.rate_service_url,
            offline: args.offline,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli_args: CliArgs = Args::parse().into();
    let config = build_config(&cli_args)?;

    init_tracing(config.log_level.as_filter_str());

    tracing::info!("Overpayment server v{}", credit_overpayment_rs::VERSION);
    tracing::info!(
        address = %config.socket_addr(),
        log_level = %config.log_level,
        rate_service = %config.rate_service.url,
        offline = config.rate_service.offline,
        default_rate = %config.rate_service.default_rate(),
        accrual_period = ?config.calculator.accrual_period,
        "Server configuration loaded"
    );

    // the blocking rate client has to be created and dropped outside the runtime
    let calculator = build_calculator(&config)?;
    let server = Server::new(config, calculator.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server.run())?;
    drop(runtime);
    drop(calculator);

    Ok(())
}
