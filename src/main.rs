//! linode-ddns - keep a Linode address record in sync with the public IP.

use clap::Parser;
use linode_ddns::config::Config;
use linode_ddns::reconciler::{run_once, RunOutcome, EXIT_FAILED};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linode-ddns")]
#[command(about = "Point a Linode DNS address record at this machine's public IP")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace requests and responses to stderr
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration and exit
    #[arg(long)]
    print_example: bool,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    if let Some(path) = std::env::var_os("LINODE_DDNS_CONFIG") {
        return PathBuf::from(path);
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("linode-ddns/config.toml")),
        Some(PathBuf::from("/etc/linode-ddns/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Diagnostics go to stderr; stdout carries only the status line.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_example {
        return match Config::example().to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(EXIT_FAILED)
            }
        };
    }

    let config_path = get_config_path(cli.config);
    let outcome = match Config::load_from(&config_path) {
        Ok(mut config) => {
            config.debug |= cli.debug;
            init_logging(config.debug);
            run_once(&config).await
        }
        Err(e) => {
            init_logging(cli.debug);
            RunOutcome::from(e)
        }
    };

    println!("{}", outcome);
    ExitCode::from(outcome.exit_code())
}
