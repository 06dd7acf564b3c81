use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use echo_lsp::config;
use echo_lsp::lsp::dispatcher::ExitStatus;
use echo_lsp::lsp::server::{run_stdio, run_tcp};
use tracing::error;

/// Minimal language server: document synchronization and keyword completion
#[derive(Debug, Parser)]
#[command(name = "echo-lsp", version, about)]
struct Cli {
    /// Serve one client over stdin/stdout (the default)
    #[arg(long, conflicts_with = "listen")]
    stdio: bool,

    /// Accept TCP clients on this address, one workspace per connection
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Log file location (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = config::DEFAULT_LOG_LEVEL)]
    log_level: String,
}

impl Cli {
    fn listen_addr(&self) -> Option<SocketAddr> {
        if self.stdio { None } else { self.listen }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(config::log_path);
    echo_lsp::log::init(&log_path, &cli.log_level)?;

    match cli.listen_addr() {
        Some(addr) => {
            run_tcp(addr).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let code = match run_stdio().await {
                Ok(status) => status.code(),
                Err(e) => {
                    error!("Server failed: {:#}", e);
                    ExitStatus::Abnormal.code()
                }
            };
            // The stdin reader blocks in a thread the runtime would wait for
            std::process::exit(i32::from(code));
        }
    }
}
