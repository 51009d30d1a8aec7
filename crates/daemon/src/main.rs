// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! isxopsd — the operation orchestrator's HTTP/WebSocket daemon.

use isxops_daemon::config::Config;
use isxops_daemon::logging::setup_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("isxopsd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("isxopsd {}", env!("CARGO_PKG_VERSION"));
                println!("Iraq Stock Exchange operation orchestrator daemon");
                println!();
                println!("USAGE:");
                println!("    isxopsd");
                println!();
                println!("Configuration is read entirely from ISXOPS_* environment");
                println!("variables; see ISXOPS_BIND_ADDR, ISXOPS_WORKERS,");
                println!("ISXOPS_QUEUE_CAPACITY, ISXOPS_JOB_RETENTION, ISXOPS_FAN_OUT,");
                println!("ISXOPS_CANCEL_GRACE, ISXOPS_REQUEST_TIMEOUT, ISXOPS_LOG_PATH.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: isxopsd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let log_guard = setup_logging(&config)?;

    info!(addr = %config.bind_addr, "starting isxopsd");

    if let Err(e) = isxops_daemon::run(config).await {
        error!("daemon exited with error: {e}");
        drop(log_guard);
        return Err(e);
    }

    Ok(())
}
