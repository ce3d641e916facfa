//! `fprintd` — the fingerprint D-Bus daemon's entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use fprintd::driver::{DriverAdapter, SimulatedDriver};
use fprintd::manager::Manager;

/// Default location for enrolled print templates.
const DEFAULT_STORAGE_BASE: &str = "/var/lib/fprint";

/// Default location for `fprintd.conf`.
const DEFAULT_SYSCONFDIR: &str = "/etc";

#[derive(Debug, Parser)]
#[command(name = "fprintd", version, about = "Fingerprint reader D-Bus daemon")]
struct Cli {
    /// Don't exit after 30 seconds of inactivity.
    #[arg(short = 't', long = "no-timeout")]
    no_timeout: bool,

    /// Accepted for command-line parity with the original daemon; Rust
    /// panics already abort the process by the time this matters, so this
    /// flag is a no-op kept for script compatibility.
    #[arg(long = "g-fatal-warnings")]
    g_fatal_warnings: bool,

    /// Override the sysconfdir fprintd.conf is read from (defaults to `/etc`).
    #[arg(long = "sysconfdir", default_value = DEFAULT_SYSCONFDIR)]
    sysconfdir: PathBuf,

    /// Override the template storage base directory.
    #[arg(long = "storage-base", default_value = DEFAULT_STORAGE_BASE)]
    storage_base: PathBuf,
}

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    let _ = cli.g_fatal_warnings;

    simple_logger::SimpleLogger::new()
        .env()
        .init()
        .expect("failed to initialize logger");

    let runtime = fprintd::event_loop::build_runtime()?;
    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> std::io::Result<()> {
    let driver: Arc<dyn DriverAdapter> = Arc::new(SimulatedDriver::default());

    let (conn, manager, _idle) = match Manager::start(&cli.sysconfdir, &cli.storage_base, driver, cli.no_timeout).await {
        Ok(started) => started,
        Err(e) => {
            log::error!("failed to start: {e}");
            std::process::exit(1);
        }
    };

    log::info!("registered {} device(s)", manager.devices().len());
    log::info!("entering main loop");

    // The ObjectServer keeps serving requests on `conn`'s background tasks;
    // block here until the process is asked to stop (idle-timeout calls
    // `process::exit` directly, mirroring the original's immediate exit).
    let _ = tokio::signal::ctrl_c().await;
    log::info!("shutdown signal received");
    drop(conn);
    Ok(())
}
