//! Shared start-up helpers for the yeyak command-line programs.

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

/// Exit code when the API key is missing.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for network, fetch and file failures.
pub const EXIT_FAILURE: u8 = 3;

const DEFAULT_FILTER: &str =
    "warn,yeyak_core=info,yeyak_provider_seoul=info,fetch_reservations=info,compose_digest=info";

/// Log to stderr; `RUST_LOG` replaces the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Print a fatal error and map it to the process exit code.
#[expect(clippy::print_stderr, reason = "fatal errors are reported on the terminal")]
#[must_use]
pub fn fatal(code: u8, err: &anyhow::Error) -> ExitCode {
    eprintln!("ERROR: {err:#}");
    ExitCode::from(code)
}
