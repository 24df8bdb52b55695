//! Print a text digest of the filtered listings written by `fetch-reservations`.

use std::process::ExitCode;

use anyhow::Result;
use yeyak_cli::{EXIT_FAILURE, fatal, init_tracing};
use yeyak_core::digest::{load_compact_list, render_digest};
use yeyak_core::{ArtifactPaths, Env};

#[expect(clippy::print_stdout, reason = "the digest is the program's only output")]
fn main() -> ExitCode {
    init_tracing();

    let env = Env::load();
    let paths = ArtifactPaths::from_env(&env);

    match compose(&paths) {
        Ok(body) => {
            println!("{body}");
            ExitCode::SUCCESS
        }
        Err(err) => fatal(EXIT_FAILURE, &err),
    }
}

fn compose(paths: &ArtifactPaths) -> Result<String> {
    let v12 = load_compact_list(&paths.v12)?;
    let v123 = load_compact_list(&paths.v123)?;
    Ok(render_digest(&v12, &v123))
}
