//! # stockmeta: Adobe Stock metadata from the command line
//!
//! This binary is a thin entrypoint. All logic lives in the
//! `stockmeta_cli` library crate.

use anyhow::Result;
use clap::Parser;
use stockmeta_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup logging on stderr so stdout stays clean for CSV output.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("stockmeta_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Call the library's run function and handle the final result
    if let Err(e) = run(cli).await {
        eprintln!("[stockmeta error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
