//! reviewdb - seed a review catalog, migrate it to documents, benchmark both.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviewdb_cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the result object.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reviewdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sqlite_path = %config.sqlite_path.display(),
        store_path = %config.store.path.display(),
        "configuration loaded"
    );

    if let Err(e) = reviewdb_cli::run(config) {
        tracing::error!(error = %e, "reviewdb failed");
        return Err(e.into());
    }
    Ok(())
}
