//! Componentree bootstrap binary.
//!
//! Boots the components submitted for the configured base and reports the
//! result. Exits non-zero when boot fails.

use clap::Parser;
use componentree_cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app = componentree_cli::boot(cli).await;

    tracing::info!(
        base = %app.config().base,
        components = app.registry().len(),
        "component tree ready"
    );
}
