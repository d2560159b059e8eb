//! Process bootstrap for Componentree applications.
//!
//! Parses the command line, installs the logging subscriber and boots every
//! component submitted for the selected base. Application binaries link their
//! component crates and hand control to [`run`]:
//!
//! ```rust,ignore
//! // Force-link the crate whose components submit inventory registrations
//! extern crate my_services;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = componentree_cli::boot(componentree_cli::Cli::parse()).await;
//! }
//! ```

use clap::Parser;
use componentree::{Componentree, ComponentreeConfig, InventoryLoader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "componentree")]
#[command(about = "Boot a Componentree component tree")]
#[command(version)]
pub struct Cli {
    /// Discovery key for registered components
    #[arg(short, long, value_name = "BASE")]
    pub base: Option<String>,

    /// Verbose boot diagnostics
    #[arg(short, long)]
    pub debug: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the component manifest as JSON after boot
    #[arg(long)]
    pub manifest: bool,
}

impl Cli {
    /// Loaded configuration with command line flags applied on top
    pub fn resolve_config(&self) -> componentree::Result<ComponentreeConfig> {
        let mut config = match &self.config {
            Some(path) => ComponentreeConfig::load_from(path)?,
            None => ComponentreeConfig::load()?,
        };
        if let Some(base) = &self.base {
            config.base = base.clone();
        }
        if self.debug {
            config.debug = true;
        }
        Ok(config)
    }
}

/// Install the `fmt` subscriber; `RUST_LOG` takes precedence over the flag
pub fn setup_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    // A subscriber may already be installed by the embedding application.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Boot with [`InventoryLoader`], returning the tree or the boot error
pub async fn run(cli: &Cli) -> anyhow::Result<Componentree> {
    let config = cli.resolve_config()?;
    setup_tracing(config.debug);

    let app = Componentree::builder()
        .config(config)
        .loader(InventoryLoader::new())
        .boot()
        .await?;

    if cli.manifest {
        println!("{}", app.manifest().to_json()?);
    }
    Ok(app)
}

/// Like [`run`], but exits the process with status 1 on failure
pub async fn boot(cli: Cli) -> Componentree {
    match run(&cli).await {
        Ok(app) => app,
        Err(err) => {
            eprintln!("componentree: {err:#}");
            std::process::exit(1);
        }
    }
}
