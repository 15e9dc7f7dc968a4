//! CLI entry point for movsci-site

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movsci_site::Site;

#[derive(Parser)]
#[command(name = "movsci-site")]
#[command(version)]
#[command(about = "Static site builder for the Movement Science Club blog", long_about = None)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the output directory
    #[command(alias = "b")]
    Build {
        /// Rebuild when files change
        #[arg(short, long)]
        watch: bool,
    },

    /// Build, then serve the output under the path prefix
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve without watching or live reload
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the output directory
    Clean,

    /// List collections, filters, passthroughs or items
    List {
        #[arg(default_value = "collections")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "movsci_site=debug,info"
    } else {
        "movsci_site=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| anyhow!("Cannot determine current directory: {}", e))?,
    };
    let site = Site::open(&base_dir)?;

    match cli.command {
        Commands::Build { watch } => {
            tracing::info!("Building {:?}", base_dir);
            site.build()?;

            if watch {
                let watched = site.clone();
                tokio::task::spawn_blocking(move || movsci_site::commands::build::watch(&watched))
                    .await??;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            site.build()?;
            movsci_site::server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            movsci_site::commands::list::run(&site, &r#type)?;
        }
    }

    Ok(())
}
