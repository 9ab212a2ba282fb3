mod app;
mod config;
mod domain;
mod infra;
mod ui;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dioxus::prelude::*;
use tokio::runtime::Runtime;
use tracing::info;

#[cfg(feature = "desktop")]
use dioxus_desktop::{tao::window::WindowBuilder, Config as DesktopConfig};

use crate::infra::{aggregator::Aggregator, server};
use crate::util::version::{version_label, APP_NAME};

#[derive(Parser)]
#[command(name = "trade_dashboard", version, about = "Export and commodity trade dashboard")]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the desktop dashboard (default)
    Desktop,
    /// Serve the aggregated dashboard as JSON
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: String,
    },
    /// Aggregate once and print the view as JSON
    Snapshot {
        /// Include per-endpoint diagnostics
        #[arg(long)]
        debug: bool,
    },
}

fn main() -> Result<()> {
    util::logging::init();
    let cli = Cli::parse();
    if let Some(path) = cli.config {
        config::set_path_override(path);
    }
    info!("[main] {APP_NAME} {}", version_label());

    match cli.command.unwrap_or(Command::Desktop) {
        Command::Desktop => {
            launch_desktop();
            Ok(())
        }
        Command::Serve { addr } => {
            let runtime = runtime()?;
            let aggregator = aggregator()?;
            server::serve(&addr, aggregator, runtime.handle().clone())
        }
        Command::Snapshot { debug } => {
            let runtime = runtime()?;
            let aggregator = aggregator()?;
            let view = runtime.block_on(aggregator.get_dashboard_view(debug));
            let json = serde_json::to_string_pretty(&view).context("failed to render view")?;
            println!("{json}");
            Ok(())
        }
    }
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn aggregator() -> Result<Aggregator> {
    Aggregator::new(config::load()).context("failed to set up the dashboard aggregator")
}

fn launch_desktop() {
    // Wayland explicit-sync crashes on some drivers; fall back to GL unless the caller opts in.
    if std::env::var("WAYLAND_DISPLAY").is_ok() && std::env::var("WGPU_BACKEND").is_err() {
        std::env::set_var("WGPU_BACKEND", "gl");
    }
    if std::env::var("WAYLAND_DISPLAY").is_ok()
        && std::env::var("WEBKIT_DISABLE_DMABUF_RENDERER").is_err()
    {
        std::env::set_var("WEBKIT_DISABLE_DMABUF_RENDERER", "1");
    }

    let builder = LaunchBuilder::new();

    #[cfg(feature = "desktop")]
    let builder = {
        let config = desktop! {
            DesktopConfig::new().with_window(
                WindowBuilder::new().with_title(APP_NAME)
            )
        };
        builder.with_cfg(config)
    };

    builder.launch(app::App);
}
