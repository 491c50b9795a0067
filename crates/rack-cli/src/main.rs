//! Rack CLI - warehouse slot allocation and task lifecycle
//!
//! Usage:
//!   rack init [path]                  Write the default .rack/config.toml
//!   rack layout                       Show warehouse geometry and capacity
//!   rack replay <script> [--stats]    Replay a JSON request script

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rack_core::RackConfig;
use rack_engine::{Depot, Request, SharedDepot};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "rack")]
#[command(author, version, about = "Warehouse slot allocation and task lifecycle")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding .rack/config.toml
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init {
        /// Target directory (defaults to --root)
        path: Option<PathBuf>,
    },

    /// Show warehouse geometry and capacity
    Layout,

    /// Replay a JSON array of commands and queries against a fresh depot
    Replay {
        /// Script file
        script: PathBuf,

        /// Print final statistics and category breakdown
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(path.unwrap_or(cli.root)).await,
        Commands::Layout => cmd_layout(&cli.root).await,
        Commands::Replay { script, stats } => cmd_replay(&cli.root, script, stats).await,
    }
}

async fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing Rack in {:?}", path);

    let config_path = path.join(".rack/config.toml");
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        return Ok(());
    }

    RackConfig::write_default(&path).context("Failed to write default config")?;

    println!("Initialized Rack in {:?}", path);
    println!("Created:");
    println!("  .rack/config.toml");
    Ok(())
}

async fn cmd_layout(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let geometry = config.geometry;

    println!("Warehouse layout");
    println!("  Columns:          {}", geometry.columns);
    println!("  Heights:          {}", geometry.heights);
    println!("  Boxes per shelf:  {}", geometry.max_boxes_per_height);
    println!("  Shelves:          {}", geometry.shelf_count());
    println!("  Per column:       {}", geometry.column_capacity());
    println!("  Total capacity:   {}", geometry.capacity());
    println!();
    println!("Task estimates (minutes)");
    println!("  pick:   {}", config.tasks.pick);
    println!("  move:   {}", config.tasks.r#move);
    println!("  other:  {}", config.tasks.other);
    println!();
    println!("Default operator: {}", config.default_operator);
    Ok(())
}

async fn cmd_replay(root: &Path, script: PathBuf, show_stats: bool) -> Result<()> {
    let config = load_config(root)?;

    let content = tokio::fs::read_to_string(&script)
        .await
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let requests: Vec<Request> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse script {}", script.display()))?;

    info!("Replaying {} request(s) from {:?}", requests.len(), script);

    let depot = SharedDepot::new(Depot::new(&config));
    let mut failures = 0;

    for (index, request) in requests.into_iter().enumerate() {
        let name = request.name();
        match depot.dispatch(request).await {
            Ok(outcome) => {
                println!("[{}] {}: {}", index, name, serde_json::to_string(&outcome)?);
            }
            Err(e) => {
                failures += 1;
                warn!("Request {} ({}) failed: {}", index, name, e);
                println!(
                    "[{}] {}: {}",
                    index,
                    name,
                    serde_json::json!({ "error": e.code(), "message": e.to_string() })
                );
            }
        }
    }

    if show_stats {
        let (stats, categories) = depot
            .read(|d| (d.compute_stats(), d.category_breakdown()))
            .await;

        println!();
        println!("Statistics");
        println!("{}", serde_json::to_string_pretty(&stats)?);
        println!();
        println!("Categories");
        for share in categories {
            println!(
                "  {:<12} {:>4} ({}%)",
                share.category.to_string(),
                share.count,
                share.percentage
            );
        }
    }

    if failures > 0 {
        println!();
        println!("{} request(s) failed", failures);
    }
    Ok(())
}

fn load_config(root: &Path) -> Result<RackConfig> {
    RackConfig::load_or_default(root)
        .with_context(|| format!("Failed to load config from {}", root.display()))
}
