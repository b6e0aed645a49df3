//! Spincanvas CLI - Main entry point
//!
//! Inspects models with the same loader and post-load passes the browser
//! canvas uses, and runs the full canvas lifecycle headlessly.

mod config;
mod inspect;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "spincanvas")]
#[command(about = "Inspect glTF models and simulate the spincanvas render loop")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "spincanvas.toml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a model, run the wireframe and centering passes and summarize it
    Inspect {
        /// Path to a .glb or .gltf file
        asset: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mount a headless canvas, deliver the model and step the render loop
    Simulate {
        /// Path to a .glb or .gltf file
        asset: PathBuf,

        /// Number of ticks to run
        #[arg(short, long, default_value_t = 60)]
        frames: u32,

        /// Seconds between ticks
        #[arg(short, long, default_value_t = 1.0 / 60.0)]
        delta: f64,

        /// Window width in pixels
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Window height in pixels
        #[arg(long, default_value_t = 720)]
        height: u32,

        /// Resize the window to WIDTHxHEIGHT halfway through the run
        #[arg(long, value_parser = simulate::parse_size)]
        resize: Option<(u32, u32)>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to the config path
    InitConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Spincanvas v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Inspect { asset, json } => {
            let config = config::load_config(&args.config)?;
            let report = inspect::inspect(&asset, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::Simulate {
            asset,
            frames,
            delta,
            width,
            height,
            resize,
            json,
        } => {
            let config = config::load_config(&args.config)?;
            let options = simulate::SimulateOptions {
                frames,
                delta,
                width,
                height,
                resize,
            };
            let report = simulate::simulate(&asset, config, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::InitConfig => {
            config::save_default_config(&args.config)?;
            println!("Wrote default configuration to {}", args.config.display());
        }
    }

    Ok(())
}
