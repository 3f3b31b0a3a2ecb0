use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod bot;
mod commands;
mod config;
mod cookies;
mod directory;
mod error;
mod identity;
mod matrix;
mod message;
mod releases;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the YAML configuration file
    #[arg(short, long)]
    config: String,

    /// Directory holding the Matrix session and the cookie ledger
    #[arg(short, long)]
    data: PathBuf,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting cookiebot {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration from the YAML file, overridden by the environment
    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let bot = match Bot::new(config, &args.data).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {:#}", e);
            return;
        }
    };

    if let Err(e) = bot.start().await {
        error!("Bot stopped: {:#}", e);
    }
}
