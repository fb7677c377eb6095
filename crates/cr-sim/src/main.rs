//! Crimson Reels batch simulator
//!
//! Usage:
//!   cr-sim --sessions 200 --spins 1000 --seed 7
//!   cr-sim --strategy bargain --buy-relics --json
//!   cr-sim --config balance.yaml

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cr_sim::{SimConfig, Strategy};
use cr_slot::SlotConfig;

#[derive(Parser, Debug)]
#[command(name = "cr-sim", version, about = "Headless Crimson Reels autoplay")]
struct Args {
    /// Independent sessions to play
    #[arg(short = 'n', long, default_value_t = 100)]
    sessions: usize,

    /// Resolved spins per session
    #[arg(short, long, default_value_t = 500)]
    spins: u32,

    /// Seed of the first session; session i uses seed + i
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// What to do with a win
    #[arg(long, value_enum, default_value_t = Strategy::Collect)]
    strategy: Strategy,

    /// Spend at the Blood Altar
    #[arg(long)]
    buy_relics: bool,

    /// Machine config (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let slot = match &args.config {
        Some(path) => SlotConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SlotConfig::default(),
    };

    let config = SimConfig {
        sessions: args.sessions,
        spins: args.spins,
        seed: args.seed,
        strategy: args.strategy,
        buy_relics: args.buy_relics,
        slot,
    };

    let report = cr_sim::run(&config).context("Simulation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
