//! nogo-threes: run agents against each other.
//!
//! ## Usage
//!
//! - `nogo-threes nogo --black "name=mcts simulation=500" --white "name=random"`
//! - `nogo-threes threes --slider "name=td save=weights.bin" --episodes 10000`
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nogo_threes::config::AgentConfig;
use nogo_threes::episode::{play_nogo_game, play_threes_episode};
use nogo_threes::nogo::Side;
use nogo_threes::policy::{nogo_player, threes_placer, threes_slider};

/// nogo-threes: UCT search and TD learning for NoGo and Threes
#[derive(Parser)]
#[command(name = "nogo-threes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play NoGo games between two players
    Nogo {
        /// Black player options
        #[arg(long, default_value = "name=mcts")]
        black: String,
        /// White player options
        #[arg(long, default_value = "name=random")]
        white: String,
        #[arg(long, default_value_t = 1)]
        games: usize,
    },
    /// Play Threes episodes, training the slider if it learns
    Threes {
        /// Slider options
        #[arg(long, default_value = "name=td")]
        slider: String,
        /// Placer (environment) options
        #[arg(long, default_value = "name=random")]
        placer: String,
        #[arg(long, default_value_t = 1000)]
        episodes: usize,
        /// Episodes per statistics line
        #[arg(long, default_value_t = 100)]
        block: usize,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Nogo {
            black,
            white,
            games,
        } => run_nogo(&black, &white, games),
        Commands::Threes {
            slider,
            placer,
            episodes,
            block,
        } => run_threes(&slider, &placer, episodes, block),
    }
}

fn run_nogo(black_args: &str, white_args: &str, games: usize) -> Result<()> {
    // The seat decides the role, whatever the options say.
    let black_cfg = AgentConfig::parse(&format!("{black_args} role=black"))?;
    let white_cfg = AgentConfig::parse(&format!("{white_args} role=white"))?;
    let mut black = nogo_player(black_cfg).context("cannot build black player")?;
    let mut white = nogo_player(white_cfg).context("cannot build white player")?;

    let mut black_wins = 0;
    for game in 1..=games {
        let record = play_nogo_game(&mut *black, &mut *white)
            .with_context(|| format!("game {game} aborted"))?;
        if record.winner == Side::Black {
            black_wins += 1;
        }
        info!(game, winner = %record.winner, moves = record.moves.len(), "game over");
    }

    info!(
        black = black.name(),
        white = white.name(),
        games,
        black_wins,
        white_wins = games - black_wins,
        "match finished"
    );
    black.finish()?;
    white.finish()?;
    Ok(())
}

fn run_threes(slider_args: &str, placer_args: &str, episodes: usize, block: usize) -> Result<()> {
    let slider_cfg = AgentConfig::parse(&format!("{slider_args} role=slider"))?;
    let placer_cfg = AgentConfig::parse(&format!("{placer_args} role=placer"))?;
    let mut slider = threes_slider(slider_cfg).context("cannot build slider")?;
    let mut placer = threes_placer(placer_cfg).context("cannot build placer")?;

    let block = block.max(1);
    let (mut sum, mut best, mut max_tile) = (0i64, 0i32, 0u8);
    for episode in 1..=episodes {
        let record = play_threes_episode(&mut *slider, &mut *placer)
            .with_context(|| format!("episode {episode} aborted"))?;
        if record.trace.is_empty() {
            warn!(episode, "slider made no move");
        }
        sum += i64::from(record.score);
        best = best.max(record.score);
        max_tile = max_tile.max(record.max_tile);

        if episode % block == 0 || episode == episodes {
            let played = (episode - 1) % block + 1;
            info!(
                episode,
                mean = sum as f64 / played as f64,
                max = best,
                max_tile,
                "threes block"
            );
            (sum, best, max_tile) = (0, 0, 0);
        }
    }

    slider.finish()?;
    placer.finish()?;
    Ok(())
}
