//! TetrECS server (default binary).
//!
//! Runs one game and exposes it over the TCP adapter. The game starts on the controller's
//! `start` command, or immediately with `--autostart`. Exits after game over.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use tetrecs::adapter::{run_server, ServerConfig};
use tetrecs::cli::parse_run_args;
use tetrecs::core::{GameEvent, MemoryHighScores};
use tetrecs::engine::{spawn_game, EngineConfig, GameHandle};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let run = parse_run_args(&args)?;

    let engine_config = EngineConfig::from_env();
    println!(
        "[Game] {}x{} grid, seed {}, {} lives",
        engine_config.width, engine_config.height, engine_config.seed, engine_config.starting_lives
    );

    let game = spawn_game(engine_config, Arc::new(MemoryHighScores::new()))?;
    tokio::spawn(report(game.clone()));

    let mut server = tokio::spawn(run_server(ServerConfig::from_env(), game.clone(), None));

    if run.autostart {
        let delay_ms = game.start().await?;
        println!("[Game] started, {} ms per turn", delay_ms);
    }

    let score = tokio::select! {
        score = game.wait_for_game_over() => score?,
        joined = &mut server => {
            joined??;
            if !run.autostart {
                println!("[Game] adapter disabled and --autostart not given; nothing to play");
                return Ok(());
            }
            game.wait_for_game_over().await?
        }
        _ = tokio::signal::ctrl_c() => {
            let score = game.abandon().await.unwrap_or_default();
            println!("[Game] interrupted");
            score
        }
    };

    println!("[Game] final score {}", score);
    server.abort();
    Ok(())
}

/// Print the events a player watching the console cares about.
async fn report(game: GameHandle) {
    let mut events = game.subscribe();
    loop {
        match events.recv().await {
            Ok(GameEvent::LifeLost { lives }) => {
                println!("[Game] life lost, {} remaining", lives);
            }
            Ok(GameEvent::LinesCleared { lines, blocks, .. }) => {
                println!("[Game] cleared {} lines ({} blocks)", lines, blocks);
            }
            Ok(GameEvent::GameOver { .. }) | Err(RecvError::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}
