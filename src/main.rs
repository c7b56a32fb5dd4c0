//! nd-pong entry point
//!
//! Loads server settings (first argument, default `nd-pong.json`), starts
//! the server with the configured games and reports on them until they all
//! finish or the run time is up.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use nd_pong::{GameServer, ServerSettings};

const DEFAULT_SETTINGS_PATH: &str = "nd-pong.json";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let settings = match ServerSettings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Invalid settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "nd-pong starting: {} {:?} games to {} points",
        settings.initial_games,
        settings.game.dimensions,
        settings.game.winning_score
    );

    let server = GameServer::from_settings(&settings);
    if let Err(e) = server.start() {
        log::error!("Failed to start server: {e}");
        return ExitCode::FAILURE;
    }

    for _ in 0..settings.initial_games {
        if let Err(e) = server.add_game(settings.game.clone()) {
            log::error!("Failed to add game: {e}");
            server.stop();
            return ExitCode::FAILURE;
        }
    }

    let deadline = settings.run_for().map(|run_for| Instant::now() + run_for);
    loop {
        thread::sleep(settings.report_interval());

        let games = server.list_games();
        if games.is_empty() {
            log::info!("All games finished");
            break;
        }
        for game in &games {
            log::info!(
                "Game {} [{:?}] {} ({:.1}s)",
                game.id,
                game.status,
                game.score,
                game.duration.as_secs_f64()
            );
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            log::info!("Run time elapsed with {} games left", games.len());
            break;
        }
    }

    server.stop();
    log::info!("nd-pong stopped after {:.1}s", server.uptime().as_secs_f64());
    ExitCode::SUCCESS
}
