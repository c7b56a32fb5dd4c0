//! Game registry and the background report/reap loop
//!
//! The registry lock is the linearization point for admission: `add_game`
//! checks `running` and inserts under it, and `stop` clears `running` and
//! drains under it, so no game can slip in after a stop. `stop_game` moves
//! a game from `games` to `retiring` under the same lock, so `stop` always
//! finds it in one of the two. Lock order is `games` then `retiring`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use indexmap::IndexMap;
use log::{debug, error, info, warn};

use super::instance::{GameId, GameInstance, GameSnapshot, Status};
use crate::consts::DEFAULT_REPORT_INTERVAL_MS;
use crate::error::{InstanceError, ServerError};
use crate::settings::{GameSettings, ServerSettings};
use crate::sim::Score;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Server uptime bookkeeping
#[derive(Debug, Default)]
struct Clock {
    started_at: Option<Instant>,
    /// Uptime of the last completed run
    uptime: Duration,
}

#[derive(Debug)]
struct Registry {
    games: Mutex<IndexMap<GameId, Arc<GameInstance>>>,
    /// Removed via `stop_game` but possibly still winding down
    retiring: Mutex<Vec<Arc<GameInstance>>>,
    running: AtomicBool,
    next_id: AtomicU64,
}

impl Registry {
    fn snapshot_games(&self) -> Vec<Arc<GameInstance>> {
        lock(&self.games).values().cloned().collect()
    }

    /// Log every game's score, then drop and join the ones that finished.
    fn report_and_reap(&self) {
        let games = self.snapshot_games();
        for game in &games {
            let snap = game.snapshot();
            debug!(
                "Game {} [{:?}] score ({}) after {:.1}s",
                snap.id,
                snap.status,
                snap.score,
                snap.duration.as_secs_f64()
            );
        }

        let finished: Vec<Arc<GameInstance>> = {
            let mut registry = lock(&self.games);
            games
                .iter()
                .filter(|game| game.is_stopped())
                .filter_map(|game| registry.shift_remove(&game.id()))
                .collect()
        };
        for game in finished {
            game.join();
            info!("End game {} at score ({})", game.id(), game.score());
        }

        let retired: Vec<Arc<GameInstance>> = {
            let mut retiring = lock(&self.retiring);
            let (done, pending): (Vec<_>, Vec<_>) =
                retiring.drain(..).partition(|game| game.is_stopped());
            *retiring = pending;
            done
        };
        for game in retired {
            game.join();
        }
    }
}

struct Background {
    handle: JoinHandle<()>,
    /// Dropped to wake and end the loop
    shutdown_tx: Sender<()>,
}

fn report_loop(registry: Arc<Registry>, shutdown_rx: Receiver<()>, interval: Duration) {
    loop {
        match shutdown_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => registry.report_and_reap(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Report loop exited");
}

/// Owns a set of concurrently running games
///
/// Every method takes `&self` and may be called from any thread.
pub struct GameServer {
    registry: Arc<Registry>,
    report_interval: Duration,
    /// Serializes start/stop and holds the background loop while running
    lifecycle: Mutex<(Clock, Option<Background>)>,
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_REPORT_INTERVAL_MS))
    }
}

impl GameServer {
    pub fn new(report_interval: Duration) -> Self {
        Self {
            registry: Arc::new(Registry {
                games: Mutex::new(IndexMap::new()),
                retiring: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
            report_interval,
            lifecycle: Mutex::new((Clock::default(), None)),
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(settings.report_interval())
    }

    /// Begin accepting games and start the background report loop.
    pub fn start(&self) -> Result<(), ServerError> {
        let mut lifecycle = lock(&self.lifecycle);
        if self.registry.running.load(Ordering::Acquire) {
            return Err(ServerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let registry = Arc::clone(&self.registry);
        let interval = self.report_interval;
        let handle = thread::Builder::new()
            .name("pong-supervisor".into())
            .spawn(move || report_loop(registry, shutdown_rx, interval))
            .map_err(|e| InstanceError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        lifecycle.0.started_at = Some(Instant::now());
        lifecycle.1 = Some(Background {
            handle,
            shutdown_tx,
        });
        self.registry.running.store(true, Ordering::Release);
        info!("Game server started");
        Ok(())
    }

    /// Stop every game, wait for their workers, then stop the report loop.
    /// A no-op on a server that is not running.
    pub fn stop(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        let games: Vec<Arc<GameInstance>> = {
            let mut registry = lock(&self.registry.games);
            if !self.registry.running.swap(false, Ordering::AcqRel) {
                return;
            }
            registry.drain(..).map(|(_, game)| game).collect()
        };
        let retiring: Vec<Arc<GameInstance>> = lock(&self.registry.retiring).drain(..).collect();

        for game in games.iter().chain(&retiring) {
            game.stop();
        }
        for game in games.iter().chain(&retiring) {
            game.join();
        }

        if let Some(Background {
            handle,
            shutdown_tx,
        }) = lifecycle.1.take()
        {
            drop(shutdown_tx);
            if handle.join().is_err() {
                error!("Report loop panicked");
            }
        }

        let clock = &mut lifecycle.0;
        clock.uptime = clock.started_at.take().map(|t| t.elapsed()).unwrap_or_default();
        info!(
            "Game server stopped after {:.1}s ({} games stopped)",
            clock.uptime.as_secs_f64(),
            games.len()
        );
    }

    pub fn is_running(&self) -> bool {
        self.registry.running.load(Ordering::Acquire)
    }

    /// Time since `start`, or the length of the last run once stopped
    pub fn uptime(&self) -> Duration {
        let lifecycle = lock(&self.lifecycle);
        match lifecycle.0.started_at {
            Some(started) => started.elapsed(),
            None => lifecycle.0.uptime,
        }
    }

    /// Create a game and start it on its own thread.
    pub fn add_game(&self, settings: GameSettings) -> Result<GameId, ServerError> {
        let mut games = lock(&self.registry.games);
        if !self.registry.running.load(Ordering::Acquire) {
            warn!("Rejected new game: server is not running");
            return Err(ServerError::NotRunning);
        }

        let id = GameId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let game = GameInstance::new(id, settings)?;
        game.start()?;
        info!(
            "Start game {id} ({:?}, first to {})",
            game.settings().dimensions,
            game.settings().winning_score
        );
        games.insert(id, Arc::new(game));
        Ok(id)
    }

    /// Remove a game and ask it to stop. It finishes at its next tick
    /// boundary.
    pub fn stop_game(&self, id: GameId) -> Result<(), ServerError> {
        let game = {
            let mut games = lock(&self.registry.games);
            if !self.registry.running.load(Ordering::Acquire) {
                warn!("Rejected stop of game {id}: server is not running");
                return Err(ServerError::NotRunning);
            }
            let game = games.shift_remove(&id).ok_or(ServerError::UnknownGame(id))?;
            lock(&self.registry.retiring).push(Arc::clone(&game));
            game
        };
        game.stop();
        info!("Stop game {id}");
        Ok(())
    }

    /// Ask every game to stop. Finished games are reaped by the report loop.
    pub fn stop_all_games(&self) {
        for game in self.registry.snapshot_games() {
            game.stop();
        }
    }

    pub fn game(&self, id: GameId) -> Option<Arc<GameInstance>> {
        lock(&self.registry.games).get(&id).cloned()
    }

    pub fn game_count(&self) -> usize {
        lock(&self.registry.games).len()
    }

    /// Snapshots of every registered game, in creation order
    pub fn list_games(&self) -> Vec<GameSnapshot> {
        self.registry
            .snapshot_games()
            .iter()
            .map(|game| game.snapshot())
            .collect()
    }

    pub fn playing_games(&self) -> Vec<GameSnapshot> {
        self.list_games()
            .into_iter()
            .filter(|snap| snap.status == Status::Playing)
            .collect()
    }

    pub fn game_score(&self, id: GameId) -> Option<Score> {
        self.game(id).map(|game| game.score())
    }

    /// Scores of the games still playing
    pub fn all_game_scores(&self) -> IndexMap<GameId, Score> {
        self.playing_games()
            .into_iter()
            .map(|snap| (snap.id, snap.score))
            .collect()
    }
}

impl Drop for GameServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_game(winning_score: u32) -> GameSettings {
        GameSettings::new(Duration::ZERO, winning_score).with_seed(99)
    }

    fn slow_game() -> GameSettings {
        GameSettings::new(Duration::from_millis(5), 1_000).with_seed(7)
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let server = GameServer::new(Duration::from_millis(10));
        server.start().unwrap();
        assert_eq!(server.start(), Err(ServerError::AlreadyRunning));
        server.stop();
        assert!(!server.is_running());
    }

    #[test]
    fn test_add_game_before_start_is_rejected() {
        let server = GameServer::default();
        assert_eq!(server.add_game(quick_game(1)), Err(ServerError::NotRunning));
        assert_eq!(server.game_count(), 0);
    }

    #[test]
    fn test_invalid_game_settings_rejected() {
        let server = GameServer::new(Duration::from_millis(10));
        server.start().unwrap();
        let err = server.add_game(quick_game(0)).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert_eq!(server.game_count(), 0);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let server = GameServer::new(Duration::from_secs(60));
        server.start().unwrap();
        let a = server.add_game(slow_game()).unwrap();
        let b = server.add_game(slow_game()).unwrap();
        assert!(a < b);

        let ids: Vec<GameId> = server.list_games().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, b]);
        server.stop();
    }

    #[test]
    fn test_stop_game_removes_it() {
        let server = GameServer::new(Duration::from_secs(60));
        server.start().unwrap();
        let a = server.add_game(slow_game()).unwrap();
        let b = server.add_game(slow_game()).unwrap();

        server.stop_game(a).unwrap();
        assert!(server.game(a).is_none());
        assert_eq!(server.stop_game(a), Err(ServerError::UnknownGame(a)));
        assert!(server.game(b).is_some());
        server.stop();
    }

    #[test]
    fn test_stop_racing_stop_game_joins_every_worker() {
        for _ in 0..25 {
            let server = Arc::new(GameServer::new(Duration::from_secs(60)));
            server.start().unwrap();
            let id = server.add_game(slow_game()).unwrap();
            let game = server.game(id).unwrap();

            let remover = {
                let server = Arc::clone(&server);
                thread::spawn(move || server.stop_game(id))
            };
            server.stop();

            // Whichever call won, stop() has joined the worker
            assert_eq!(game.status(), Status::Stopped);
            assert!(lock(&server.registry.retiring).is_empty());

            let removed = remover.join().unwrap();
            assert!(matches!(removed, Ok(()) | Err(ServerError::NotRunning)));
        }
    }

    #[test]
    fn test_stop_does_not_wait_out_update_delays() {
        let server = GameServer::new(Duration::from_secs(60));
        server.start().unwrap();
        let slow = GameSettings::new(Duration::from_secs(60), 3).with_seed(1);
        let games: Vec<_> = (0..3)
            .map(|_| server.game(server.add_game(slow.clone()).unwrap()).unwrap())
            .collect();
        for game in &games {
            while game.status() == Status::Initiated {
                thread::yield_now();
            }
        }

        let began = Instant::now();
        server.stop();
        assert!(began.elapsed() < Duration::from_secs(5));
        assert!(games.iter().all(|game| game.is_stopped()));
    }

    #[test]
    fn test_finished_games_are_reaped() {
        let server = GameServer::new(Duration::from_millis(5));
        server.start().unwrap();
        let id = server.add_game(quick_game(1)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(30);
        while server.game_count() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(server.game_count(), 0);
        assert!(server.game_score(id).is_none());
        server.stop();
    }

    #[test]
    fn test_uptime_freezes_after_stop() {
        let server = GameServer::new(Duration::from_millis(10));
        assert_eq!(server.uptime(), Duration::ZERO);
        server.start().unwrap();
        thread::sleep(Duration::from_millis(5));
        server.stop();
        let uptime = server.uptime();
        assert!(uptime >= Duration::from_millis(5));
        thread::sleep(Duration::from_millis(5));
        assert_eq!(server.uptime(), uptime);
    }

    #[test]
    fn test_restart_after_stop() {
        let server = GameServer::new(Duration::from_millis(10));
        server.start().unwrap();
        server.stop();
        server.start().unwrap();
        assert!(server.add_game(slow_game()).is_ok());
        server.stop();
        assert_eq!(server.game_count(), 0);
    }

    #[test]
    fn test_all_game_scores_lists_playing_only() {
        let server = GameServer::new(Duration::from_secs(60));
        server.start().unwrap();
        let a = server.add_game(slow_game()).unwrap();
        let b = server.add_game(slow_game()).unwrap();
        server.game(b).unwrap().stop();
        server.game(b).unwrap().join();

        let deadline = Instant::now() + Duration::from_secs(10);
        while server.game(a).unwrap().status() != Status::Playing && Instant::now() < deadline {
            thread::yield_now();
        }
        let scores = server.all_game_scores();
        assert!(scores.contains_key(&a));
        assert!(!scores.contains_key(&b));
        server.stop();
    }
}
