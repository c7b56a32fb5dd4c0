//! One game running its tick loop on a dedicated thread
//!
//! The worker owns the [`Board`] exclusively (moved in via `thread::spawn`).
//! The only state shared with other threads is the published snapshot
//! (status, score, timing) behind a single mutex, plus the stop flag.
//!
//! ```text
//! Reader thread(s)                 Game worker
//!     |                                |
//!     |                                | status -> Playing
//!     |                                | loop:
//!     |                                |   stop requested? -> exit
//!     |                                |   board.tick()
//!     |<--score()/status() copies------|   publish score
//!     |                                |   winning score? -> exit
//!     |--stop()--> flag + wake ------->|   wait(update_delay) or wake
//!     |                                | status -> Stopped
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InstanceError};
use crate::settings::GameSettings;
use crate::sim::{Board, Score};

/// Identity of a game within a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a game. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Created, worker not running yet
    Initiated,
    /// Worker is ticking
    Playing,
    /// Worker has exited (or never will run); terminal
    Stopped,
}

/// Point-in-time copy of a game's published state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub score: Score,
    pub duration: Duration,
    pub status: Status,
}

/// State written by the worker and copied out by readers
#[derive(Debug)]
struct Published {
    status: Status,
    score: Score,
    started: Option<Instant>,
    /// Frozen run time once stopped
    elapsed: Duration,
}

impl Published {
    fn advance(&mut self, next: Status) -> bool {
        if next <= self.status {
            return false;
        }
        match next {
            Status::Playing => self.started = Some(Instant::now()),
            Status::Stopped => {
                self.elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
            }
            Status::Initiated => {}
        }
        self.status = next;
        true
    }

    fn duration(&self) -> Duration {
        match (self.status, self.started) {
            (Status::Playing, Some(started)) => started.elapsed(),
            _ => self.elapsed,
        }
    }
}

#[derive(Debug)]
struct Shared {
    published: Mutex<Published>,
    stop_requested: AtomicBool,
}

impl Shared {
    /// The published state is plain data, so a panic while holding the
    /// lock cannot leave it half-written; recover from poisoning.
    fn lock(&self) -> MutexGuard<'_, Published> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Publishes `Stopped` when the run loop exits, including by panic, so
/// the supervisor can always reap the game.
struct StopOnExit<'a>(&'a Shared);

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        self.0.lock().advance(Status::Stopped);
    }
}

/// Everything the worker thread takes ownership of
struct Runner {
    id: GameId,
    board: Board,
    shared: Arc<Shared>,
    winning_score: u32,
    update_delay: Duration,
    /// Receives a message from `stop()` to cut the inter-tick wait short
    wake: Receiver<()>,
}

impl Runner {
    fn run(mut self) {
        if !self.shared.lock().advance(Status::Playing) {
            debug!("Game {} stopped before it started", self.id);
            return;
        }
        let _stop = StopOnExit(&self.shared);
        info!("Game {} started", self.id);

        loop {
            if self.shared.stop_requested.load(Ordering::Acquire) {
                break;
            }

            let scored = self.board.tick();
            let score = self.board.score();
            self.shared.lock().score = score;

            if let Some(side) = scored {
                debug!(
                    "Game {} point to {side:?} ({} now), score ({score})",
                    self.id,
                    score.get(side)
                );
            }
            if score.reached(self.winning_score) {
                break;
            }

            match self.wake.recv_timeout(self.update_delay) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let score = self.board.score();
        match score.leader() {
            Some(side) if score.reached(self.winning_score) => info!(
                "Game {} won by {side:?} at score ({score}) after {} ticks",
                self.id,
                self.board.ticks()
            ),
            _ => info!(
                "Game {} stopped at score ({score}) after {} ticks",
                self.id,
                self.board.ticks()
            ),
        }
    }
}

/// Handle to one game
///
/// All accessors are safe to call from any thread and return copies.
#[derive(Debug)]
pub struct GameInstance {
    id: GameId,
    settings: GameSettings,
    shared: Arc<Shared>,
    runner: Mutex<Option<Runner>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    wake_tx: Sender<()>,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner").field("id", &self.id).finish_non_exhaustive()
    }
}

impl GameInstance {
    /// Build the game's board. Fails fast on a bad configuration; nothing
    /// runs until [`start`](Self::start) or [`run`](Self::run).
    pub fn new(id: GameId, settings: GameSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        let board = Board::seeded(settings.board_config(), seed)?;

        let shared = Arc::new(Shared {
            published: Mutex::new(Published {
                status: Status::Initiated,
                score: board.score(),
                started: None,
                elapsed: Duration::ZERO,
            }),
            stop_requested: AtomicBool::new(false),
        });
        let (wake_tx, wake) = crossbeam_channel::bounded(1);
        let runner = Runner {
            id,
            board,
            shared: Arc::clone(&shared),
            winning_score: settings.winning_score,
            update_delay: settings.update_delay(),
            wake,
        };

        debug!("Game {id} created (seed {seed}, {:?})", settings.dimensions);
        Ok(Self {
            id,
            settings,
            shared,
            runner: Mutex::new(Some(runner)),
            worker: Mutex::new(None),
            wake_tx,
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    fn take_runner(&self) -> Result<Runner, InstanceError> {
        self.runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(InstanceError::AlreadyStarted)
    }

    /// Run the game loop on the calling thread until it finishes or is
    /// stopped.
    pub fn run(&self) -> Result<(), InstanceError> {
        self.take_runner()?.run();
        Ok(())
    }

    /// Run the game loop on a new thread named `pong-game-<id>`.
    pub fn start(&self) -> Result<(), InstanceError> {
        let runner = self.take_runner()?;
        let handle = thread::Builder::new()
            .name(format!("pong-game-{}", self.id))
            .spawn(move || runner.run())
            .map_err(|e| {
                // The runner went down with the closure; nothing will ever tick
                self.shared.lock().advance(Status::Stopped);
                InstanceError::ThreadSpawnFailed {
                    reason: e.to_string(),
                }
            })?;
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Ask the game to stop. A tick in progress completes; a pending
    /// inter-tick wait is cut short. A game that was never started stops
    /// immediately.
    pub fn stop(&self) {
        self.shared.stop_requested.store(true, Ordering::Release);
        // Full means a wake-up is already pending
        let _ = self.wake_tx.try_send(());
        let mut published = self.shared.lock();
        if published.status == Status::Initiated {
            published.advance(Status::Stopped);
        }
    }

    /// Wait for the worker thread, if any, to exit.
    pub fn join(&self) {
        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Game {} worker panicked", self.id);
            }
        }
    }

    pub fn status(&self) -> Status {
        self.shared.lock().status
    }

    pub fn score(&self) -> Score {
        self.shared.lock().score
    }

    /// Time spent playing; frozen once stopped
    pub fn duration(&self) -> Duration {
        self.shared.lock().duration()
    }

    /// Status, score and duration read under one lock
    pub fn snapshot(&self) -> GameSnapshot {
        let published = self.shared.lock();
        GameSnapshot {
            id: self.id,
            score: published.score,
            duration: published.duration(),
            status: published.status,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.status() == Status::Stopped
    }
}

impl Drop for GameInstance {
    fn drop(&mut self) {
        self.stop();
    }
}
