//! Component C: Session Tracker.
//!
//! Owns one dedicated OS thread that polls the Process Observer every
//! 150 ms, drives the FSM in `fsm`, and persists completed sessions through
//! the Persistence Store. Modeled on rvsrg's `DbManager`/`LogicLoop`: a
//! `thread::spawn` loop with its own small tokio runtime for the async
//! calls (store writes, MSD tool invocation) it needs to make, and a
//! cancellation flag checked between sleeps instead of a hard `join` kill
//! (spec §5 "Cancellation").

mod fsm;

pub use fsm::{Poll, TrackerEvent, TrackerFsm};

use crate::clock::SharedClock;
use crate::domain::{Play, Session};
use crate::process::{rate_for_mods, resolve_beatmap_path, GameStatus, MemoryReader, RawMemorySource};
use crate::store::sessions::SessionsStore;
use crate::tools::msd::MsdTool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(150);
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

pub struct SessionTracker {
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

struct InProgressSession {
    start_time: chrono::DateTime<chrono::Utc>,
    plays: Vec<Play>,
}

impl SessionTracker {
    /// Spawns the polling thread. Nothing is tracked until `start_session`
    /// is called; the thread idles (one cheap `try_recv`-equivalent sleep
    /// loop) until then.
    pub fn spawn<S, M>(
        reader: Arc<MemoryReader<S>>,
        songs_folder: PathBuf,
        store: Arc<SessionsStore>,
        msd_tool: Arc<M>,
        clock: SharedClock,
    ) -> Self
    where
        S: RawMemorySource + 'static,
        M: MsdTool + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let cancel_clone = Arc::clone(&cancel);
        let running_clone = Arc::clone(&running);

        let handle = thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tracker tokio runtime");
            rt.block_on(Self::run(
                reader,
                songs_folder,
                store,
                msd_tool,
                clock,
                cancel_clone,
            ));
            running_clone.store(false, Ordering::SeqCst);
        });

        Self {
            cancel,
            running,
            handle: Some(handle),
        }
    }

    /// Cancels the polling thread via the cancellation token checked between
    /// sleeps, then joins for up to 1 s (spec §5).
    pub fn stop(mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let deadline = std::time::Instant::now() + JOIN_TIMEOUT;
            while self.running.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            let _ = handle.join();
        }
    }

    async fn run<S, M>(
        reader: Arc<MemoryReader<S>>,
        songs_folder: PathBuf,
        store: Arc<SessionsStore>,
        msd_tool: Arc<M>,
        clock: SharedClock,
        cancel: Arc<AtomicBool>,
    ) where
        S: RawMemorySource,
        M: MsdTool,
    {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();
        let mut session = InProgressSession {
            start_time: clock.now(),
            plays: Vec::new(),
        };

        loop {
            if cancel.load(Ordering::SeqCst) {
                break;
            }

            match reader.try_read_general() {
                Ok(general) => {
                    let poll = Poll {
                        status: general.status,
                        audio_time_ms: general.audio_time_ms,
                        accuracy: reader
                            .try_read_player()
                            .map(|p| p.accuracy)
                            .unwrap_or(0.0),
                    };

                    let folder = general.beatmap_folder.clone();
                    let osu_file = general.beatmap_osu_file.clone();
                    let songs_folder_ref = &songs_folder;
                    let active_mods = general.active_mods;

                    let events = fsm.poll(poll, || {
                        let path = resolve_beatmap_path(songs_folder_ref, &folder, &osu_file)
                            .map(|p| p.to_string_lossy().to_string())
                            .unwrap_or_default();
                        (path, rate_for_mods(active_mods))
                    });

                    for event in events {
                        if let TrackerEvent::PlayCompleted {
                            beatmap_path,
                            rate,
                            accuracy,
                            pause_count: _,
                        } = event
                        {
                            let beatmap_path_buf = std::path::PathBuf::from(&beatmap_path);
                            let (peak_msd, dominant_skillset) =
                                match msd_tool.calculate(&beatmap_path_buf, crate::domain::Rate::from_f64(rate)).await {
                                    Ok(result) => (
                                        result.scores.value_for(result.dominant_skillset),
                                        result.dominant_skillset.as_str().to_string(),
                                    ),
                                    Err(e) => {
                                        log::info!("MSD tool failed for {beatmap_path}: {e}");
                                        (0.0, Play::UNKNOWN_SKILLSET.to_string())
                                    }
                                };

                            let now = clock.now();
                            session.plays.push(Play {
                                beatmap_path,
                                accuracy,
                                session_time: now,
                                recorded_at: now,
                                peak_msd,
                                dominant_skillset,
                            });
                        }
                    }
                }
                Err(e) => {
                    log::info!("memory read failed, skipping poll: {e}");
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let end_time = clock.now();
        let session_to_persist = Session {
            start_time: session.start_time,
            end_time,
            plays: session.plays,
        };
        if let Err(e) = store.persist_session(&session_to_persist).await {
            log::info!("failed to persist session: {e}");
        }
    }
}

/// Used by components that only need to know the tracker's view of the
/// current game status, without the full memory-reader contract — e.g. a UI
/// status line. Kept separate from `GameStatus` re-exports to avoid a
/// spurious import cycle between `tracker` and `process`.
pub fn is_actionable_status(status: GameStatus) -> bool {
    matches!(status, GameStatus::Playing | GameStatus::ResultsScreen)
}
