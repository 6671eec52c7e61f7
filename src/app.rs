//! Application root: wires the capability objects (clock, memory reader,
//! stores, tool subprocesses) that the rest of the core depends on only
//! through narrow traits (spec §9 "the application root wires them").
//!
//! Modeled on the teacher's own bootstrapper (`App::new` constructing a
//! `DbManager` + `InputManager` up front, then handing off to a run loop)
//! but without a render loop: this root's "UI" is out of scope (spec §1),
//! so `run_until` just keeps the tracker alive until shutdown.

use crate::clock::{system_clock, SharedClock};
use crate::config::SettingsFile;
use crate::process::{attach, MemoryReader, StubMemorySource};
use crate::store::maps::MapsStore;
use crate::store::sessions::SessionsStore;
use crate::tools::analytics::{channel as analytics_channel, AnalyticsSink};
use crate::tools::msd::SubprocessMsdTool;
use crate::tracker::SessionTracker;
use std::path::PathBuf;
use std::sync::Arc;
use sysinfo::System;

pub struct AppRoot {
    pub sessions_store: Arc<SessionsStore>,
    pub maps_store: Arc<MapsStore>,
    pub clock: SharedClock,
    pub settings: SettingsFile,
    pub analytics: AnalyticsSink,
    tracker: Option<SessionTracker>,
}

pub struct AppPaths {
    pub data_dir: PathBuf,
    pub songs_dir: PathBuf,
    pub msd_tool_executable: PathBuf,
}

impl AppRoot {
    pub async fn bootstrap(paths: AppPaths) -> Result<Self, Box<dyn std::error::Error>> {
        let settings = SettingsFile::load(&paths.data_dir.join("settings.json"))?;

        let sessions_store = Arc::new(SessionsStore::open(&paths.data_dir.join("sessions.db")).await?);
        let maps_store = Arc::new(MapsStore::open(&paths.data_dir.join("maps.db")).await?);

        let (analytics, drain_rx) = analytics_channel(settings.send_analytics);
        if settings.send_analytics {
            tokio::spawn(crate::tools::analytics::run_drain_task(
                drain_rx,
                "https://telemetry.example.invalid/events".to_string(),
            ));
        }

        let clock = system_clock();

        let songs_folder = Self::resolve_songs_folder(&paths.songs_dir);
        let reader = Arc::new(MemoryReader::new(StubMemorySource));
        let msd_tool = Arc::new(SubprocessMsdTool::new(paths.msd_tool_executable));

        let tracker = SessionTracker::spawn(
            reader,
            songs_folder,
            Arc::clone(&sessions_store),
            msd_tool,
            Arc::clone(&clock),
        );

        Ok(Self {
            sessions_store,
            maps_store,
            clock,
            settings,
            analytics,
            tracker: Some(tracker),
        })
    }

    /// Falls back to the configured default songs folder when no running
    /// game process can be found (spec §4.A: attachment is best-effort).
    fn resolve_songs_folder(configured_default: &std::path::Path) -> PathBuf {
        let mut system = System::new();
        match attach(&mut system) {
            Ok(attachment) => attachment.songs_folder,
            Err(_) => configured_default.to_path_buf(),
        }
    }

    pub async fn run_until(mut self, shutdown_signal: impl std::future::Future<Output = ()>) {
        shutdown_signal.await;
        if let Some(tracker) = self.tracker.take() {
            tracker.stop();
        }
    }
}
