//! Memory reader capability: one process-wide lock serializing every read
//! (spec §4.A.3, §5).
//!
//! Modeled as an explicitly injected capability owned by the application
//! root (§9 "global singleton memory reader becomes an explicitly injected
//! capability"); the lock is a field here, never a module-level static.
//! `try_read_*` never throws out of the polling loop — every failure mode
//! collapses to `ReadError` and callers decide whether that's transient.

use super::mods::ActiveMods;
use super::status::GameStatus;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("memory reader is not attached to a running process")]
    NotAttached,
    #[error("the game is not currently exposing this struct")]
    StructUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralSnapshot {
    pub status: GameStatus,
    pub audio_time_ms: i64,
    pub active_mods: ActiveMods,
    pub beatmap_folder: String,
    pub beatmap_osu_file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub accuracy: f64,
    pub score: i64,
    pub combo: i32,
    pub hit_counts: [i32; 6],
    pub hit_errors: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsSnapshot {
    pub score: i64,
    pub max_combo: i32,
    pub active_mods: ActiveMods,
    pub hit_counts: [i32; 6],
}

/// A connected or disconnected handle to the foreign process's memory.
/// Swappable in tests: anything implementing this trait can stand in for
/// the real OS-level reader.
pub trait RawMemorySource: Send {
    fn read_general(&mut self) -> Result<GeneralSnapshot, ReadError>;
    fn read_player(&mut self) -> Result<PlayerSnapshot, ReadError>;
    fn read_results(&mut self) -> Result<ResultsSnapshot, ReadError>;
}

/// Owns the single memory-reader lock. Every `try_read_*` call acquires the
/// lock for the duration of exactly one read and releases it before
/// returning — never held across I/O or recursively (spec §4.A.3, §5).
pub struct MemoryReader<S: RawMemorySource> {
    source: Mutex<S>,
}

impl<S: RawMemorySource> MemoryReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    pub fn try_read_general(&self) -> Result<GeneralSnapshot, ReadError> {
        let mut guard = self.source.lock().unwrap_or_else(|e| e.into_inner());
        guard.read_general()
    }

    pub fn try_read_player(&self) -> Result<PlayerSnapshot, ReadError> {
        let mut guard = self.source.lock().unwrap_or_else(|e| e.into_inner());
        guard.read_player()
    }

    pub fn try_read_results(&self) -> Result<ResultsSnapshot, ReadError> {
        let mut guard = self.source.lock().unwrap_or_else(|e| e.into_inner());
        guard.read_results()
    }
}

/// The in-memory hit-error buffer, ordered signed millisecond deviations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitError {
    pub deviations_ms: Vec<i32>,
}

impl HitError {
    /// Unstable rate: stddev of deviations x 10 (glossary).
    pub fn unstable_rate(&self) -> Option<f64> {
        if self.deviations_ms.len() < 2 {
            return None;
        }
        let n = self.deviations_ms.len() as f64;
        let mean = self.deviations_ms.iter().map(|&d| d as f64).sum::<f64>() / n;
        let variance = self
            .deviations_ms
            .iter()
            .map(|&d| (d as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(variance.sqrt() * 10.0)
    }
}
