//! The seam where a platform-specific foreign-process memory reader plugs
//! in. Reading another process's memory is OS-API work (e.g. Windows
//! `ReadProcessMemory` + signature scanning) that none of the reference
//! material in this crate's corpus demonstrates; [`RawMemorySource`] is the
//! capability boundary so the rest of the tracker never depends on that
//! platform code directly (spec §9 capability-trait design note).
//!
//! [`StubMemorySource`] is the conservative default until that backend is
//! wired in: every read reports [`ReadError::NotAttached`], which the
//! tracker already treats as "nothing to do this poll".

use super::reader::{GeneralSnapshot, PlayerSnapshot, ReadError, ResultsSnapshot};
use super::RawMemorySource;

#[derive(Debug, Default)]
pub struct StubMemorySource;

impl RawMemorySource for StubMemorySource {
    fn read_general(&mut self) -> Result<GeneralSnapshot, ReadError> {
        Err(ReadError::NotAttached)
    }

    fn read_player(&mut self) -> Result<PlayerSnapshot, ReadError> {
        Err(ReadError::NotAttached)
    }

    fn read_results(&mut self) -> Result<ResultsSnapshot, ReadError> {
        Err(ReadError::NotAttached)
    }
}
