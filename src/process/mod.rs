//! Component A: Process Observer.
//!
//! Locates the running game process, reads its memory for the currently
//! loaded beatmap/play state, and serializes every read through one
//! process-wide lock (spec §4.A, §5). Modeled the way rvsrg centralizes
//! shared mutable state behind a capability object (`database::DbManager`
//! owns its `Arc<Mutex<DbState>>`) rather than a module-level static (§9).

mod attach;
mod mods;
mod reader;
pub mod source;
mod status;

pub use attach::{attach, Attachment, AttachmentError};
pub use mods::{rate_for_mods, ActiveMods};
pub use reader::{GeneralSnapshot, HitError, MemoryReader, PlayerSnapshot, RawMemorySource, ReadError, ResultsSnapshot};
pub use source::StubMemorySource;
pub use status::GameStatus;

use std::path::PathBuf;

/// Resolves a beatmap path from the two relative strings the game exposes.
/// Returns `None` if either component is empty (spec §4.A.4).
pub fn resolve_beatmap_path(songs_folder: &std::path::Path, folder: &str, osu_file: &str) -> Option<PathBuf> {
    if folder.is_empty() || osu_file.is_empty() {
        return None;
    }
    Some(songs_folder.join(folder).join(osu_file))
}
