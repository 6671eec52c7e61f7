//! Attachment: find the game process and its Songs folder (spec §4.A.1).

use std::path::{Path, PathBuf};
use sysinfo::{ProcessesToUpdate, System};
use thiserror::Error;

const GAME_EXECUTABLE_NAMES: [&str; 2] = ["osu!.exe", "osu!"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("no running process matched the game's executable name")]
    ProcessNotFound,
    #[error("found the process but could not determine its Songs folder")]
    SongsFolderUnresolvable,
}

/// A resolved, cached attachment to the running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub process_id: u32,
    pub songs_folder: PathBuf,
}

/// Scans running processes for the game executable and derives its Songs
/// folder from the working directory, caching the result on success
/// (spec §4.A.1). Cheap enough to call on a timer; callers should hold onto
/// a successful `Attachment` rather than re-resolving every poll.
pub fn attach(system: &mut System) -> Result<Attachment, AttachmentError> {
    system.refresh_processes(ProcessesToUpdate::All, true);

    let process = system
        .processes()
        .values()
        .find(|p| {
            p.name()
                .to_str()
                .map(|name| GAME_EXECUTABLE_NAMES.iter().any(|candidate| name.eq_ignore_ascii_case(candidate)))
                .unwrap_or(false)
        })
        .ok_or(AttachmentError::ProcessNotFound)?;

    let cwd = process.cwd().ok_or(AttachmentError::SongsFolderUnresolvable)?;
    let songs_folder = songs_folder_from_install_dir(cwd);

    Ok(Attachment {
        process_id: process.pid().as_u32(),
        songs_folder,
    })
}

fn songs_folder_from_install_dir(install_dir: &Path) -> PathBuf {
    install_dir.join("Songs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn songs_folder_is_joined_under_install_dir() {
        let resolved = songs_folder_from_install_dir(Path::new("/games/osu"));
        assert_eq!(resolved, PathBuf::from("/games/osu/Songs"));
    }
}
