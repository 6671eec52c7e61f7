//! `companella.log` sink.
//!
//! rvsrg installs `env_logger` once in `main` and logs through the `log`
//! facade everywhere else. The product owns a specific on-disk format
//! (§6: `"[yyyy-MM-dd HH:mm:ss.fff] [LEVEL] msg"`, rotated at 5 MiB with a
//! `.old` backup kept), so instead of `env_logger` this installs a small
//! custom `log::Log` sink that writes that exact line shape. Components
//! still log through the ordinary `log::info!`/`log::warn!` macros; no
//! caller needs to know the sink is custom.

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;

pub struct FileLogger {
    path: PathBuf,
    file: Mutex<Option<File>>,
    level: log::LevelFilter,
}

impl FileLogger {
    pub fn install(path: impl Into<PathBuf>, level: log::LevelFilter) -> std::io::Result<()> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let logger = FileLogger {
            path,
            file: Mutex::new(Some(file)),
            level,
        };
        log::set_max_level(level);
        log::set_boxed_logger(Box::new(logger))
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(())
    }

    /// Closes the current handle, renames it to `.old`, and reopens a fresh file.
    fn rotate_if_needed(&self, slot: &mut Option<File>) {
        let needs_rotation = slot
            .as_ref()
            .and_then(|f| f.metadata().ok())
            .is_some_and(|meta| meta.len() >= ROTATE_AT_BYTES);
        if !needs_rotation {
            return;
        }
        *slot = None; // drop the handle before renaming
        let _ = fs::rename(&self.path, rotated_path(&self.path));
        *slot = OpenOptions::new().create(true).append(true).open(&self.path).ok();
    }
}

fn rotated_path(path: &Path) -> PathBuf {
    let mut old = path.as_os_str().to_owned();
    old.push(".old");
    PathBuf::from(old)
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = Utc::now();
        let line = format!(
            "[{}] [{}] {}\n",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
        if let Ok(mut slot) = self.file.lock() {
            self.rotate_if_needed(&mut slot);
            if let Some(file) = slot.as_mut() {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut slot) = self.file.lock()
            && let Some(file) = slot.as_mut()
        {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_path_appends_old_suffix() {
        let p = rotated_path(Path::new("companella.log"));
        assert_eq!(p, PathBuf::from("companella.log.old"));
    }
}
