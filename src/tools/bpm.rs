//! BPM tool: subprocess invocation of the external beat-tracking analyzer
//! (spec §6 "BPM tool", §5 "BPM tool 300 s").
//!
//! Same subprocess-JSON shape as [`super::msd`], grounded on the same
//! companella-tool contract style: one JSON document on stdout.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

const BPM_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum BpmError {
    #[error("bpm tool spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("bpm tool timed out after {0:?}")]
    Timeout(Duration),
    #[error("bpm tool exited with non-zero status: {0}")]
    NonZeroExit(String),
    #[error("bpm tool output was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatMark {
    pub time_ms: u64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BpmResult {
    pub beats: Vec<BeatMark>,
    pub average_bpm: Option<f64>,
}

pub trait BpmTool: Send + Sync {
    fn analyze(&self, audio_path: &Path) -> impl std::future::Future<Output = Result<BpmResult, BpmError>> + Send;
}

pub struct SubprocessBpmTool {
    executable: PathBuf,
}

impl SubprocessBpmTool {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }
}

impl BpmTool for SubprocessBpmTool {
    async fn analyze(&self, audio_path: &Path) -> Result<BpmResult, BpmError> {
        let path_arg = audio_path.to_string_lossy().into_owned();
        let mut child = Command::new(&self.executable)
            .arg(&path_arg)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let wait = async {
            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(BpmError::NonZeroExit(String::from_utf8_lossy(&output.stderr).into_owned()));
            }
            Ok(output.stdout)
        };

        let stdout = match timeout(BPM_TIMEOUT, wait).await {
            Ok(result) => result?,
            Err(_) => return Err(BpmError::Timeout(BPM_TIMEOUT)),
        };

        Ok(serde_json::from_slice(&stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bpm_result_parses_beats_and_optional_average() {
        let json = r#"{"beats": [{"time_ms": 0, "bpm": 174.0}, {"time_ms": 345, "bpm": 174.2}], "average_bpm": 174.1}"#;
        let result: BpmResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.beats.len(), 2);
        assert_eq!(result.average_bpm, Some(174.1));
    }

    #[test]
    fn bpm_result_tolerates_missing_average() {
        let json = r#"{"beats": []}"#;
        let result: BpmResult = serde_json::from_str(json).unwrap();
        assert!(result.average_bpm.is_none());
    }
}
