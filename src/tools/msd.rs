//! MSD tool: subprocess invocation of the external MinaCalc-backed
//! calculator (spec §6 "MSD tool", §4.E `base_msd`).
//!
//! Grounded on the companella MSD-calculator CLI tool
//! (`other_examples/e24b02f9_…msd-calculator…main.rs.rs`): it prints one
//! JSON document to stdout, full-scan shape when invoked bare, single-rate
//! shape when invoked with `--rate N`.

use crate::domain::{Rate, Skillset, SkillsetScores};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

const SINGLE_RATE_TIMEOUT: Duration = Duration::from_secs(30);
const BATCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum MsdError {
    #[error("msd tool spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("msd tool timed out after {0:?}")]
    Timeout(Duration),
    #[error("msd tool exited with non-zero status: {0}")]
    NonZeroExit(String),
    #[error("msd tool output was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct SkillsetOutput {
    overall: f64,
    stream: f64,
    jumpstream: f64,
    handstream: f64,
    stamina: f64,
    jackspeed: f64,
    chordjack: f64,
    technical: f64,
}

impl From<SkillsetOutput> for SkillsetScores {
    fn from(s: SkillsetOutput) -> Self {
        SkillsetScores {
            stream: s.stream,
            jumpstream: s.jumpstream,
            handstream: s.handstream,
            stamina: s.stamina,
            jackspeed: s.jackspeed,
            chordjack: s.chordjack,
            technical: s.technical,
        }
        .with_overall_hint(s.overall)
    }
}

impl SkillsetScores {
    /// `SkillsetScores::overall()` is derived (max of the seven) rather than
    /// stored; the tool's own `overall` field is informational only and is
    /// not kept on the struct. Exists so `From<SkillsetOutput>` reads
    /// naturally instead of silently discarding a field.
    fn with_overall_hint(self, _overall: f64) -> Self {
        self
    }
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    rate: f32,
    scores: SkillsetOutput,
}

#[derive(Debug, Deserialize)]
struct RawMsdResult {
    rates: Vec<RateEntry>,
    dominant_skillset: String,
    difficulty_1x: f64,
}

#[derive(Debug, Deserialize)]
struct RawSingleRateMsdResult {
    rate: f32,
    scores: SkillsetOutput,
    dominant_skillset: String,
}

/// The full per-rate MSD scan for a single beatmap (spec §4.E `base_msd`
/// source, §6 MSD tool full-scan contract).
#[derive(Debug, Clone)]
pub struct MsdResult {
    pub msd_scores: BTreeMap<Rate, SkillsetScores>,
    pub dominant_skillset: Skillset,
    pub difficulty_1x: f64,
}

/// A single-rate MSD result (spec §6 `--rate` contract), used when the
/// tracker needs only the rate the player actually played at.
#[derive(Debug, Clone)]
pub struct SingleRateMsdResult {
    pub rate: Rate,
    pub scores: SkillsetScores,
    pub dominant_skillset: Skillset,
}

/// Capability trait the tracker and indexer depend on instead of the
/// concrete subprocess, so tests can substitute a fake tool (spec §9
/// capability-trait design note). Generic call sites monomorphize over this
/// trait rather than boxing it, so a plain `async fn` in the trait is
/// sufficient.
pub trait MsdTool: Send + Sync {
    fn calculate(
        &self,
        beatmap_path: &Path,
        rate: Rate,
    ) -> impl std::future::Future<Output = Result<SingleRateMsdResult, MsdError>> + Send;

    fn calculate_all_rates(
        &self,
        beatmap_path: &Path,
    ) -> impl std::future::Future<Output = Result<MsdResult, MsdError>> + Send;
}

/// Invokes an external `<tool> "path" [--rate N]` binary and parses its
/// stdout JSON (spec §6).
pub struct SubprocessMsdTool {
    executable: PathBuf,
}

impl SubprocessMsdTool {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    async fn run(&self, args: &[&str], budget: Duration) -> Result<Vec<u8>, MsdError> {
        let mut command = Command::new(&self.executable);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let wait = async {
            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(MsdError::NonZeroExit(String::from_utf8_lossy(&output.stderr).into_owned()));
            }
            Ok(output.stdout)
        };

        match timeout(budget, wait).await {
            Ok(result) => result,
            Err(_) => Err(MsdError::Timeout(budget)),
        }
    }
}

impl MsdTool for SubprocessMsdTool {
    async fn calculate(&self, beatmap_path: &Path, rate: Rate) -> Result<SingleRateMsdResult, MsdError> {
        let path_arg = beatmap_path.to_string_lossy().into_owned();
        let rate_arg = format!("{:.3}", rate.as_f64());
        let stdout = self
            .run(&[&path_arg, "--rate", &rate_arg], SINGLE_RATE_TIMEOUT)
            .await?;
        let raw: RawSingleRateMsdResult = serde_json::from_slice(&stdout)?;
        Ok(SingleRateMsdResult {
            rate: Rate::from_f64(raw.rate as f64),
            scores: raw.scores.into(),
            dominant_skillset: Skillset::parse(&raw.dominant_skillset).unwrap_or(Skillset::Stream),
        })
    }

    async fn calculate_all_rates(&self, beatmap_path: &Path) -> Result<MsdResult, MsdError> {
        let path_arg = beatmap_path.to_string_lossy().into_owned();
        let stdout = self.run(&[&path_arg], BATCH_TIMEOUT).await?;
        let raw: RawMsdResult = serde_json::from_slice(&stdout)?;

        let mut msd_scores = BTreeMap::new();
        for entry in raw.rates {
            msd_scores.insert(Rate::from_f64(entry.rate as f64), entry.scores.into());
        }

        Ok(MsdResult {
            msd_scores,
            dominant_skillset: Skillset::parse(&raw.dominant_skillset).unwrap_or(Skillset::Stream),
            difficulty_1x: raw.difficulty_1x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rate_result_parses_from_documented_shape() {
        let json = r#"{
            "beatmap_path": "x.osu",
            "minacalc_version": 515,
            "rate": 1.0,
            "scores": {"overall": 20.1, "stream": 20.1, "jumpstream": 18.0, "handstream": 15.0,
                       "stamina": 19.0, "jackspeed": 12.0, "chordjack": 14.0, "technical": 16.0},
            "dominant_skillset": "stream"
        }"#;
        let raw: RawSingleRateMsdResult = serde_json::from_str(json).unwrap();
        assert_eq!(raw.rate, 1.0);
        assert_eq!(raw.dominant_skillset, "stream");
        let scores: SkillsetScores = raw.scores.into();
        assert_eq!(scores.stream, 20.1);
    }

    #[test]
    fn batch_result_parses_multiple_rates() {
        let json = r#"{
            "beatmap_path": "x.osu",
            "minacalc_version": 515,
            "rates": [
                {"rate": 0.7, "scores": {"overall": 14.0, "stream": 14.0, "jumpstream": 12.0, "handstream": 10.0, "stamina": 13.0, "jackspeed": 9.0, "chordjack": 9.0, "technical": 11.0}},
                {"rate": 1.0, "scores": {"overall": 20.0, "stream": 20.0, "jumpstream": 18.0, "handstream": 15.0, "stamina": 19.0, "jackspeed": 12.0, "chordjack": 14.0, "technical": 16.0}}
            ],
            "dominant_skillset": "stream",
            "difficulty_1x": 20.0
        }"#;
        let raw: RawMsdResult = serde_json::from_str(json).unwrap();
        assert_eq!(raw.rates.len(), 2);
        assert_eq!(raw.difficulty_1x, 20.0);
    }
}
