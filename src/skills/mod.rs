//! Component D: Skill-Trend Analyzer (spec §4.D).

use crate::domain::{Play, Skillset};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SkillsTrendResult {
    pub overall_skill_level: f64,
    pub current_skill_levels: HashMap<Skillset, f64>,
    pub total_plays: usize,
    pub analysis_window: AnalysisWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisWindow {
    AllHistory,
    LastNPlays(usize),
}

impl SkillsTrendResult {
    pub fn level_for(&self, skillset: Skillset) -> f64 {
        self.current_skill_levels.get(&skillset).copied().unwrap_or(0.0)
    }

    /// The `k` skillset names by ascending `current_skill_levels`, omitting
    /// skillsets with zero plays (spec §4.D).
    pub fn weakest_skillsets(&self, k: usize) -> Vec<Skillset> {
        self.ranked_skillsets(k, true)
    }

    /// The `k` skillset names by descending `current_skill_levels`, omitting
    /// skillsets with zero plays (spec §4.D).
    pub fn strongest_skillsets(&self, k: usize) -> Vec<Skillset> {
        self.ranked_skillsets(k, false)
    }

    fn ranked_skillsets(&self, k: usize, ascending: bool) -> Vec<Skillset> {
        let mut entries: Vec<(Skillset, f64)> = self
            .current_skill_levels
            .iter()
            .map(|(s, v)| (*s, *v))
            .collect();
        entries.sort_by(|a, b| {
            if ascending {
                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
            } else {
                b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
            }
        });
        entries.into_iter().take(k).map(|(s, _)| s).collect()
    }
}

/// Computes the `SkillsTrendResult` from a rolling window of plays
/// (spec §4.D). `current_skill_levels[s]` is a weighted central tendency
/// (accuracy-weighted mean of `peak_msd`) over plays whose
/// `dominant_skillset == s`; `overall_skill_level` is the same tendency
/// across all plays regardless of skillset. Each play counts into at most
/// one skillset bucket — the one the MSD tool reported.
pub fn analyze(plays: &[Play], window: AnalysisWindow) -> SkillsTrendResult {
    let windowed: Vec<&Play> = match window {
        AnalysisWindow::AllHistory => plays.iter().collect(),
        AnalysisWindow::LastNPlays(n) => plays.iter().rev().take(n).collect(),
    };

    let mut current_skill_levels = HashMap::new();
    for skillset in Skillset::ALL {
        let bucket: Vec<&&Play> = windowed
            .iter()
            .filter(|p| p.dominant_skillset == skillset.as_str())
            .collect();
        if !bucket.is_empty() {
            current_skill_levels.insert(skillset, weighted_mean(bucket.into_iter().copied()));
        }
    }

    let overall_skill_level = if windowed.is_empty() {
        0.0
    } else {
        weighted_mean(windowed.iter().copied())
    };

    SkillsTrendResult {
        overall_skill_level,
        current_skill_levels,
        total_plays: windowed.len(),
        analysis_window: window,
    }
}

fn weighted_mean<'a>(plays: impl Iterator<Item = &'a Play>) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for play in plays {
        let weight = (play.accuracy / 100.0).max(0.0);
        weighted_sum += play.peak_msd * weight;
        weight_sum += weight;
    }
    if weight_sum <= 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn play(skillset: &str, msd: f64, accuracy: f64) -> Play {
        let now = Utc::now();
        Play {
            beatmap_path: "m.osu".into(),
            accuracy,
            session_time: now,
            recorded_at: now,
            peak_msd: msd,
            dominant_skillset: skillset.into(),
        }
    }

    #[test]
    fn overall_is_nonnegative_and_implies_some_skillset_is_nonzero() {
        let plays = vec![play("stream", 20.0, 95.0), play("jackspeed", 18.0, 90.0)];
        let result = analyze(&plays, AnalysisWindow::AllHistory);
        assert!(result.overall_skill_level >= 0.0);
        if result.overall_skill_level > 0.0 {
            assert!(result.current_skill_levels.values().any(|&v| v > 0.0));
        }
    }

    #[test]
    fn analyzer_is_deterministic_across_repeated_calls() {
        let plays = vec![play("stream", 20.0, 95.0), play("stream", 22.0, 80.0)];
        let first = analyze(&plays, AnalysisWindow::AllHistory);
        let second = analyze(&plays, AnalysisWindow::AllHistory);
        assert_eq!(first.overall_skill_level, second.overall_skill_level);
        assert_eq!(first.level_for(Skillset::Stream), second.level_for(Skillset::Stream));
    }

    #[test]
    fn lower_accuracy_plays_contribute_less_weight() {
        let plays = vec![play("stream", 10.0, 50.0), play("stream", 20.0, 100.0)];
        let result = analyze(&plays, AnalysisWindow::AllHistory);
        // Weighted mean should sit closer to the higher-accuracy (20.0) play.
        assert!(result.level_for(Skillset::Stream) > 15.0);
    }

    #[test]
    fn weakest_and_strongest_omit_zero_play_skillsets() {
        let plays = vec![play("stream", 20.0, 90.0)];
        let result = analyze(&plays, AnalysisWindow::AllHistory);
        assert_eq!(result.weakest_skillsets(7), vec![Skillset::Stream]);
        assert_eq!(result.strongest_skillsets(7), vec![Skillset::Stream]);
    }
}
