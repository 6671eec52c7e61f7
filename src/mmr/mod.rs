//! Component E: Map-MMR Calculator (spec §4.E).

use crate::domain::{IndexedMap, Play, Rate, Skillset};
use crate::skills::SkillsTrendResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMmrResult {
    pub base_msd: f64,
    pub player_skill: f64,
    pub performance_adjustment: f64,
    pub mmr: f64,
    pub relative_difficulty: f64,
    pub confidence: f64,
}

/// `find_maps_in_optimal_range` candidates: the map and its computed result.
#[derive(Debug, Clone)]
pub struct RankedMap {
    pub map: IndexedMap,
    pub result: MapMmrResult,
}

/// Computes `MapMmrResult` for `map` against player trends `trend`, given
/// the player's prior plays on this specific map (spec §4.E steps 1-7).
pub fn compute(map: &IndexedMap, trend: &SkillsTrendResult, target_skillset: Option<Skillset>, plays_on_map: &[Play]) -> MapMmrResult {
    let skillset = target_skillset.unwrap_or(map.dominant_skillset);

    if map.msd_scores.is_empty() {
        return MapMmrResult {
            base_msd: map.overall_msd,
            player_skill: trend.level_for(skillset),
            performance_adjustment: 0.0,
            mmr: map.overall_msd,
            relative_difficulty: 1.0,
            confidence: 0.0,
        };
    }

    let base_msd = map.msd_at(Rate::NORMAL, skillset).unwrap_or(map.overall_msd);

    let trend_level = trend.level_for(skillset);
    let player_skill = if trend_level > 0.0 {
        trend_level
    } else {
        trend.overall_skill_level
    };

    let performance_adjustment = compute_performance_adjustment(plays_on_map);

    let mmr = 0.6 * base_msd + 0.4 * (base_msd + performance_adjustment);

    let relative_difficulty = if player_skill > 0.0 { mmr / player_skill } else { 1.0 };

    let has_msd = map.has_valid_msd_mapping() && !map.msd_scores.is_empty();
    let play_count = plays_on_map.len();
    let history_bonus = if trend.total_plays >= 10 {
        0.3
    } else if trend.total_plays >= 5 {
        0.15
    } else {
        0.0
    };
    let confidence = (0.4 * has_msd as u8 as f64 + (0.1 * play_count as f64).min(0.3) + history_bonus).min(1.0);

    MapMmrResult {
        base_msd,
        player_skill,
        performance_adjustment,
        mmr,
        relative_difficulty,
        confidence,
    }
}

fn compute_performance_adjustment(plays_on_map: &[Play]) -> f64 {
    if plays_on_map.is_empty() {
        return 0.0;
    }
    let avg_acc = plays_on_map.iter().map(|p| p.accuracy).sum::<f64>() / plays_on_map.len() as f64;
    if avg_acc > 95.0 {
        -0.5 * (avg_acc - 95.0) / 5.0
    } else if avg_acc < 90.0 {
        0.5 * (90.0 - avg_acc) / 10.0
    } else {
        0.0
    }
}

/// `find_maps_in_optimal_range(target_ratio, tolerance, skillset?, limit)`
/// (spec §4.E). The caller supplies already-queried candidate maps (the
/// Maps-store MSD-range query is the caller's job, so this stays a pure
/// function over in-memory data and is directly testable).
pub fn find_maps_in_optimal_range(
    candidates: Vec<IndexedMap>,
    trend: &SkillsTrendResult,
    target_ratio: f64,
    tolerance: f64,
    skillset: Option<Skillset>,
    limit: usize,
    plays_by_path: impl Fn(&str) -> Vec<Play>,
) -> Vec<RankedMap> {
    let mut ranked: Vec<RankedMap> = candidates
        .into_iter()
        .map(|map| {
            let plays = plays_by_path(&map.beatmap_path);
            let result = compute(&map, trend, skillset, &plays);
            RankedMap { map, result }
        })
        .filter(|ranked| (ranked.result.relative_difficulty - target_ratio).abs() <= tolerance)
        .collect();

    ranked.sort_by(|a, b| {
        let da = (a.result.relative_difficulty - target_ratio).abs();
        let db = (b.result.relative_difficulty - target_ratio).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SkillsetScores;
    use crate::skills::AnalysisWindow;
    use std::collections::BTreeMap;

    fn map_with_stream_msd(path: &str, msd: f64) -> IndexedMap {
        let mut msd_scores = BTreeMap::new();
        msd_scores.insert(
            Rate::NORMAL,
            SkillsetScores {
                stream: msd,
                ..Default::default()
            },
        );
        IndexedMap {
            beatmap_path: path.to_string(),
            key_count: 4,
            overall_msd: msd,
            dominant_skillset: Skillset::Stream,
            msd_scores,
            display_name: path.to_string(),
            play_count: 0,
            best_accuracy: None,
        }
    }

    fn trend_with_stream_level(level: f64, total_plays: usize) -> SkillsTrendResult {
        let mut current_skill_levels = std::collections::HashMap::new();
        current_skill_levels.insert(Skillset::Stream, level);
        SkillsTrendResult {
            overall_skill_level: level,
            current_skill_levels,
            total_plays,
            analysis_window: AnalysisWindow::AllHistory,
        }
    }

    #[test]
    fn scenario_3_mmr_computation() {
        let map = map_with_stream_msd("m.osu", 24.0);
        let trend = trend_with_stream_level(22.0, 12);
        let result = compute(&map, &trend, None, &[]);

        assert_eq!(result.base_msd, 24.0);
        assert_eq!(result.performance_adjustment, 0.0);
        assert_eq!(result.mmr, 24.0);
        assert!((result.relative_difficulty - 24.0 / 22.0).abs() < 1e-9);
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn mmr_over_player_skill_equals_relative_difficulty() {
        let map = map_with_stream_msd("m.osu", 18.0);
        let trend = trend_with_stream_level(20.0, 3);
        let result = compute(&map, &trend, None, &[]);
        assert!((result.mmr / result.player_skill - result.relative_difficulty).abs() < 1e-9);
    }

    #[test]
    fn empty_msd_scores_yields_overall_msd_and_unit_ratio() {
        let map = IndexedMap {
            beatmap_path: "m.osu".into(),
            key_count: 4,
            overall_msd: 15.0,
            dominant_skillset: Skillset::Stream,
            msd_scores: BTreeMap::new(),
            display_name: "m.osu".into(),
            play_count: 0,
            best_accuracy: None,
        };
        let trend = trend_with_stream_level(20.0, 3);
        let result = compute(&map, &trend, None, &[]);
        assert_eq!(result.mmr, 15.0);
        assert_eq!(result.relative_difficulty, 1.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn optimal_range_restricts_to_tolerance_window() {
        let trend = trend_with_stream_level(20.0, 3);
        let candidates = vec![
            map_with_stream_msd("low.osu", 20.0),
            map_with_stream_msd("mid.osu", 23.0),
            map_with_stream_msd("high.osu", 30.0),
        ];
        let ranked = find_maps_in_optimal_range(candidates, &trend, 1.15, 0.1, Some(Skillset::Stream), 10, |_| Vec::new());
        for r in &ranked {
            assert!((r.result.relative_difficulty - 1.15).abs() <= 0.1);
        }
        assert!(ranked.iter().any(|r| r.map.beatmap_path == "mid.osu"));
        assert!(!ranked.iter().any(|r| r.map.beatmap_path == "low.osu"));
        assert!(!ranked.iter().any(|r| r.map.beatmap_path == "high.osu"));
    }
}
