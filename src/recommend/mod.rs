//! Component F: Recommendation Service (spec §4.F).

use crate::domain::{IndexedMap, Play, Skillset};
use crate::mmr::{self, RankedMap};
use crate::skills::SkillsTrendResult;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecommendationFocus {
    Skillset(Skillset),
    Consistency,
    Push,
    DeficitFixing,
}

#[derive(Debug, Clone)]
pub struct RecommendedMap {
    pub map: IndexedMap,
    pub result: mmr::MapMmrResult,
    pub reasoning: String,
}

#[derive(Debug, Clone)]
pub struct RecommendationBatch {
    pub focus: RecommendationFocus,
    pub items: Vec<RecommendedMap>,
}

/// Produces a `RecommendationBatch` for `focus` (spec §4.F). `candidates` is
/// the Maps-store pool the caller already narrowed with an MSD-range query;
/// `plays_by_path` supplies per-map play history for the MMR calculator's
/// performance-adjustment term (spec §4.E).
pub fn recommend(
    focus: RecommendationFocus,
    candidates: Vec<IndexedMap>,
    trend: &SkillsTrendResult,
    limit: usize,
    plays_by_path: impl Fn(&str) -> Vec<Play> + Copy,
    rng: &mut impl rand::Rng,
) -> RecommendationBatch {
    let items = match focus {
        RecommendationFocus::Skillset(skillset) => {
            let ranked = mmr::find_maps_in_optimal_range(candidates, trend, 1.0, 0.2, Some(skillset), limit, plays_by_path);
            ranked
                .into_iter()
                .map(|r| skillset_reasoning(r, skillset))
                .collect()
        }
        RecommendationFocus::Consistency => consistency_batch(candidates, trend, limit, plays_by_path),
        RecommendationFocus::Push => push_batch(candidates, trend, limit, plays_by_path),
        RecommendationFocus::DeficitFixing => deficit_fixing_batch(candidates, trend, limit, plays_by_path, rng),
    };

    RecommendationBatch { focus, items }
}

fn skillset_reasoning(ranked: RankedMap, skillset: Skillset) -> RecommendedMap {
    let reasoning = format!(
        "Matches your {} level — overall MSD {:.1}",
        skillset.as_str(),
        ranked.map.overall_msd
    );
    RecommendedMap {
        map: ranked.map,
        result: ranked.result,
        reasoning,
    }
}

fn consistency_batch(
    candidates: Vec<IndexedMap>,
    trend: &SkillsTrendResult,
    limit: usize,
    plays_by_path: impl Fn(&str) -> Vec<Play> + Copy,
) -> Vec<RecommendedMap> {
    let ranked = mmr::find_maps_in_optimal_range(candidates, trend, 0.9, 0.15, None, usize::MAX, plays_by_path);

    let (mut played, mut unplayed): (Vec<RankedMap>, Vec<RankedMap>) =
        ranked.into_iter().partition(|r| r.map.play_count > 0 && r.map.best_accuracy.is_some_and(|a| a < 98.0));

    played.sort_by(|a, b| {
        b.map
            .best_accuracy
            .unwrap_or(0.0)
            .partial_cmp(&a.map.best_accuracy.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unplayed.sort_by(|a, b| {
        (a.result.relative_difficulty - 0.9)
            .abs()
            .partial_cmp(&(b.result.relative_difficulty - 0.9).abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let half = limit / 2;
    played.truncate(limit - half);
    unplayed.truncate(half);

    played
        .into_iter()
        .map(|r| consistency_reasoning(r))
        .chain(unplayed.into_iter().map(consistency_reasoning))
        .collect()
}

fn consistency_reasoning(ranked: RankedMap) -> RecommendedMap {
    let best = ranked.map.best_accuracy.unwrap_or(0.0);
    let reasoning = format!("Builds consistency — your best accuracy here is {best:.1}%");
    RecommendedMap {
        map: ranked.map,
        result: ranked.result,
        reasoning,
    }
}

fn push_batch(
    candidates: Vec<IndexedMap>,
    trend: &SkillsTrendResult,
    limit: usize,
    plays_by_path: impl Fn(&str) -> Vec<Play> + Copy,
) -> Vec<RecommendedMap> {
    let ranked = mmr::find_maps_in_optimal_range(candidates, trend, 1.15, 0.1, None, usize::MAX, plays_by_path);

    let (mut unplayed, mut played): (Vec<RankedMap>, Vec<RankedMap>) =
        ranked.into_iter().partition(|r| r.map.play_count == 0);

    let closeness = |r: &RankedMap| (r.result.relative_difficulty - 1.15f64).abs();
    unplayed.sort_by(|a, b| closeness(a).partial_cmp(&closeness(b)).unwrap_or(std::cmp::Ordering::Equal));
    played.sort_by(|a, b| closeness(a).partial_cmp(&closeness(b)).unwrap_or(std::cmp::Ordering::Equal));

    unplayed
        .into_iter()
        .chain(played)
        .take(limit)
        .map(|r| RecommendedMap {
            reasoning: format!("Pushes past your current level ({:.0}% of target)", r.result.relative_difficulty * 100.0),
            map: r.map,
            result: r.result,
        })
        .collect()
}

fn deficit_fixing_batch(
    candidates: Vec<IndexedMap>,
    trend: &SkillsTrendResult,
    limit: usize,
    plays_by_path: impl Fn(&str) -> Vec<Play> + Copy,
    rng: &mut impl rand::Rng,
) -> Vec<RecommendedMap> {
    let weakest = trend.weakest_skillsets(3);
    let per_skillset_limit = (limit / weakest.len().max(1)).max(1);

    let mut items = Vec::new();
    for skillset in weakest {
        let has_data = trend.level_for(skillset) > 0.0;
        let target_ratio = if has_data { 1.1 } else { 0.9 };
        let ranked = mmr::find_maps_in_optimal_range(
            candidates.clone(),
            trend,
            target_ratio,
            0.15,
            Some(skillset),
            per_skillset_limit,
            plays_by_path,
        );
        for r in ranked {
            let reasoning = format!("Targets your weak {} skillset", skillset.as_str());
            items.push(RecommendedMap {
                map: r.map,
                result: r.result,
                reasoning,
            });
        }
    }

    items.shuffle(rng);
    items.truncate(limit);
    items
}
