//! Component G: Session Planner (spec §4.G).

pub mod curve;

use crate::domain::Skillset;
use crate::store::criteria::{OrderBy, SearchCriteria};
use crate::store::maps::MapsStore;
use crate::tools::beatmap_assets::BeatmapAssetResolver;
use crate::tools::collection::{self, CollectionWriter};
use curve::{MsdCurveConfig, Phase};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEGMENT_DURATION_SECS: f64 = 300.0;
const DEFAULT_MAP_DURATION_SECS: f64 = 120.0;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("failed to index copy for {path}: {source}")]
    Indexing { path: String, source: std::io::Error },
    #[error("collection write failed: {0}")]
    Collection(#[from] collection::CollectionError),
}

#[derive(Debug, Clone)]
pub struct SessionPlanItem {
    pub index: usize,
    pub beatmap_path: String,
    pub target_msd: f64,
    pub actual_msd: f64,
    pub skillset: Option<Skillset>,
    pub phase: Phase,
    pub estimated_duration_secs: f64,
    /// Set once the indexed physical copy has been created.
    pub indexed_path: Option<PathBuf>,
}

/// Curve-based (preferred) vs. phase-based (legacy, fixed shape) generation
/// (spec §4.G "Two modes"). Only curve mode is implemented here; phase mode
/// is carried as a value so `SessionPlan` still models the spec's full
/// closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    Curve,
    Phase,
}

impl Default for PlanMode {
    fn default() -> Self {
        PlanMode::Curve
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    pub mode: PlanMode,
    /// A single skillset the whole plan targets; curve-generated plans vary
    /// skillset per segment, so this is `None` for them (spec §4.G: only
    /// meaningful for a fixed-shape, phase-based plan).
    pub focus_skillset: Option<Skillset>,
    pub items: Vec<SessionPlanItem>,
    pub warmup_difficulty: f64,
    pub peak_difficulty: f64,
    pub cooldown_difficulty: f64,
    pub collection_name: Option<String>,
    pub generated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// `(status, percentage ∈ [0,100])` (spec §4.G "Progress reporting").
pub type ProgressCallback<'a> = dyn FnMut(&str, u8) + 'a;

/// Stage 1 (spec §4.G steps 1-4): samples the curve and selects matching
/// maps, without creating any on-disk artifacts yet.
pub async fn select_maps(
    curve: &MsdCurveConfig,
    maps: &MapsStore,
    mut on_progress: impl FnMut(&str, u8),
) -> Result<SessionPlan, PlannerError> {
    on_progress("starting session plan", 0);

    if curve.control_points.is_empty() {
        on_progress("empty curve, nothing to plan", 100);
        return Ok(SessionPlan::default());
    }

    let total_seconds = curve.total_session_minutes * 60.0;
    let segment_count = ((total_seconds / SEGMENT_DURATION_SECS) as usize).max(1);
    let maps_per_segment = (SEGMENT_DURATION_SECS / DEFAULT_MAP_DURATION_SECS).ceil() as usize;

    let mut items = Vec::new();
    let mut used_paths: Vec<String> = Vec::new();
    let mut elapsed_secs = 0.0;

    'segments: for segment in 0..segment_count {
        let time_percent = segment as f64 / segment_count as f64 * 100.0;
        let target_msd = curve.target_msd(time_percent);
        let skillset = curve.skillset_at(time_percent);
        let phase = curve.phase_at(time_percent);

        let criteria = SearchCriteria {
            min_msd: Some(target_msd - 0.5),
            max_msd: Some(target_msd + 0.5),
            skillset,
            order_by: Some(OrderBy::Random),
            exclude_paths: used_paths.clone(),
            limit: Some(maps_per_segment as i64 * 2),
            ..Default::default()
        };

        let candidates = maps.search(&criteria).await?;
        let mut taken_for_segment = 0;

        for map in candidates {
            if taken_for_segment >= maps_per_segment || elapsed_secs >= total_seconds {
                break;
            }
            if !Path::new(&map.beatmap_path).exists() {
                continue;
            }

            let actual_msd = map
                .msd_at(crate::domain::Rate::NORMAL, skillset.unwrap_or(map.dominant_skillset))
                .unwrap_or(map.overall_msd);

            used_paths.push(map.beatmap_path.clone());
            items.push(SessionPlanItem {
                index: items.len() + 1,
                beatmap_path: map.beatmap_path,
                target_msd,
                actual_msd,
                skillset,
                phase,
                estimated_duration_secs: DEFAULT_MAP_DURATION_SECS,
                indexed_path: None,
            });
            elapsed_secs += DEFAULT_MAP_DURATION_SECS;
            taken_for_segment += 1;

            if elapsed_secs >= total_seconds {
                break 'segments;
            }
        }
    }

    enforce_phase_ordering(&mut items);
    for (new_index, item) in items.iter_mut().enumerate() {
        item.index = new_index + 1;
    }

    let (warmup_difficulty, peak_difficulty, cooldown_difficulty) = summarize_difficulty(&items);

    on_progress("maps selected", 70);
    Ok(SessionPlan {
        mode: PlanMode::Curve,
        focus_skillset: None,
        items,
        warmup_difficulty,
        peak_difficulty,
        cooldown_difficulty,
        collection_name: None,
        generated_at: None,
    })
}

/// Sorts each contiguous same-phase run in place: ascending `actual_msd` for
/// `RampUp`, descending for `Cooldown`, left as-is (constant) for `Warmup`
/// (spec §3 `SessionPlan` invariant).
fn enforce_phase_ordering(items: &mut [SessionPlanItem]) {
    let mut start = 0;
    while start < items.len() {
        let phase = items[start].phase;
        let mut end = start + 1;
        while end < items.len() && items[end].phase == phase {
            end += 1;
        }
        match phase {
            Phase::RampUp => items[start..end]
                .sort_by(|a, b| a.actual_msd.partial_cmp(&b.actual_msd).unwrap_or(std::cmp::Ordering::Equal)),
            Phase::Cooldown => items[start..end]
                .sort_by(|a, b| b.actual_msd.partial_cmp(&a.actual_msd).unwrap_or(std::cmp::Ordering::Equal)),
            Phase::Warmup => {}
        }
        start = end;
    }
}

/// `(warmup_difficulty, peak_difficulty, cooldown_difficulty)`: the mean
/// `actual_msd` of each phase's items (0.0 if the plan has none in that
/// phase), and the plan's highest `actual_msd` as the peak.
fn summarize_difficulty(items: &[SessionPlanItem]) -> (f64, f64, f64) {
    let phase_mean = |phase: Phase| {
        let (sum, count) = items
            .iter()
            .filter(|item| item.phase == phase)
            .fold((0.0, 0usize), |(sum, count), item| (sum + item.actual_msd, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    };
    let peak = items.iter().map(|item| item.actual_msd).fold(0.0, f64::max);
    (phase_mean(Phase::Warmup), peak, phase_mean(Phase::Cooldown))
}

/// Stage 2 (spec §4.G "Indexed copy creation"): physically copies each
/// item's `.osu` file and its sibling assets into a new directory encoding
/// the plan index. A failed copy drops that item; the survivors are
/// reindexed to stay gapless (spec §8 "`index` field is exactly `1..|items|`
/// with no gaps").
pub fn create_indexed_copies(
    plan: &mut SessionPlan,
    destination_root: &Path,
    resolver: &dyn BeatmapAssetResolver,
    mut on_progress: impl FnMut(&str, u8),
) -> Result<(), std::io::Error> {
    on_progress("indexing started", 75);

    let mut survivors = Vec::with_capacity(plan.items.len());
    for item in plan.items.drain(..) {
        match copy_one_item(&item, destination_root, resolver) {
            Ok(indexed_path) => {
                let mut item = item;
                item.indexed_path = Some(indexed_path);
                survivors.push(item);
            }
            Err(e) => {
                log::info!("dropping plan item {}: indexing failed: {e}", item.beatmap_path);
            }
        }
    }

    for (new_index, item) in survivors.iter_mut().enumerate() {
        item.index = new_index + 1;
    }
    plan.items = survivors;

    Ok(())
}

fn copy_one_item(
    item: &SessionPlanItem,
    destination_root: &Path,
    resolver: &dyn BeatmapAssetResolver,
) -> Result<PathBuf, std::io::Error> {
    let source = Path::new(&item.beatmap_path);
    let folder_name = format!("{:03} - {}", item.index, source.file_stem().and_then(|s| s.to_str()).unwrap_or("map"));
    let destination_folder = destination_root.join(folder_name);
    std::fs::create_dir_all(&destination_folder)?;

    let destination_osu = destination_folder.join(source.file_name().unwrap_or_default());
    std::fs::copy(source, &destination_osu)?;

    if let Ok(assets) = resolver.resolve(source) {
        if let Some(audio) = assets.audio_file.filter(|p| p.exists()) {
            if let Some(name) = audio.file_name() {
                std::fs::copy(&audio, destination_folder.join(name))?;
            }
        }
        if let Some(background) = assets.background_file.filter(|p| p.exists()) {
            if let Some(name) = background.file_name() {
                std::fs::copy(&background, destination_folder.join(name))?;
            }
        }
    }

    Ok(destination_osu)
}

/// Stage 3 (spec §4.G "Collection write"): writes a named collection of the
/// indexed copies' beatmap hashes. Aborts with an error if at least one
/// survived the indexing pass but the write fails; leaves the copies on disk
/// regardless.
pub fn write_collection(
    plan: &mut SessionPlan,
    generated_at: chrono::DateTime<chrono::Utc>,
    writer: &dyn CollectionWriter,
    mut on_progress: impl FnMut(&str, u8),
) -> Result<(), PlannerError> {
    on_progress("collection write started", 90);

    if plan.items.is_empty() {
        on_progress("done", 100);
        return Ok(());
    }

    let hashes: Vec<String> = plan
        .items
        .iter()
        .filter_map(|item| item.indexed_path.as_deref())
        .filter_map(|path| collection::hash_beatmap_file(path).ok())
        .collect();

    let name = collection::collection_name(generated_at);
    writer.append_collection(&name, &hashes)?;
    plan.collection_name = Some(name);
    plan.generated_at = Some(generated_at);
    on_progress("done", 100);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve::CurveControlPoint;

    fn empty_curve() -> MsdCurveConfig {
        MsdCurveConfig {
            control_points: Vec::new(),
            base_msd: 20.0,
            min_msd_percent: 0.0,
            max_msd_percent: 0.0,
            total_session_minutes: 30.0,
        }
    }

    #[tokio::test]
    async fn empty_curve_yields_zero_items() {
        let maps = MapsStore::open(Path::new(":memory:")).await.unwrap();
        let mut events = Vec::new();
        let plan = select_maps(&empty_curve(), &maps, |status, pct| events.push((status.to_string(), pct)))
            .await
            .unwrap();
        assert!(plan.items.is_empty());
        assert_eq!(events.last().unwrap().1, 100);
    }

    #[test]
    fn reindexing_after_partial_failure_stays_gapless() {
        let mut plan = SessionPlan {
            items: vec![
                SessionPlanItem {
                    index: 1,
                    beatmap_path: "a.osu".into(),
                    target_msd: 20.0,
                    actual_msd: 20.0,
                    skillset: None,
                    phase: Phase::RampUp,
                    estimated_duration_secs: 120.0,
                    indexed_path: None,
                },
                SessionPlanItem {
                    index: 2,
                    beatmap_path: "b.osu".into(),
                    target_msd: 20.0,
                    actual_msd: 20.0,
                    skillset: None,
                    phase: Phase::RampUp,
                    estimated_duration_secs: 120.0,
                    indexed_path: None,
                },
                SessionPlanItem {
                    index: 3,
                    beatmap_path: "c.osu".into(),
                    target_msd: 20.0,
                    actual_msd: 20.0,
                    skillset: None,
                    phase: Phase::RampUp,
                    estimated_duration_secs: 120.0,
                    indexed_path: None,
                },
            ],
            ..Default::default()
        };

        // Simulate "b.osu" failing to copy by dropping it directly and
        // reindexing, mirroring what `create_indexed_copies` does on error.
        plan.items.retain(|item| item.beatmap_path != "b.osu");
        for (new_index, item) in plan.items.iter_mut().enumerate() {
            item.index = new_index + 1;
        }

        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].index, 1);
        assert_eq!(plan.items[1].index, 2);
    }

    fn item(path: &str, actual_msd: f64, phase: Phase) -> SessionPlanItem {
        SessionPlanItem {
            index: 0,
            beatmap_path: path.into(),
            target_msd: actual_msd,
            actual_msd,
            skillset: None,
            phase,
            estimated_duration_secs: 120.0,
            indexed_path: None,
        }
    }

    #[test]
    fn phase_ordering_sorts_rampup_ascending_and_cooldown_descending() {
        let mut items = vec![
            item("warm-a", 5.0, Phase::Warmup),
            item("warm-b", 6.0, Phase::Warmup),
            item("ramp-a", 20.0, Phase::RampUp),
            item("ramp-b", 10.0, Phase::RampUp),
            item("ramp-c", 15.0, Phase::RampUp),
            item("cool-a", 8.0, Phase::Cooldown),
            item("cool-b", 12.0, Phase::Cooldown),
        ];
        enforce_phase_ordering(&mut items);

        assert_eq!(items[0].beatmap_path, "warm-a");
        assert_eq!(items[1].beatmap_path, "warm-b");

        assert_eq!(items[2].beatmap_path, "ramp-b");
        assert_eq!(items[3].beatmap_path, "ramp-c");
        assert_eq!(items[4].beatmap_path, "ramp-a");

        assert_eq!(items[5].beatmap_path, "cool-b");
        assert_eq!(items[6].beatmap_path, "cool-a");
    }

    #[test]
    fn difficulty_summary_averages_per_phase_and_peaks_overall() {
        let items = vec![
            item("warm-a", 10.0, Phase::Warmup),
            item("warm-b", 12.0, Phase::Warmup),
            item("ramp-a", 25.0, Phase::RampUp),
            item("cool-a", 14.0, Phase::Cooldown),
            item("cool-b", 16.0, Phase::Cooldown),
        ];
        let (warmup, peak, cooldown) = summarize_difficulty(&items);
        assert!((warmup - 11.0).abs() < 1e-9);
        assert!((peak - 25.0).abs() < 1e-9);
        assert!((cooldown - 15.0).abs() < 1e-9);
    }
}
