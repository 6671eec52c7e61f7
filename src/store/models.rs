//! Row shapes mirroring the SQLite tables (mirrors rvsrg's
//! `database::models`, but for sessions/plays/maps instead of
//! beatmapsets/beatmaps).

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    pub total_plays: i64,
    pub avg_accuracy: f64,
    pub best_accuracy: f64,
    pub worst_accuracy: f64,
    pub avg_msd: f64,
    pub total_time_played: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionPlayRow {
    pub id: i64,
    pub session_id: i64,
    pub beatmap_path: String,
    pub accuracy: f64,
    pub session_time: String,
    pub recorded_at: String,
    pub peak_msd: f64,
    pub dominant_skillset: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct IndexedMapRow {
    pub id: i64,
    pub beatmap_path: String,
    pub key_count: i32,
    pub overall_msd: f64,
    pub dominant_skillset: String,
    pub display_name: String,
    pub play_count: i32,
    pub best_accuracy: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MapRateScoreRow {
    pub map_id: i64,
    pub rate: i32,
    pub overall: f64,
    pub stream: f64,
    pub jumpstream: f64,
    pub handstream: f64,
    pub stamina: f64,
    pub jackspeed: f64,
    pub chordjack: f64,
    pub technical: f64,
}
