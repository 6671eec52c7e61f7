//! Query criteria for the Maps store's `search` (spec §4.B).

use crate::domain::Skillset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Random,
    MsdAsc,
    MsdDesc,
}

#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub min_msd: Option<f64>,
    pub max_msd: Option<f64>,
    pub skillset: Option<Skillset>,
    pub key_count: Option<i32>,
    pub limit: Option<i64>,
    pub order_by: Option<OrderBy>,
    /// Beatmap paths to exclude, used by the planner to avoid reusing a map
    /// already placed in the plan (spec §4.G step 3).
    pub exclude_paths: Vec<String>,
}
