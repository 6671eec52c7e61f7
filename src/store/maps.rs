//! Maps store: the indexed map library with per-rate skillset scores
//! (spec §3, §4.B). Query shape (`search(criteria)`) mirrors rvsrg's
//! `database::query::search_beatmapsets` dynamic-SQL style.

use super::criteria::{OrderBy, SearchCriteria};
use super::models::{IndexedMapRow, MapRateScoreRow};
use super::{open_pool, StoreError};
use crate::domain::{IndexedMap, Rate, Skillset, SkillsetScores};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::Path;

const MIGRATION_INDEXED_MAP: &str = include_str!("migrations/003_create_indexed_map.sql");
const MIGRATION_RATE_SCORES: &str = include_str!("migrations/004_create_map_rate_scores.sql");

pub struct MapsStore {
    pool: SqlitePool,
}

impl MapsStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = open_pool(path, true).await?;
        sqlx::query(MIGRATION_INDEXED_MAP).execute(&pool).await?;
        sqlx::query(MIGRATION_RATE_SCORES).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or updates a map row by `beatmap_path` (unique), returning
    /// its row id.
    pub async fn upsert_map(&self, map: &IndexedMap) -> Result<i64, StoreError> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM indexed_map WHERE beatmap_path = ?1")
                .bind(&map.beatmap_path)
                .fetch_optional(&self.pool)
                .await?;

        let map_id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE indexed_map SET key_count = ?1, overall_msd = ?2, dominant_skillset = ?3, display_name = ?4, play_count = ?5, best_accuracy = ?6 WHERE id = ?7",
                )
                .bind(map.key_count)
                .bind(map.overall_msd)
                .bind(map.dominant_skillset.as_str())
                .bind(&map.display_name)
                .bind(map.play_count)
                .bind(map.best_accuracy)
                .bind(id)
                .execute(&self.pool)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO indexed_map (beatmap_path, key_count, overall_msd, dominant_skillset, display_name, play_count, best_accuracy) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .bind(&map.beatmap_path)
                .bind(map.key_count)
                .bind(map.overall_msd)
                .bind(map.dominant_skillset.as_str())
                .bind(&map.display_name)
                .bind(map.play_count)
                .bind(map.best_accuracy)
                .execute(&self.pool)
                .await?;
                result.last_insert_rowid()
            }
        };

        for (rate, scores) in &map.msd_scores {
            self.upsert_rate_scores(map_id, *rate, scores).await?;
        }

        Ok(map_id)
    }

    async fn upsert_rate_scores(
        &self,
        map_id: i64,
        rate: Rate,
        scores: &SkillsetScores,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO map_rate_scores (map_id, rate, overall, stream, jumpstream, handstream, stamina, jackspeed, chordjack, technical)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(map_id, rate) DO UPDATE SET
                overall = excluded.overall, stream = excluded.stream, jumpstream = excluded.jumpstream,
                handstream = excluded.handstream, stamina = excluded.stamina, jackspeed = excluded.jackspeed,
                chordjack = excluded.chordjack, technical = excluded.technical",
        )
        .bind(map_id)
        .bind(rate_to_i32(rate))
        .bind(scores.overall())
        .bind(scores.stream)
        .bind(scores.jumpstream)
        .bind(scores.handstream)
        .bind(scores.stamina)
        .bind(scores.jackspeed)
        .bind(scores.chordjack)
        .bind(scores.technical)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_path(&self, beatmap_path: &str) -> Result<Option<IndexedMap>, StoreError> {
        let Some(row): Option<IndexedMapRow> =
            sqlx::query_as("SELECT * FROM indexed_map WHERE beatmap_path = ?1")
                .bind(beatmap_path)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };
        self.hydrate(row).await
    }

    async fn hydrate(&self, row: IndexedMapRow) -> Result<Option<IndexedMap>, StoreError> {
        let score_rows: Vec<MapRateScoreRow> =
            sqlx::query_as("SELECT * FROM map_rate_scores WHERE map_id = ?1")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let mut msd_scores = BTreeMap::new();
        for score_row in score_rows {
            msd_scores.insert(
                Rate::from_f64(score_row.rate as f64 / 10.0),
                SkillsetScores {
                    stream: score_row.stream,
                    jumpstream: score_row.jumpstream,
                    handstream: score_row.handstream,
                    stamina: score_row.stamina,
                    jackspeed: score_row.jackspeed,
                    chordjack: score_row.chordjack,
                    technical: score_row.technical,
                },
            );
        }

        Ok(Some(IndexedMap {
            beatmap_path: row.beatmap_path,
            key_count: row.key_count,
            overall_msd: row.overall_msd,
            dominant_skillset: Skillset::parse(&row.dominant_skillset).unwrap_or(Skillset::Stream),
            msd_scores,
            display_name: row.display_name,
            play_count: row.play_count,
            best_accuracy: row.best_accuracy,
        }))
    }

    /// `search(criteria) -> list` (spec §4.B). `criteria.skillset`, when
    /// set, restricts ranking (bounds, ordering) to that skillset's column
    /// in `map_rate_scores` instead of the map's overall MSD — the column
    /// name comes from `Skillset::as_str()`, a closed enum, so it's safe to
    /// interpolate directly rather than bind as a parameter.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<IndexedMap>, StoreError> {
        let msd_expr = match criteria.skillset {
            Some(skillset) => format!("COALESCE(r.{col}, m.overall_msd)", col = skillset.as_str()),
            None => "COALESCE(r.overall, m.overall_msd)".to_string(),
        };

        let mut sql = String::from(
            "SELECT DISTINCT m.* FROM indexed_map m LEFT JOIN map_rate_scores r ON r.map_id = m.id AND r.rate = 10 WHERE 1=1",
        );
        if criteria.min_msd.is_some() {
            sql.push_str(&format!(" AND {msd_expr} >= ?"));
        }
        if criteria.max_msd.is_some() {
            sql.push_str(&format!(" AND {msd_expr} <= ?"));
        }
        if criteria.key_count.is_some() {
            sql.push_str(" AND m.key_count = ?");
        }
        if !criteria.exclude_paths.is_empty() {
            let placeholders = vec!["?"; criteria.exclude_paths.len()].join(", ");
            sql.push_str(&format!(" AND m.beatmap_path NOT IN ({placeholders})"));
        }
        match criteria.order_by {
            Some(OrderBy::MsdAsc) => sql.push_str(&format!(" ORDER BY {msd_expr} ASC")),
            Some(OrderBy::MsdDesc) => sql.push_str(&format!(" ORDER BY {msd_expr} DESC")),
            Some(OrderBy::Random) | None => sql.push_str(" ORDER BY RANDOM()"),
        }
        if let Some(limit) = criteria.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query_as::<_, IndexedMapRow>(&sql);
        if let Some(min) = criteria.min_msd {
            query = query.bind(min);
        }
        if let Some(max) = criteria.max_msd {
            query = query.bind(max);
        }
        if let Some(kc) = criteria.key_count {
            query = query.bind(kc);
        }
        for excluded in &criteria.exclude_paths {
            query = query.bind(excluded);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let mut maps = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(map) = self.hydrate(row).await? {
                maps.push(map);
            }
        }
        Ok(maps)
    }

    pub async fn record_play(&self, beatmap_path: &str, accuracy: f64) -> Result<(), StoreError> {
        let Some(map_id): Option<i64> =
            sqlx::query_scalar("SELECT id FROM indexed_map WHERE beatmap_path = ?1")
                .bind(beatmap_path)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(());
        };

        sqlx::query(
            "UPDATE indexed_map SET play_count = play_count + 1, best_accuracy = MAX(COALESCE(best_accuracy, 0), ?1) WHERE id = ?2",
        )
        .bind(accuracy)
        .bind(map_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn rate_to_i32(rate: Rate) -> i32 {
    (rate.as_f64() * 10.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory_store() -> MapsStore {
        MapsStore::open(Path::new(":memory:")).await.unwrap()
    }

    fn sample_map(path: &str, overall_msd: f64) -> IndexedMap {
        let mut msd_scores = BTreeMap::new();
        msd_scores.insert(
            Rate::NORMAL,
            SkillsetScores {
                stream: overall_msd,
                ..Default::default()
            },
        );
        IndexedMap {
            beatmap_path: path.to_string(),
            key_count: 4,
            overall_msd,
            dominant_skillset: Skillset::Stream,
            msd_scores,
            display_name: path.to_string(),
            play_count: 0,
            best_accuracy: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = in_memory_store().await;
        store.upsert_map(&sample_map("a.osu", 20.0)).await.unwrap();
        let fetched = store.get_by_path("a.osu").await.unwrap().unwrap();
        assert_eq!(fetched.overall_msd, 20.0);
        assert_eq!(fetched.msd_at(Rate::NORMAL, Skillset::Stream), Some(20.0));
    }

    #[tokio::test]
    async fn search_respects_msd_bounds_and_limit() {
        let store = in_memory_store().await;
        for (path, msd) in [("a.osu", 10.0), ("b.osu", 20.0), ("c.osu", 30.0)] {
            store.upsert_map(&sample_map(path, msd)).await.unwrap();
        }
        let criteria = SearchCriteria {
            min_msd: Some(15.0),
            max_msd: Some(25.0),
            limit: Some(10),
            ..Default::default()
        };
        let results = store.search(&criteria).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].beatmap_path, "b.osu");
    }

    #[tokio::test]
    async fn search_restricts_bounds_to_requested_skillset() {
        let store = in_memory_store().await;

        // "a.osu" has a low stream score but a high jackspeed score; overall
        // MSD search would miss it, skillset-restricted search should find it.
        let mut msd_scores = BTreeMap::new();
        msd_scores.insert(
            Rate::NORMAL,
            SkillsetScores {
                stream: 5.0,
                jackspeed: 22.0,
                ..Default::default()
            },
        );
        let map = IndexedMap {
            beatmap_path: "a.osu".to_string(),
            key_count: 4,
            overall_msd: 5.0,
            dominant_skillset: Skillset::Jackspeed,
            msd_scores,
            display_name: "a.osu".to_string(),
            play_count: 0,
            best_accuracy: None,
        };
        store.upsert_map(&map).await.unwrap();

        let overall_criteria = SearchCriteria {
            min_msd: Some(20.0),
            max_msd: Some(25.0),
            ..Default::default()
        };
        assert!(store.search(&overall_criteria).await.unwrap().is_empty());

        let skillset_criteria = SearchCriteria {
            min_msd: Some(20.0),
            max_msd: Some(25.0),
            skillset: Some(Skillset::Jackspeed),
            ..Default::default()
        };
        let results = store.search(&skillset_criteria).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].beatmap_path, "a.osu");
    }
}
