//! Sessions store: `Sessions` + `SessionPlays` (spec §3, §4.B).

use super::models::{SessionPlayRow, SessionRow};
use super::{open_pool, StoreError};
use crate::domain::{Play, Session};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;

const MIGRATION_SESSIONS: &str = include_str!("migrations/001_create_sessions.sql");
const MIGRATION_SESSION_PLAYS: &str = include_str!("migrations/002_create_session_plays.sql");

pub struct SessionsStore {
    pool: SqlitePool,
}

impl SessionsStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = open_pool(path, false).await?;
        sqlx::query(MIGRATION_SESSIONS).execute(&pool).await?;
        sqlx::query(MIGRATION_SESSION_PLAYS).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Writes a session and its plays atomically: insert session, insert
    /// all plays, commit or rollback together (spec §4.B, §5). An empty
    /// session (zero plays) is not persisted at all.
    pub async fn persist_session(&self, session: &Session) -> Result<Option<i64>, StoreError> {
        if session.plays.is_empty() {
            return Ok(None);
        }

        let stats = session.stats();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO sessions (start_time, end_time, total_plays, avg_accuracy, best_accuracy, worst_accuracy, avg_msd, total_time_played)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(session.start_time.to_rfc3339())
        .bind(session.end_time.to_rfc3339())
        .bind(stats.total_plays)
        .bind(stats.avg_accuracy)
        .bind(stats.best_accuracy)
        .bind(stats.worst_accuracy)
        .bind(stats.avg_msd)
        .bind(stats.total_time_played_seconds)
        .execute(&mut *tx)
        .await?;

        let session_id = result.last_insert_rowid();

        for play in &session.plays {
            sqlx::query(
                "INSERT INTO session_plays (session_id, beatmap_path, accuracy, session_time, recorded_at, peak_msd, dominant_skillset)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(session_id)
            .bind(&play.beatmap_path)
            .bind(play.accuracy)
            .bind(play.session_time.to_rfc3339())
            .bind(play.recorded_at.to_rfc3339())
            .bind(play.peak_msd)
            .bind(&play.dominant_skillset)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(session_id))
    }

    pub async fn load_session(&self, session_id: i64) -> Result<Option<Session>, StoreError> {
        let Some(row): Option<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE id = ?1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let play_rows: Vec<SessionPlayRow> = sqlx::query_as(
            "SELECT * FROM session_plays WHERE session_id = ?1 ORDER BY session_time ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let plays = play_rows
            .into_iter()
            .map(|row| Play {
                beatmap_path: row.beatmap_path,
                accuracy: row.accuracy,
                session_time: parse_timestamp(&row.session_time),
                recorded_at: parse_timestamp(&row.recorded_at),
                peak_msd: row.peak_msd,
                dominant_skillset: row.dominant_skillset,
            })
            .collect();

        Ok(Some(Session {
            start_time: parse_timestamp(&row.start_time),
            end_time: parse_timestamp(&row.end_time),
            plays,
        }))
    }

    /// All plays across every session, in the rolling window the analyzer
    /// wants (spec §4.D "default = all plays").
    pub async fn all_plays(&self) -> Result<Vec<Play>, StoreError> {
        let rows: Vec<SessionPlayRow> =
            sqlx::query_as("SELECT * FROM session_plays ORDER BY session_time ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|row| Play {
                beatmap_path: row.beatmap_path,
                accuracy: row.accuracy,
                session_time: parse_timestamp(&row.session_time),
                recorded_at: parse_timestamp(&row.recorded_at),
                peak_msd: row.peak_msd,
                dominant_skillset: row.dominant_skillset,
            })
            .collect())
    }

    /// Plays recorded against a specific beatmap, used by the Map-MMR
    /// Calculator's performance-adjustment term (spec §4.E).
    pub async fn plays_for_beatmap(&self, beatmap_path: &str) -> Result<Vec<Play>, StoreError> {
        let rows: Vec<SessionPlayRow> = sqlx::query_as(
            "SELECT * FROM session_plays WHERE beatmap_path = ?1 ORDER BY session_time ASC",
        )
        .bind(beatmap_path)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Play {
                beatmap_path: row.beatmap_path,
                accuracy: row.accuracy,
                session_time: parse_timestamp(&row.session_time),
                recorded_at: parse_timestamp(&row.recorded_at),
                peak_msd: row.peak_msd,
                dominant_skillset: row.dominant_skillset,
            })
            .collect())
    }

    pub async fn delete_session(&self, session_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
