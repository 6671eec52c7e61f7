//! Shared data model (spec §3): plays, sessions, skillset scores, indexed
//! maps, and the rate axis everything else is built on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of named skillsets a map/player can be rated on.
///
/// rvsrg encodes the same seven-way split as free-floating `f64` fields on
/// `BeatmapRating` (`database/models.rs`); here it's a real enum (§9: tagged
/// variants instead of stringly-typed dispatch) so the rest of the core
/// can't typo a skillset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skillset {
    Stream,
    Jumpstream,
    Handstream,
    Stamina,
    Jackspeed,
    Chordjack,
    Technical,
}

impl Skillset {
    pub const ALL: [Skillset; 7] = [
        Skillset::Stream,
        Skillset::Jumpstream,
        Skillset::Handstream,
        Skillset::Stamina,
        Skillset::Jackspeed,
        Skillset::Chordjack,
        Skillset::Technical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Skillset::Stream => "stream",
            Skillset::Jumpstream => "jumpstream",
            Skillset::Handstream => "handstream",
            Skillset::Stamina => "stamina",
            Skillset::Jackspeed => "jackspeed",
            Skillset::Chordjack => "chordjack",
            Skillset::Technical => "technical",
        }
    }

    pub fn parse(name: &str) -> Option<Skillset> {
        Some(match name.to_ascii_lowercase().as_str() {
            "stream" => Skillset::Stream,
            "jumpstream" => Skillset::Jumpstream,
            "handstream" => Skillset::Handstream,
            "stamina" => Skillset::Stamina,
            "jackspeed" => Skillset::Jackspeed,
            "chordjack" => Skillset::Chordjack,
            "technical" => Skillset::Technical,
            _ => return None,
        })
    }
}

impl fmt::Display for Skillset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per named skillset plus the derived `overall`.
///
/// Invariant: `overall` is the maximum of the seven, never an average;
/// `dominant_skillset()` names that max.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsetScores {
    pub stream: f64,
    pub jumpstream: f64,
    pub handstream: f64,
    pub stamina: f64,
    pub jackspeed: f64,
    pub chordjack: f64,
    pub technical: f64,
}

impl SkillsetScores {
    pub fn value_for(&self, skillset: Skillset) -> f64 {
        match skillset {
            Skillset::Stream => self.stream,
            Skillset::Jumpstream => self.jumpstream,
            Skillset::Handstream => self.handstream,
            Skillset::Stamina => self.stamina,
            Skillset::Jackspeed => self.jackspeed,
            Skillset::Chordjack => self.chordjack,
            Skillset::Technical => self.technical,
        }
    }

    /// The maximum of the seven named values. Never an average (spec §3).
    pub fn overall(&self) -> f64 {
        Skillset::ALL
            .iter()
            .map(|s| self.value_for(*s))
            .fold(f64::MIN, f64::max)
    }

    /// The skillset achieving `overall()`. Ties resolve to the first in
    /// `Skillset::ALL` order, matching the companella MSD tool's own
    /// `max_by` tie-break (`other_examples/…msd-calculator…`).
    pub fn dominant_skillset(&self) -> Skillset {
        let mut best = Skillset::ALL[0];
        let mut best_value = f64::MIN;
        for skillset in Skillset::ALL {
            let value = self.value_for(skillset);
            if value > best_value {
                best_value = value;
                best = skillset;
            }
        }
        best
    }
}

/// One completed play. Immutable once written (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub beatmap_path: String,
    pub accuracy: f64,
    pub session_time: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub peak_msd: f64,
    pub dominant_skillset: String,
}

impl Play {
    /// Value used when the MSD tool failed but the accuracy reading is
    /// still usable (spec §4.C failure semantics).
    pub const UNKNOWN_SKILLSET: &'static str = "unknown";
}

/// A bounded time interval during which plays are tracked (spec §3).
///
/// `total_plays`/`avg_accuracy`/etc. are computed at write time and stored
/// denormalized; see `store::sessions` for the persisted shape.
#[derive(Debug, Clone)]
pub struct Session {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub total_plays: i64,
    pub avg_accuracy: f64,
    pub best_accuracy: f64,
    pub worst_accuracy: f64,
    pub avg_msd: f64,
    pub total_time_played_seconds: f64,
}

impl Session {
    /// `end_time >= start_time >= every play.recorded_at`'s lower bound,
    /// and plays ordered by `session_time` ascending (spec §3 invariant).
    pub fn is_ordered(&self) -> bool {
        self.plays
            .windows(2)
            .all(|pair| pair[0].session_time <= pair[1].session_time)
    }

    /// Recomputes the denormalized aggregate stats from the plays list.
    pub fn stats(&self) -> SessionStats {
        if self.plays.is_empty() {
            return SessionStats::default();
        }
        let total_plays = self.plays.len() as i64;
        let sum_accuracy: f64 = self.plays.iter().map(|p| p.accuracy).sum();
        let sum_msd: f64 = self.plays.iter().map(|p| p.peak_msd).sum();
        let best_accuracy = self
            .plays
            .iter()
            .map(|p| p.accuracy)
            .fold(f64::MIN, f64::max);
        let worst_accuracy = self
            .plays
            .iter()
            .map(|p| p.accuracy)
            .fold(f64::MAX, f64::min);
        SessionStats {
            total_plays,
            avg_accuracy: sum_accuracy / total_plays as f64,
            best_accuracy,
            worst_accuracy,
            avg_msd: sum_msd / total_plays as f64,
            total_time_played_seconds: (self.end_time - self.start_time).num_milliseconds() as f64
                / 1000.0,
        }
    }
}

/// The rate axis the Maps store/MSD tool index against: 0.7x..=2.0x in 0.1
/// steps, represented as fixed-point tenths so the map key hashes/compares
/// exactly (floating `HashMap` keys would be a correctness bug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rate(i32);

impl Rate {
    pub const MIN: Rate = Rate(7);
    pub const MAX: Rate = Rate(20);
    pub const NORMAL: Rate = Rate(10);

    pub fn from_f64(value: f64) -> Rate {
        Rate((value * 10.0).round() as i32)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }

    pub fn all() -> impl Iterator<Item = Rate> {
        (Rate::MIN.0..=Rate::MAX.0).map(Rate)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}x", self.as_f64())
    }
}

/// One row of the Maps store (spec §3). `msd_scores` may be partial; a
/// nonempty mapping must contain the 1.0x entry.
#[derive(Debug, Clone)]
pub struct IndexedMap {
    pub beatmap_path: String,
    pub key_count: i32,
    pub overall_msd: f64,
    pub dominant_skillset: Skillset,
    pub msd_scores: BTreeMap<Rate, SkillsetScores>,
    pub display_name: String,
    pub play_count: i32,
    pub best_accuracy: Option<f64>,
}

impl IndexedMap {
    pub fn has_valid_msd_mapping(&self) -> bool {
        self.msd_scores.is_empty() || self.msd_scores.contains_key(&Rate::NORMAL)
    }

    pub fn msd_at(&self, rate: Rate, skillset: Skillset) -> Option<f64> {
        self.msd_scores
            .get(&rate)
            .map(|scores| scores.value_for(skillset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_max_not_average() {
        let scores = SkillsetScores {
            stream: 10.0,
            jumpstream: 30.0,
            handstream: 5.0,
            stamina: 5.0,
            jackspeed: 5.0,
            chordjack: 5.0,
            technical: 5.0,
        };
        assert_eq!(scores.overall(), 30.0);
        assert_eq!(scores.dominant_skillset(), Skillset::Jumpstream);
    }

    #[test]
    fn session_with_zero_plays_has_default_stats() {
        let session = Session {
            start_time: Utc::now(),
            end_time: Utc::now(),
            plays: Vec::new(),
        };
        let stats = session.stats();
        assert_eq!(stats.total_plays, 0);
    }

    #[test]
    fn rate_round_trips_through_fixed_point() {
        let rate = Rate::from_f64(1.3);
        assert!((rate.as_f64() - 1.3).abs() < 1e-9);
    }
}
