//! `DansConfigFile` (spec §6): an ordered dan list is the sole source of
//! ordinal rank; [`DansLookup`] resolves a player's per-pattern rating into
//! a dan bracket plus a variant tier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DansConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dans config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DanEntry {
    pub label: String,
    /// Pattern name → the rating a player must reach to clear this dan for
    /// that pattern.
    pub patterns: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DansConfigFile {
    pub version: u32,
    /// Order is the sole source of ordinal rank (spec §6): `dans[0]` is the
    /// lowest dan, `dans[last]` the highest.
    pub dans: Vec<DanEntry>,
}

impl DansConfigFile {
    pub fn load(path: &Path) -> Result<Self, DansConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DansConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn lookup(&self) -> DansLookup {
        DansLookup::build(self)
    }
}

/// Variant tier attached to a dan classification, indicating how close the
/// player sits to the next bracket up (spec §9 open question: the
/// bottom/top of the list has no "next"/"previous" bracket, resolved below).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanVariant {
    MinusMinus,
    Minus,
    Plain,
    Plus,
    PlusPlus,
}

impl fmt::Display for DanVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DanVariant::MinusMinus => "--",
            DanVariant::Minus => "-",
            DanVariant::Plain => "",
            DanVariant::Plus => "+",
            DanVariant::PlusPlus => "++",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DanClassification {
    pub rank: usize,
    pub label: String,
    pub variant: DanVariant,
}

struct PatternBracket {
    rank: usize,
    label: String,
    threshold: f64,
}

/// Flattens `DansConfigFile` into one sorted-by-rank bracket list per
/// pattern, so classification doesn't re-scan the whole config per call.
pub struct DansLookup {
    by_pattern: HashMap<String, Vec<PatternBracket>>,
}

impl DansLookup {
    fn build(config: &DansConfigFile) -> Self {
        let mut by_pattern: HashMap<String, Vec<PatternBracket>> = HashMap::new();
        for (rank, dan) in config.dans.iter().enumerate() {
            for (pattern, &threshold) in &dan.patterns {
                by_pattern.entry(pattern.clone()).or_default().push(PatternBracket {
                    rank,
                    label: dan.label.clone(),
                    threshold,
                });
            }
        }
        for brackets in by_pattern.values_mut() {
            brackets.sort_by(|a, b| a.rank.cmp(&b.rank));
        }
        Self { by_pattern }
    }

    /// Classifies `score` against `pattern`'s dan brackets (spec §6/§9).
    ///
    /// At the bottom of the list (score below the lowest bracket's
    /// threshold) there is no lower bracket to interpolate against, so the
    /// player is reported at the lowest dan with [`DanVariant::MinusMinus`].
    /// Symmetrically, above the highest bracket the player is reported at
    /// the highest dan with [`DanVariant::PlusPlus`]. This is a deliberate
    /// resolution of the one-sided-range open question, not an
    /// interpolation: there's no adjacent bracket on that side to measure
    /// progress against.
    pub fn nearest_dan_bracket(&self, pattern: &str, score: f64) -> Option<DanClassification> {
        let brackets = self.by_pattern.get(pattern)?;
        if brackets.is_empty() {
            return None;
        }

        if score < brackets[0].threshold {
            return Some(DanClassification {
                rank: brackets[0].rank,
                label: brackets[0].label.clone(),
                variant: DanVariant::MinusMinus,
            });
        }

        let current_index = brackets
            .iter()
            .rposition(|bracket| bracket.threshold <= score)
            .unwrap_or(0);

        if current_index == brackets.len() - 1 {
            let top = &brackets[current_index];
            return Some(DanClassification {
                rank: top.rank,
                label: top.label.clone(),
                variant: DanVariant::PlusPlus,
            });
        }

        let current = &brackets[current_index];
        let next = &brackets[current_index + 1];
        let span = next.threshold - current.threshold;
        let ratio = if span > 0.0 { ((score - current.threshold) / span).clamp(0.0, 1.0) } else { 0.0 };

        let variant = match ratio {
            r if r < 0.2 => DanVariant::MinusMinus,
            r if r < 0.4 => DanVariant::Minus,
            r if r < 0.6 => DanVariant::Plain,
            r if r < 0.8 => DanVariant::Plus,
            _ => DanVariant::PlusPlus,
        };

        Some(DanClassification {
            rank: current.rank,
            label: current.label.clone(),
            variant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> DansConfigFile {
        let mut low = HashMap::new();
        low.insert("stream".to_string(), 10.0);
        let mut mid = HashMap::new();
        mid.insert("stream".to_string(), 20.0);
        let mut high = HashMap::new();
        high.insert("stream".to_string(), 30.0);

        DansConfigFile {
            version: 1,
            dans: vec![
                DanEntry { label: "MSD 1".into(), patterns: low },
                DanEntry { label: "MSD 2".into(), patterns: mid },
                DanEntry { label: "MSD 3".into(), patterns: high },
            ],
        }
    }

    #[test]
    fn below_lowest_bracket_is_minus_minus_at_lowest_label() {
        let lookup = sample_config().lookup();
        let result = lookup.nearest_dan_bracket("stream", 5.0).unwrap();
        assert_eq!(result.label, "MSD 1");
        assert_eq!(result.variant, DanVariant::MinusMinus);
    }

    #[test]
    fn above_highest_bracket_is_plus_plus_at_highest_label() {
        let lookup = sample_config().lookup();
        let result = lookup.nearest_dan_bracket("stream", 99.0).unwrap();
        assert_eq!(result.label, "MSD 3");
        assert_eq!(result.variant, DanVariant::PlusPlus);
    }

    #[test]
    fn midpoint_between_brackets_is_plain() {
        let lookup = sample_config().lookup();
        // Halfway from MSD1 (10) to MSD2 (20) is 15.0 -> ratio 0.5 -> Plain.
        let result = lookup.nearest_dan_bracket("stream", 15.0).unwrap();
        assert_eq!(result.label, "MSD 1");
        assert_eq!(result.variant, DanVariant::Plain);
    }

    #[test]
    fn unknown_pattern_yields_none() {
        let lookup = sample_config().lookup();
        assert!(lookup.nearest_dan_bracket("jackspeed", 15.0).is_none());
    }
}
