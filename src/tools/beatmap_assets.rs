//! Sibling-asset resolution for the Indexer (spec §4.G "Indexed copy
//! creation... and its sibling audio/asset dependencies referenced by the
//! file").
//!
//! This is a file-manifest lookup, not the semantic `.osu` parser that's out
//! of scope (spec §1): it reads only the `[General]` audio filename and the
//! `[Events]` background reference, grounded on the same `rosu_map::Beatmap`
//! field access the teacher's scanner already used
//! (`database/scanner.rs`'s `map.background_file`).

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetResolutionError {
    #[error("failed to read beatmap file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse beatmap file: {0}")]
    Parse(String),
}

/// The files an indexed copy must bring along besides the `.osu` itself.
#[derive(Debug, Clone, Default)]
pub struct BeatmapAssets {
    pub audio_file: Option<PathBuf>,
    pub background_file: Option<PathBuf>,
}

/// Capability the planner's indexer depends on instead of `rosu_map`
/// directly (spec §9 capability-trait design note).
pub trait BeatmapAssetResolver: Send + Sync {
    fn resolve(&self, beatmap_path: &Path) -> Result<BeatmapAssets, AssetResolutionError>;
}

pub struct RosuMapAssetResolver;

impl BeatmapAssetResolver for RosuMapAssetResolver {
    fn resolve(&self, beatmap_path: &Path) -> Result<BeatmapAssets, AssetResolutionError> {
        let beatmap = rosu_map::Beatmap::from_path(beatmap_path)
            .map_err(|e| AssetResolutionError::Parse(e.to_string()))?;
        let folder = beatmap_path.parent().unwrap_or_else(|| Path::new("."));

        let audio_file = non_empty(&beatmap.audio_file).map(|name| folder.join(name));
        let background_file = non_empty(&beatmap.background_file).map(|name| folder.join(name));

        Ok(BeatmapAssets {
            audio_file,
            background_file,
        })
    }
}

fn non_empty(name: &str) -> Option<&str> {
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeResolver(BeatmapAssets);

    impl BeatmapAssetResolver for FakeResolver {
        fn resolve(&self, _beatmap_path: &Path) -> Result<BeatmapAssets, AssetResolutionError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn fake_resolver_returns_configured_assets() {
        let resolver = FakeResolver(BeatmapAssets {
            audio_file: Some(PathBuf::from("audio.mp3")),
            background_file: None,
        });
        let assets = resolver.resolve(Path::new("map.osu")).unwrap();
        assert_eq!(assets.audio_file, Some(PathBuf::from("audio.mp3")));
        assert!(assets.background_file.is_none());
    }
}
