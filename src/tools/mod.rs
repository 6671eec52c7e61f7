//! External collaborator boundaries (spec §1 "Out of scope", §6): narrow
//! capability traits plus one real, subprocess- or crate-backed
//! implementation each, so the core components only ever depend on the
//! trait.

pub mod analytics;
pub mod beatmap_assets;
pub mod bpm;
pub mod collection;
pub mod msd;
