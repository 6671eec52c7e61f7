//! Persisted configuration (spec §6): `SettingsFile` and `DansConfigFile`.

pub mod dans;
pub mod settings;

pub use dans::{DanClassification, DansConfigFile, DansLookup, DanVariant};
pub use settings::SettingsFile;
