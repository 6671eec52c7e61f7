//! Closed set of status codes the tracker cares about (spec §4.A).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    ResultsScreen,
    SongSelect,
    /// Any other in-game screen the tracker doesn't distinguish.
    Other,
}

impl GameStatus {
    pub fn from_raw(code: u32) -> GameStatus {
        match code {
            2 => GameStatus::Playing,
            7 => GameStatus::ResultsScreen,
            5 => GameStatus::SongSelect,
            _ => GameStatus::Other,
        }
    }
}
