//! Active-mods bitfield to rate mapping (spec §4.A.5).

bitflags::bitflags! {
    /// Subset of the game's mod bitfield relevant to rate. Other mods are
    /// tracked (for completeness of a read) but don't affect `rate_for_mods`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActiveMods: u32 {
        const NO_FAIL    = 1 << 0;
        const EASY       = 1 << 1;
        const HIDDEN     = 1 << 3;
        const HARD_ROCK  = 1 << 4;
        const DOUBLE_TIME = 1 << 6;
        const HALF_TIME  = 1 << 8;
        const FLASHLIGHT = 1 << 10;
        const NIGHT_CORE = 1 << 9;
        const DAY_CORE   = 1 << 20;
        const MIRROR     = 1 << 30;
    }
}

/// Maps {DoubleTime, NightCore} -> 1.5x, {HalfTime, DayCore} -> 0.75x, else 1.0x.
pub fn rate_for_mods(mods: ActiveMods) -> f64 {
    if mods.intersects(ActiveMods::DOUBLE_TIME | ActiveMods::NIGHT_CORE) {
        1.5
    } else if mods.intersects(ActiveMods::HALF_TIME | ActiveMods::DAY_CORE) {
        0.75
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_time_and_nightcore_both_give_one_point_five() {
        assert_eq!(rate_for_mods(ActiveMods::DOUBLE_TIME), 1.5);
        assert_eq!(rate_for_mods(ActiveMods::NIGHT_CORE), 1.5);
    }

    #[test]
    fn half_time_and_daycore_both_give_three_quarters() {
        assert_eq!(rate_for_mods(ActiveMods::HALF_TIME), 0.75);
        assert_eq!(rate_for_mods(ActiveMods::DAY_CORE), 0.75);
    }

    #[test]
    fn other_mods_leave_rate_unchanged() {
        assert_eq!(rate_for_mods(ActiveMods::HIDDEN | ActiveMods::HARD_ROCK), 1.0);
        assert_eq!(rate_for_mods(ActiveMods::empty()), 1.0);
    }
}
