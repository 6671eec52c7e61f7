//! `MsdCurveConfig`: a piecewise-linear MSD-vs-time curve (spec §4.G,
//! "MsdCurveConfig": ordered control points, `msd(t) = base_msd × (1 +
//! msd_percent(t)/100)`).

use crate::domain::Skillset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveControlPoint {
    pub time_percent: f64,
    pub msd_percent: f64,
    pub skillset: Option<Skillset>,
}

#[derive(Debug, Clone)]
pub struct MsdCurveConfig {
    /// Must be sorted ascending by `time_percent`; empty is valid (spec §8
    /// "Building a plan from a curve with empty control points yields zero
    /// items").
    pub control_points: Vec<CurveControlPoint>,
    pub base_msd: f64,
    pub min_msd_percent: f64,
    pub max_msd_percent: f64,
    pub total_session_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    RampUp,
    Cooldown,
}

impl MsdCurveConfig {
    /// Piecewise-linear interpolation of `msd_percent` over the control
    /// points; clamps to the first/last point's value outside their range.
    pub fn msd_percent_at(&self, time_percent: f64) -> f64 {
        let points = &self.control_points;
        if points.is_empty() {
            return 0.0;
        }
        if time_percent <= points[0].time_percent {
            return points[0].msd_percent;
        }
        if time_percent >= points[points.len() - 1].time_percent {
            return points[points.len() - 1].msd_percent;
        }
        for window in points.windows(2) {
            let (a, b) = (window[0], window[1]);
            if time_percent >= a.time_percent && time_percent <= b.time_percent {
                if (b.time_percent - a.time_percent).abs() < f64::EPSILON {
                    return a.msd_percent;
                }
                let fraction = (time_percent - a.time_percent) / (b.time_percent - a.time_percent);
                return a.msd_percent + fraction * (b.msd_percent - a.msd_percent);
            }
        }
        points[points.len() - 1].msd_percent
    }

    /// The skillset of the nearest-preceding control point, or `None` if
    /// `time_percent` precedes every control point (spec §4.G "skillset at
    /// any time is the skillset of the nearest-preceding control point").
    pub fn skillset_at(&self, time_percent: f64) -> Option<Skillset> {
        self.control_points
            .iter()
            .filter(|p| p.time_percent <= time_percent)
            .last()
            .and_then(|p| p.skillset)
    }

    pub fn target_msd(&self, time_percent: f64) -> f64 {
        self.base_msd * (1.0 + self.msd_percent_at(time_percent) / 100.0)
    }

    /// Infers the phase at `time_percent` from the curve's local shape
    /// (spec §4.G step 2): `Warmup` early and near the floor, `Cooldown`
    /// late and descending, `RampUp` otherwise.
    pub fn phase_at(&self, time_percent: f64) -> Phase {
        let current = self.msd_percent_at(time_percent);
        if time_percent < 20.0 && current <= self.min_msd_percent + 5.0 {
            return Phase::Warmup;
        }
        if time_percent > 75.0 {
            let previous = self.msd_percent_at((time_percent - 5.0).max(0.0));
            if current < previous {
                return Phase::Cooldown;
            }
        }
        Phase::RampUp
    }
}
