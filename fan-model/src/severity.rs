use serde::{Deserialize, Serialize};
use std::fmt;

/// Implicit bound carried by the `Unknown` sentinel tier, larger than any
/// real threshold.
pub const UNKNOWN_BOUND: f64 = 9999.0;

/// Severity tier of a flood alert, ascending.
///
/// `Unknown` is the sentinel for readings that exceed every configured
/// threshold: such a reading is treated as *unclassifiable*, not promoted
/// to `Red`. It orders above `Red` so that taking a maximum over a series
/// never hides an off-the-chart reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
    Unknown,
}

/// Labels paired positionally with the four configured thresholds.
const NAMED_LEVELS: [AlertLevel; 4] = [
    AlertLevel::Green,
    AlertLevel::Yellow,
    AlertLevel::Orange,
    AlertLevel::Red,
];

impl AlertLevel {
    /// Classify a corrected reading against an ascending 4-tuple of
    /// thresholds.
    ///
    /// Returns the label whose threshold is the smallest value still `>=`
    /// the reading. Ties between equal thresholds resolve to the
    /// positionally first label. A reading above all four thresholds
    /// returns `Unknown` (see [`UNKNOWN_BOUND`]).
    pub fn classify(corrected: f64, thresholds: &[f64; 4]) -> AlertLevel {
        let mut best: (AlertLevel, f64) = (AlertLevel::Unknown, UNKNOWN_BOUND);
        for (level, bound) in NAMED_LEVELS.iter().zip(thresholds.iter()) {
            if *bound >= corrected && *bound < best.1 {
                best = (*level, *bound);
            }
        }
        best.0
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Green => write!(f, "GREEN"),
            AlertLevel::Yellow => write!(f, "YELLOW"),
            AlertLevel::Orange => write!(f, "ORANGE"),
            AlertLevel::Red => write!(f, "RED"),
            AlertLevel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
