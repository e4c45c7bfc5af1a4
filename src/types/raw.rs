//! Pre-computed behavioral features for direct model scoring

use crate::feature_extractor::HEURISTIC_SLOTS;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// A transaction described by its trained feature values rather than by
/// merchant and location metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeatures {
    /// Seconds elapsed since the first transaction of the dataset
    pub time: f64,

    /// Behavioral components `V1..V28`
    pub components: [f64; HEURISTIC_SLOTS],

    pub amount: f64,
}

impl RawFeatures {
    pub fn new(time: f64, components: [f64; HEURISTIC_SLOTS], amount: f64) -> Self {
        Self {
            time,
            components,
            amount,
        }
    }

    /// `floor(time / 3600) mod 24`
    pub fn hour(&self) -> u8 {
        ((self.time.max(0.0) / SECONDS_PER_HOUR).floor() as u64 % 24) as u8
    }

    /// `floor(time / 86400) mod 7`
    pub fn day_of_week(&self) -> u8 {
        ((self.time.max(0.0) / SECONDS_PER_DAY).floor() as u64 % 7) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_derivation() {
        let raw = RawFeatures::new(86_520.0, [0.0; HEURISTIC_SLOTS], 75.0);
        assert_eq!(raw.hour(), 0);
        assert_eq!(raw.day_of_week(), 1);

        let raw = RawFeatures::new(3599.9, [0.0; HEURISTIC_SLOTS], 1.0);
        assert_eq!(raw.hour(), 0);

        // 6 days + 23 hours
        let raw = RawFeatures::new(6.0 * 86_400.0 + 23.0 * 3600.0, [0.0; HEURISTIC_SLOTS], 1.0);
        assert_eq!(raw.hour(), 23);
        assert_eq!(raw.day_of_week(), 6);

        // Wraps after a week
        let raw = RawFeatures::new(7.0 * 86_400.0 + 5.0 * 3600.0, [0.0; HEURISTIC_SLOTS], 1.0);
        assert_eq!(raw.hour(), 5);
        assert_eq!(raw.day_of_week(), 0);
    }
}
