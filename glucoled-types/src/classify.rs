//! Risk-band classification of glucose readings.

use core::fmt;
use core::time::Duration;

use crate::Reading;

/// Risk band derived from the latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Classification {
    /// Below the low threshold.
    CriticalLow,
    /// Between the thresholds, both ends inclusive.
    InRange,
    /// Above the high threshold.
    CriticalHigh,
    /// No reading, an unusable reading, or a stale one.
    Unavailable,
}

impl Classification {
    /// Whether this band came from a usable reading.
    pub fn is_available(&self) -> bool {
        !matches!(self, Classification::Unavailable)
    }

    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::CriticalLow => "critical-low",
            Classification::InRange => "in-range",
            Classification::CriticalHigh => "critical-high",
            Classification::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Band boundaries and freshness limit used by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thresholds {
    /// Values strictly below this are critical low (mg/dL).
    pub low_mg_dl: f64,
    /// Values strictly above this are critical high (mg/dL).
    pub high_mg_dl: f64,
    /// Readings older than this are stale. A reading exactly this old is
    /// still fresh.
    pub stale_after: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_mg_dl: 70.0,
            high_mg_dl: 170.0,
            stale_after: Duration::from_secs(15 * 60),
        }
    }
}

/// Classify a reading into a risk band.
///
/// `reading` is `None` when the upstream fetch failed. `now_ms` is the
/// current wall-clock time in Unix epoch milliseconds. Non-positive or
/// non-finite values are treated as unavailable.
pub fn classify(reading: Option<&Reading>, now_ms: u64, thresholds: &Thresholds) -> Classification {
    let Some(reading) = reading else {
        return Classification::Unavailable;
    };

    let value = reading.value_mg_dl;
    if !value.is_finite() || value <= 0.0 {
        return Classification::Unavailable;
    }

    let age = Duration::from_millis(reading.age_ms(now_ms));
    if age > thresholds.stale_after {
        return Classification::Unavailable;
    }

    if value < thresholds.low_mg_dl {
        Classification::CriticalLow
    } else if value > thresholds.high_mg_dl {
        Classification::CriticalHigh
    } else {
        Classification::InRange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_703_160_000_000;

    fn band(value: f64) -> Classification {
        classify(Some(&Reading::new(value, NOW)), NOW, &Thresholds::default())
    }

    #[test]
    fn value_boundaries_are_exact() {
        assert_eq!(band(69.0), Classification::CriticalLow);
        assert_eq!(band(69.9), Classification::CriticalLow);
        assert_eq!(band(70.0), Classification::InRange);
        assert_eq!(band(170.0), Classification::InRange);
        assert_eq!(band(170.1), Classification::CriticalHigh);
        assert_eq!(band(171.0), Classification::CriticalHigh);
    }

    #[test]
    fn missing_reading_is_unavailable() {
        assert_eq!(
            classify(None, NOW, &Thresholds::default()),
            Classification::Unavailable
        );
    }

    #[test]
    fn exactly_fifteen_minutes_old_is_fresh() {
        let reading = Reading::new(100.0, NOW - 15 * 60 * 1000);
        assert_eq!(
            classify(Some(&reading), NOW, &Thresholds::default()),
            Classification::InRange
        );
    }

    #[test]
    fn one_second_past_fifteen_minutes_is_stale() {
        let reading = Reading::new(100.0, NOW - (15 * 60 + 1) * 1000);
        assert_eq!(
            classify(Some(&reading), NOW, &Thresholds::default()),
            Classification::Unavailable
        );
    }

    #[test]
    fn stale_overrides_critical_values() {
        let reading = Reading::new(40.0, NOW - 60 * 60 * 1000);
        assert_eq!(
            classify(Some(&reading), NOW, &Thresholds::default()),
            Classification::Unavailable
        );
    }

    #[test]
    fn future_timestamp_is_fresh() {
        let reading = Reading::new(250.0, NOW + 30_000);
        assert_eq!(
            classify(Some(&reading), NOW, &Thresholds::default()),
            Classification::CriticalHigh
        );
    }

    #[test]
    fn unusable_values_are_unavailable() {
        assert_eq!(band(0.0), Classification::Unavailable);
        assert_eq!(band(-5.0), Classification::Unavailable);
        assert_eq!(band(f64::NAN), Classification::Unavailable);
        assert_eq!(band(f64::INFINITY), Classification::Unavailable);
    }

    #[test]
    fn custom_thresholds() {
        let thresholds = Thresholds {
            low_mg_dl: 80.0,
            high_mg_dl: 140.0,
            stale_after: Duration::from_secs(60),
        };
        let at = |value: f64, age_ms: u64| {
            classify(Some(&Reading::new(value, NOW - age_ms)), NOW, &thresholds)
        };

        assert_eq!(at(75.0, 0), Classification::CriticalLow);
        assert_eq!(at(150.0, 0), Classification::CriticalHigh);
        assert_eq!(at(100.0, 60_000), Classification::InRange);
        assert_eq!(at(100.0, 61_000), Classification::Unavailable);
    }

    #[test]
    fn availability() {
        assert!(Classification::InRange.is_available());
        assert!(Classification::CriticalLow.is_available());
        assert!(!Classification::Unavailable.is_available());
    }
}
