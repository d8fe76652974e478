//! Glucose readings as delivered by a reading source.

use core::fmt;

/// Direction of the glucose trend reported alongside a reading.
///
/// Vendor codes are `1..=5` from falling quickly to rising quickly; anything
/// else maps to [`TrendArrow::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrendArrow {
    #[default]
    Unknown,
    FallingQuickly,
    Falling,
    Flat,
    Rising,
    RisingQuickly,
}

impl TrendArrow {
    /// Decode the vendor's numeric trend code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TrendArrow::FallingQuickly,
            2 => TrendArrow::Falling,
            3 => TrendArrow::Flat,
            4 => TrendArrow::Rising,
            5 => TrendArrow::RisingQuickly,
            _ => TrendArrow::Unknown,
        }
    }

    /// Returns a short symbol for log output.
    pub fn symbol(&self) -> &'static str {
        match self {
            TrendArrow::Unknown => "?",
            TrendArrow::FallingQuickly => "↓↓",
            TrendArrow::Falling => "↘",
            TrendArrow::Flat => "→",
            TrendArrow::Rising => "↗",
            TrendArrow::RisingQuickly => "↑↑",
        }
    }
}

impl fmt::Display for TrendArrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single glucose measurement.
///
/// Readings are immutable once obtained and consumed once per monitor cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Glucose concentration in mg/dL.
    pub value_mg_dl: f64,

    /// When the sensor took the measurement (Unix epoch milliseconds).
    pub timestamp_ms: u64,

    /// Trend reported with the measurement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trend: TrendArrow,
}

impl Reading {
    /// Create a reading with an unknown trend.
    pub const fn new(value_mg_dl: f64, timestamp_ms: u64) -> Self {
        Self {
            value_mg_dl,
            timestamp_ms,
            trend: TrendArrow::Unknown,
        }
    }

    /// Attach a trend arrow.
    pub const fn with_trend(mut self, trend: TrendArrow) -> Self {
        self.trend = trend;
        self
    }

    /// Age of the reading relative to `now_ms`, in milliseconds.
    ///
    /// Readings stamped in the future (clock skew) have age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_codes_decode() {
        assert_eq!(TrendArrow::from_code(1), TrendArrow::FallingQuickly);
        assert_eq!(TrendArrow::from_code(3), TrendArrow::Flat);
        assert_eq!(TrendArrow::from_code(5), TrendArrow::RisingQuickly);
        assert_eq!(TrendArrow::from_code(0), TrendArrow::Unknown);
        assert_eq!(TrendArrow::from_code(42), TrendArrow::Unknown);
    }

    #[test]
    fn age_saturates_for_future_timestamps() {
        let reading = Reading::new(100.0, 10_000);
        assert_eq!(reading.age_ms(15_000), 5_000);
        assert_eq!(reading.age_ms(5_000), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_trend_defaults_to_unknown() {
        let json = r#"{"value_mg_dl":98.0,"timestamp_ms":1703160000000}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.trend, TrendArrow::Unknown);
        assert_eq!(reading.value_mg_dl, 98.0);
    }
}
