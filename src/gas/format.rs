//! Fee and timestamp rendering.

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use chrono::{DateTime, TimeZone};

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Wei to gwei with two decimals: `30000000000` → `"30.00"`.
pub fn format_gwei(wei: U256) -> String {
    let gwei = format_units(wei, "gwei")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    format!("{:.2}", gwei)
}

/// Numeric value of a rendered gwei string.
pub fn parse_gwei(rendered: &str) -> Option<f64> {
    rendered.trim().parse().ok()
}

/// 24-hour wall clock stamp, `YYYY/MM/DD HH:MM:SS`.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(&chrono::Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_gwei() {
        assert_eq!(format_gwei(U256::from(30_000_000_000u64)), "30.00");
        assert_eq!(format_gwei(U256::from(1_234_567_890u64)), "1.23");
        assert_eq!(format_gwei(U256::from(999_000_000u64)), "1.00");
        assert_eq!(format_gwei(U256::ZERO), "0.00");
    }

    #[test]
    fn test_gwei_reparses_to_same_value() {
        let rendered = format_gwei(U256::from(30_000_000_000u64));
        let value = parse_gwei(&rendered).unwrap();
        assert_eq!(format!("{:.2}", value), rendered);
        assert!((value - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timestamp_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 42).unwrap();
        assert_eq!(format_timestamp(&at), "2024/03/09 17:05:42");
    }
}
