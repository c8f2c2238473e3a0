//! Time handling for gridded time series.
//!
//! Source datasets store their time axis as numeric offsets with CF-style
//! `"<unit> since <reference>"` units. Output frames are named after the
//! timestamp truncated to whole seconds.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{FrameError, FrameResult};

/// Calendars whose day arithmetic matches chrono's proleptic Gregorian.
const SUPPORTED_CALENDARS: &[&str] = &["standard", "gregorian", "proleptic_gregorian"];

/// Parsed CF time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    /// Length of one unit in milliseconds
    pub unit_millis: i64,
    /// Reference instant
    pub epoch: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parse a units string such as `"hours since 1900-01-01 00:00:00.0"`.
    pub fn parse(units: &str) -> FrameResult<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| FrameError::InvalidTime(format!("units without 'since': {units}")))?;

        let unit_millis = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1_000,
            "minutes" | "minute" | "mins" | "min" => 60_000,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000,
            "days" | "day" | "d" => 86_400_000,
            other => {
                return Err(FrameError::InvalidTime(format!("unsupported time unit: {other}")))
            }
        };

        let epoch = parse_reference(reference.trim())?;
        Ok(Self { unit_millis, epoch })
    }

    /// Convert one numeric offset to an instant.
    pub fn to_datetime(&self, value: f64) -> FrameResult<NaiveDateTime> {
        if !value.is_finite() {
            return Err(FrameError::InvalidTime(format!("non-finite time value {value}")));
        }
        let millis = (value * self.unit_millis as f64).round();
        if millis.abs() > i64::MAX as f64 {
            return Err(FrameError::InvalidTime(format!("time value {value} out of range")));
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or_else(|| FrameError::InvalidTime(format!("time value {value} out of range")))
    }
}

fn parse_reference(s: &str) -> FrameResult<NaiveDateTime> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC").trim();

    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    // Date only (assume midnight)
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(FrameError::InvalidTime(format!("unparseable reference time: {s}")))
}

/// Decode a numeric time axis into instants.
pub fn decode_cf_times(
    values: &[f64],
    units: &str,
    calendar: Option<&str>,
) -> FrameResult<Vec<NaiveDateTime>> {
    if let Some(cal) = calendar {
        let cal = cal.trim().to_lowercase();
        if !SUPPORTED_CALENDARS.contains(&cal.as_str()) {
            return Err(FrameError::InvalidTime(format!("unsupported calendar: {cal}")));
        }
    }

    let units = CfTimeUnits::parse(units)?;
    values.iter().map(|&v| units.to_datetime(v)).collect()
}

/// Frame name stem: ISO timestamp at one-second resolution with the
/// time-of-day colons replaced by hyphens, e.g. `2021-11-01T06-00-00`.
///
/// Sub-second precision is dropped, so two instants within the same second
/// share a stem.
pub fn frame_stem(ts: &NaiveDateTime) -> String {
    let truncated = ts.with_nanosecond(0).unwrap_or(*ts);
    truncated.format("%Y-%m-%dT%H:%M:%S").to_string().replace(':', "-")
}

/// Frame file name, `<stem>.png`.
pub fn frame_file_name(ts: &NaiveDateTime) -> String {
    format!("{}.png", frame_stem(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_era5_hours_since_1900() {
        let units = CfTimeUnits::parse("hours since 1900-01-01 00:00:00.0").unwrap();
        assert_eq!(units.unit_millis, 3_600_000);
        assert_eq!(units.epoch, dt(1900, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_decode_seconds_since_epoch() {
        // 2021-11-01T00:00:00Z and six hours later
        let times = decode_cf_times(
            &[1_635_724_800.0, 1_635_746_400.0],
            "seconds since 1970-01-01",
            Some("proleptic_gregorian"),
        )
        .unwrap();
        assert_eq!(times[0], dt(2021, 11, 1, 0, 0, 0));
        assert_eq!(times[1], dt(2021, 11, 1, 6, 0, 0));
        assert_eq!(times[1].month(), 11);
    }

    #[test]
    fn test_decode_days_with_fraction() {
        let times = decode_cf_times(&[1.5], "days since 2023-01-01T00:00:00Z", None).unwrap();
        assert_eq!(times[0], dt(2023, 1, 2, 12, 0, 0));
    }

    #[test]
    fn test_rejects_noleap_calendar() {
        let err = decode_cf_times(&[0.0], "days since 2000-01-01", Some("noleap")).unwrap_err();
        assert!(matches!(err, FrameError::InvalidTime(_)));
    }

    #[test]
    fn test_rejects_units_without_since() {
        assert!(CfTimeUnits::parse("hours").is_err());
        assert!(CfTimeUnits::parse("fortnights since 2000-01-01").is_err());
    }

    #[test]
    fn test_frame_file_name_replaces_colons() {
        assert_eq!(frame_file_name(&dt(2021, 11, 1, 18, 0, 0)), "2021-11-01T18-00-00.png");
    }

    #[test]
    fn test_frame_stem_truncates_subseconds() {
        let ts = dt(2021, 12, 31, 23, 59, 59) + Duration::milliseconds(999);
        assert_eq!(frame_stem(&ts), "2021-12-31T23-59-59");
    }
}
