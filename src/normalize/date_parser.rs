use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}").expect("date prefix pattern is valid"));

static DATE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Date\(\s*(-?\d+(?:\s*,\s*-?\d+){2,5})\s*\)$").expect("Date() pattern is valid")
});

/// `true` when `s` already starts like `15.06.2025`.
pub fn has_day_month_year_prefix(s: &str) -> bool {
    DAY_MONTH_YEAR.is_match(s)
}

/// Build a date-time from `(year, month0, day[, hour, minute, second])`.
///
/// Out-of-range parts roll over into the next unit, so month 12 is January
/// of the following year and day 0 is the last day of the previous month.
/// Parts past the sixth are ignored.
pub fn datetime_from_parts(parts: &[f64]) -> Option<NaiveDateTime> {
    if parts.len() < 3 || parts.iter().any(|p| !p.is_finite()) {
        return None;
    }
    let part = |i: usize| parts.get(i).map_or(0, |p| p.trunc() as i64);

    let months = part(0).checked_mul(12)?.checked_add(part(1))?;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;

    let offset = Duration::try_days(part(2).checked_sub(1)?)?
        .checked_add(&Duration::try_hours(part(3))?)?
        .checked_add(&Duration::try_minutes(part(4))?)?
        .checked_add(&Duration::try_seconds(part(5))?)?;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(offset)
}

/// Parse `Date(y,m,d[,h,mi,s])` with a zero-based month.
pub fn parse_date_call(s: &str) -> Option<NaiveDateTime> {
    let caps = DATE_CALL.captures(s.trim())?;
    let parts = caps[1]
        .split(',')
        .map(|p| p.trim().parse::<i64>().map(|n| n as f64))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    datetime_from_parts(&parts)
}

/// `DD.MM.YYYY`, plus ` HH:MM:SS` unless the time is midnight.
pub fn format_display(dt: &NaiveDateTime) -> String {
    let time = dt.format("%H:%M:%S").to_string();
    if time == "00:00:00" {
        dt.format("%d.%m.%Y").to_string()
    } else {
        format!("{} {}", dt.format("%d.%m.%Y"), time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(parts: &[f64]) -> Option<String> {
        datetime_from_parts(parts).map(|dt| format_display(&dt))
    }

    #[test]
    fn zero_based_month() {
        assert_eq!(show(&[2025.0, 5.0, 15.0, 0.0, 0.0, 0.0]).as_deref(), Some("15.06.2025"));
        assert_eq!(show(&[2025.0, 0.0, 1.0]).as_deref(), Some("01.01.2025"));
    }

    #[test]
    fn keeps_time_unless_midnight() {
        assert_eq!(
            show(&[2023.0, 10.0, 26.0, 14.0, 5.0, 9.0]).as_deref(),
            Some("26.11.2023 14:05:09")
        );
        assert_eq!(
            show(&[2023.0, 10.0, 26.0, 0.0, 0.0, 1.0]).as_deref(),
            Some("26.11.2023 00:00:01")
        );
    }

    #[test]
    fn overflow_rolls_over() {
        assert_eq!(show(&[2024.0, 12.0, 1.0]).as_deref(), Some("01.01.2025"));
        assert_eq!(show(&[2024.0, 2.0, 0.0]).as_deref(), Some("29.02.2024"));
        assert_eq!(show(&[2024.0, 0.0, 31.0, 24.0]).as_deref(), Some("01.02.2024"));
    }

    #[test]
    fn rejects_short_or_non_finite() {
        assert_eq!(show(&[2024.0, 1.0]), None);
        assert_eq!(show(&[2024.0, f64::NAN, 1.0]), None);
        assert_eq!(show(&[1e18, 0.0, 1.0]), None);
    }

    #[test]
    fn date_call_strings() {
        let dt = parse_date_call("Date(2025,5,15)").unwrap();
        assert_eq!(format_display(&dt), "15.06.2025");
        let dt = parse_date_call("Date(2025, 5, 15, 8, 30, 0)").unwrap();
        assert_eq!(format_display(&dt), "15.06.2025 08:30:00");

        for bad in ["Date(2025,5)", "Date()", "Date(a,b,c)", "Date(2025,5,15", "Date(1,2,3,4,5,6,7)"] {
            assert_eq!(parse_date_call(bad), None, "{bad}");
        }
    }

    #[test]
    fn prefix_pattern() {
        assert!(has_day_month_year_prefix("15.06.2025"));
        assert!(has_day_month_year_prefix("15.06.2025 10:00:00"));
        assert!(!has_day_month_year_prefix("2025-06-15"));
        assert!(!has_day_month_year_prefix("5.6.2025"));
    }
}
