use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::JulianDay;

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Days from 0000-03-01 to 1970-01-01 in the proleptic Gregorian calendar.
const UNIX_EPOCH_DAY_OFFSET: i64 = 719_468;
const DAYS_PER_ERA: i64 = 146_097;

/// 100,000,000 days either side of the Unix epoch.
const MAX_EPOCH_MS: i128 = 8_640_000_000_000_000;
/// Keeps the millisecond-of-day sum well inside `i64`.
const MAX_SHIFT_MS: f64 = 1.0e18;

/// A civil date and time as written on a birth record.
///
/// Fields are deliberately not range-checked: a month of 13 or an hour of 25
/// carries into the next year or day when the value is converted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalDateTime {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    /// Seconds with the fractional part carrying milliseconds.
    #[serde(default)]
    pub second: f64,
}

impl LocalDateTime {
    pub fn new(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: f64) -> Self {
        LocalDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn ymd_hm(year: i32, month: i32, day: i32, hour: i32, minute: i32) -> Self {
        LocalDateTime::new(year, month, day, hour, minute, 0.0)
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        LocalDateTime {
            year: dt.year(),
            month: dt.month() as i32,
            day: dt.day() as i32,
            hour: dt.hour() as i32,
            minute: dt.minute() as i32,
            second: dt.second() as f64 + dt.nanosecond() as f64 / 1_000_000_000.0,
        }
    }
}

/// Normalized UTC calendar fields, millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcFields {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

/// Shifts a local time by `utc_offset_hours` and returns the UTC calendar
/// fields, carrying overflow across days, months and years.
///
/// Returns `None` when the offset or seconds are not finite, or when the
/// result lies more than 100,000,000 days from 1970-01-01.
pub fn utc_fields(local: &LocalDateTime, utc_offset_hours: f64) -> Option<UtcFields> {
    let month0 = i64::from(local.month) - 1;
    let year = i64::from(local.year) + month0.div_euclid(12);
    let month = month0.rem_euclid(12) + 1;
    let mut days = days_from_civil(year, month, 1) + i64::from(local.day) - 1;

    let offset_ms = whole_milliseconds(utc_offset_hours * MS_PER_HOUR as f64)?;
    let second_ms = whole_milliseconds(local.second * 1000.0)?;
    let ms_of_day = i64::from(local.hour) * MS_PER_HOUR
        + i64::from(local.minute) * MS_PER_MINUTE
        + second_ms
        - offset_ms;

    days += ms_of_day.div_euclid(MS_PER_DAY);
    let ms = ms_of_day.rem_euclid(MS_PER_DAY);
    if (i128::from(days) * i128::from(MS_PER_DAY) + i128::from(ms)).abs() > MAX_EPOCH_MS {
        return None;
    }
    let (year, month, day) = civil_from_days(days);

    Some(UtcFields {
        year,
        month,
        day,
        hour: (ms / MS_PER_HOUR) as u32,
        minute: (ms % MS_PER_HOUR / MS_PER_MINUTE) as u32,
        second: (ms % MS_PER_MINUTE / 1000) as u32,
        millisecond: (ms % 1000) as u32,
    })
}

/// Truncates toward zero; `None` for values that cannot be a time shift.
fn whole_milliseconds(value: f64) -> Option<i64> {
    let whole = value.trunc();
    (whole.is_finite() && whole.abs() <= MAX_SHIFT_MS).then_some(whole as i64)
}

/// Converts a local civil time with a numeric UTC offset into a Julian Day (UT).
///
/// No timezone database is consulted and no DST rule applied; the offset is
/// taken as given. The calendar is always proleptic Gregorian. An instant
/// outside the representable range yields `NaN`.
pub fn to_julian_day(local: &LocalDateTime, utc_offset_hours: f64) -> JulianDay {
    utc_fields(local, utc_offset_hours).map_or(f64::NAN, |fields| julian_day_from_fields(&fields))
}

pub fn julian_day_from_utc(date_time: DateTime<Utc>) -> JulianDay {
    julian_day_from_fields(&UtcFields {
        year: i64::from(date_time.year()),
        month: date_time.month(),
        day: date_time.day(),
        hour: date_time.hour(),
        minute: date_time.minute(),
        second: date_time.second(),
        millisecond: date_time.timestamp_subsec_millis(),
    })
}

/// Meeus, Astronomical Algorithms ch. 7, Gregorian branch.
pub fn julian_day_from_fields(fields: &UtcFields) -> JulianDay {
    let mut year = fields.year as f64;
    let mut month = f64::from(fields.month);
    if fields.month <= 2 {
        year -= 1.0;
        month += 12.0;
    }

    let second = f64::from(fields.second) + f64::from(fields.millisecond) / 1000.0;
    let day_fraction =
        (f64::from(fields.hour) + (f64::from(fields.minute) + second / 60.0) / 60.0) / 24.0;
    let day = f64::from(fields.day) + day_fraction;

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b - 1524.5
}

fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * DAYS_PER_ERA + doe - UNIX_EPOCH_DAY_OFFSET
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + UNIX_EPOCH_DAY_OFFSET;
    let era = z.div_euclid(DAYS_PER_ERA);
    let doe = z - era * DAYS_PER_ERA;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn test_j2000_epoch() {
        let jd = to_julian_day(&LocalDateTime::ymd_hm(2000, 1, 1, 12, 0), 0.0);
        assert_eq!(jd, 2451545.0);
    }

    #[test]
    fn test_meeus_reference_dates() {
        // 1987 June 19.5
        let jd = to_julian_day(&LocalDateTime::ymd_hm(1987, 6, 19, 12, 0), 0.0);
        assert_eq!(jd, 2446966.0);

        // Sputnik launch, 1957 October 4.81
        let jd = to_julian_day(&LocalDateTime::new(1957, 10, 4, 19, 26, 24.0), 0.0);
        assert_abs_diff_eq!(jd, 2436116.31, epsilon = 1e-6);
    }

    #[test]
    fn test_fractional_offset_matches_shifted_utc() {
        let local = LocalDateTime::ymd_hm(1990, 6, 15, 14, 30);
        let utc = LocalDateTime::ymd_hm(1990, 6, 15, 9, 0);
        assert_eq!(to_julian_day(&local, 5.5), to_julian_day(&utc, 0.0));
    }

    #[test]
    fn test_offset_rolls_back_across_new_year() {
        let fields = utc_fields(&LocalDateTime::ymd_hm(1990, 1, 1, 2, 0), 5.5).unwrap();
        assert_eq!(
            fields,
            UtcFields {
                year: 1989,
                month: 12,
                day: 31,
                hour: 20,
                minute: 30,
                second: 0,
                millisecond: 0,
            }
        );
    }

    #[test]
    fn test_negative_offset_rolls_forward() {
        let fields = utc_fields(&LocalDateTime::ymd_hm(2024, 2, 28, 20, 0), -8.0).unwrap();
        assert_eq!((fields.year, fields.month, fields.day, fields.hour), (2024, 2, 29, 4));

        let fields = utc_fields(&LocalDateTime::ymd_hm(2023, 2, 28, 20, 0), -8.0).unwrap();
        assert_eq!((fields.year, fields.month, fields.day, fields.hour), (2023, 3, 1, 4));
    }

    #[test]
    fn test_out_of_range_fields_carry_over() {
        let thirteenth = to_julian_day(&LocalDateTime::ymd_hm(2020, 13, 1, 0, 0), 0.0);
        let january = to_julian_day(&LocalDateTime::ymd_hm(2021, 1, 1, 0, 0), 0.0);
        assert_eq!(thirteenth, january);

        let day_zero = utc_fields(&LocalDateTime::ymd_hm(2021, 3, 0, 0, 0), 0.0).unwrap();
        assert_eq!((day_zero.month, day_zero.day), (2, 28));

        let hour_25 = utc_fields(&LocalDateTime::ymd_hm(2021, 12, 31, 25, 0), 0.0).unwrap();
        assert_eq!((hour_25.year, hour_25.month, hour_25.day, hour_25.hour), (2022, 1, 1, 1));

        let month_zero = utc_fields(&LocalDateTime::ymd_hm(2021, 0, 15, 0, 0), 0.0).unwrap();
        assert_eq!((month_zero.year, month_zero.month), (2020, 12));
    }

    #[test]
    fn test_unrepresentable_shift_gives_nan() {
        let noon = LocalDateTime::ymd_hm(2000, 1, 1, 12, 0);
        assert!(to_julian_day(&noon, -3.0e12).is_nan());
        assert!(to_julian_day(&noon, f64::NEG_INFINITY).is_nan());
        assert!(to_julian_day(&noon, f64::NAN).is_nan());
        assert!(to_julian_day(&LocalDateTime::new(2000, 1, 1, 12, 0, 1.0e17), 0.0).is_nan());
        assert!(to_julian_day(&LocalDateTime::new(2000, 1, 1, 12, 0, f64::INFINITY), 0.0).is_nan());
        assert_eq!(utc_fields(&noon, f64::INFINITY), None);
    }

    #[test]
    fn test_extreme_fields_do_not_overflow() {
        let far = LocalDateTime::new(i32::MAX, i32::MAX, i32::MAX, i32::MAX, i32::MAX, 0.0);
        assert!(to_julian_day(&far, 0.0).is_nan());
        let early = LocalDateTime::new(i32::MIN, i32::MIN, i32::MIN, i32::MIN, i32::MIN, -1.0e15);
        assert!(to_julian_day(&early, 1.0e11).is_nan());
    }

    #[test]
    fn test_date_range_edges() {
        let last = utc_fields(&LocalDateTime::ymd_hm(275760, 9, 13, 0, 0), 0.0).unwrap();
        assert_eq!((last.year, last.month, last.day), (275760, 9, 13));
        assert_eq!(utc_fields(&LocalDateTime::ymd_hm(275760, 9, 13, 0, 1), 0.0), None);

        let first = utc_fields(&LocalDateTime::ymd_hm(-271821, 4, 20, 0, 0), 0.0).unwrap();
        assert_eq!((first.year, first.month, first.day), (-271821, 4, 20));
        assert_eq!(utc_fields(&LocalDateTime::ymd_hm(-271821, 4, 19, 23, 59), 0.0), None);

        // a large offset can bring an out-of-range local time back in range
        let shifted = utc_fields(&LocalDateTime::ymd_hm(275760, 9, 14, 0, 0), 24.0).unwrap();
        assert_eq!((shifted.month, shifted.day, shifted.hour), (9, 13, 0));
    }

    #[test]
    fn test_consecutive_days_differ_by_one() {
        let feb29 = to_julian_day(&LocalDateTime::ymd_hm(2024, 2, 29, 0, 0), 0.0);
        let mar1 = to_julian_day(&LocalDateTime::ymd_hm(2024, 3, 1, 0, 0), 0.0);
        assert_eq!(mar1 - feb29, 1.0);
    }

    #[test]
    fn test_milliseconds_enter_day_fraction() {
        let fields = utc_fields(&LocalDateTime::new(2000, 1, 1, 12, 0, 30.25), 0.0).unwrap();
        assert_eq!((fields.second, fields.millisecond), (30, 250));
        let jd = julian_day_from_fields(&fields);
        assert_abs_diff_eq!(jd, 2451545.0 + 30.25 / 86_400.0, epsilon = 1e-8);
    }

    #[test]
    fn test_chrono_utc_agrees_with_local_fields() {
        let dt = Utc.with_ymd_and_hms(1991, 6, 18, 7, 10, 0).unwrap();
        let local = LocalDateTime::from(dt.naive_utc());
        assert_eq!(julian_day_from_utc(dt), to_julian_day(&local, 0.0));
    }

    #[test]
    fn test_civil_day_round_trip() {
        for days in [-719_468, -1, 0, 1, 10_957, 11_016, 2_932_896] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, i64::from(m), i64::from(d)), days);
        }
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }
}
