use crate::domain::model::Value;
use crate::domain::params::Granularity;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Reads a cell as a calendar date. Returns `None` for nulls and anything
/// that is not recognizably a date.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_str(s.trim()),
        // 整數視為 YYYYMMDD
        Value::Number(n) if n.fract() == 0.0 && (10_000_101.0..=99_991_231.0).contains(n) => {
            parse_compact_date(&format!("{}", *n as i64))
        }
        Value::Number(_) | Value::Null => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    parse_compact_date(s)
}

fn parse_compact_date(s: &str) -> Option<NaiveDateTime> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

/// Label of the bucket `ts` falls into. Weeks run Monday to Sunday and are
/// labelled by their closing Sunday; every other granularity is labelled by
/// its first day.
pub fn bucket_label(ts: NaiveDateTime, granularity: Granularity) -> Option<NaiveDate> {
    let date = ts.date();
    match granularity {
        Granularity::Day => Some(date),
        Granularity::Week => {
            let to_sunday = 6 - date.weekday().num_days_from_monday();
            date.checked_add_days(Days::new(u64::from(to_sunday)))
        }
        Granularity::Month => date.with_day(1),
        Granularity::Quarter => {
            let first_month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), first_month, 1)
        }
        Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    }
}

pub fn next_label(label: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => label.checked_add_days(Days::new(1)),
        Granularity::Week => label.checked_add_days(Days::new(7)),
        Granularity::Month => label.checked_add_months(Months::new(1)),
        Granularity::Quarter => label.checked_add_months(Months::new(3)),
        Granularity::Year => label.checked_add_months(Months::new(12)),
    }
}
