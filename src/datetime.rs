//! # Date/time values for `.datetime()`
//!
//! Strings are converted either through a compiled format [`Template`] or
//! through the fixed ISO-like default grammar:
//!
//! ```text
//! 2017-03-10                  date
//! 12:34:56                    time without time zone
//! 12:34:56+03                 time with time zone
//! 2017-03-10 12:34:56         timestamp without time zone
//! 2017-03-10T12:34:56-03:30   timestamp with time zone
//! ```
//!
//! Both routes produce a [`Captured`] record of partial fields which
//! [`reconcile`] validates and turns into one of the five [`DateTime`]
//! variants. Years are astronomical-with-no-zero: `-1` is 1 BC.

pub mod template;

use std::{cmp::Ordering, fmt};

use once_cell::sync::Lazy;
use regex::Regex;

pub use template::Template;

/// Anything that can stand in for a JSON value once a query finishes.
pub trait Jsonable {
    /// Name reported by `.type()`.
    fn type_name(&self) -> &'static str;

    /// Canonical string rendering used in results.
    fn to_json(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: i64,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    pub hour: u32,
    pub minute: u32,
    /// Seconds including any fractional part
    pub second: f64,
}

/// A typed date/time value. Offsets are in minutes east of UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateTime {
    Date(Date),
    Time(Time),
    TimeTz(Time, i32),
    Timestamp(Date, Time),
    TimestampTz(Date, Time, i32),
}

impl Date {
    fn render(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year.abs(), self.month, self.day)
    }

    /// Days since 1970-01-01 in the proleptic Gregorian calendar.
    fn days_from_civil(&self) -> i64 {
        let y = if self.year < 0 { self.year + 1 } else { self.year };
        let (m, d) = (i64::from(self.month), i64::from(self.day));
        let y = if m <= 2 { y - 1 } else { y };
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + d - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }
}

impl Time {
    fn render(&self) -> String {
        let second = if self.second.fract() == 0.0 {
            format!("{:02}", self.second as u32)
        } else {
            format!("{:09.6}", self.second)
        };
        format!("{:02}:{:02}:{}", self.hour, self.minute, second)
    }

    fn seconds_of_day(&self) -> f64 {
        f64::from(self.hour * 3600 + self.minute * 60) + self.second
    }
}

fn render_offset(offset: i32) -> String {
    let sign = if offset < 0 { '-' } else { '+' };
    let magnitude = offset.unsigned_abs();
    format!("{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
}

fn era_suffix(date: &Date) -> &'static str {
    if date.year < 0 { " BC" } else { "" }
}

impl DateTime {
    /// Position on a single time line, for comparing values of one variant.
    fn instant(&self) -> f64 {
        const DAY: f64 = 86_400.0;
        match self {
            DateTime::Date(date) => date.days_from_civil() as f64 * DAY,
            DateTime::Time(time) => time.seconds_of_day(),
            DateTime::TimeTz(time, offset) => time.seconds_of_day() - f64::from(offset * 60),
            DateTime::Timestamp(date, time) => {
                date.days_from_civil() as f64 * DAY + time.seconds_of_day()
            }
            DateTime::TimestampTz(date, time, offset) => {
                date.days_from_civil() as f64 * DAY + time.seconds_of_day()
                    - f64::from(offset * 60)
            }
        }
    }

    fn same_variant(&self, other: &DateTime) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Orders two values of the same variant; `None` across variants.
    pub fn compare(&self, other: &DateTime) -> Option<Ordering> {
        if !self.same_variant(other) {
            return None;
        }
        self.instant().partial_cmp(&other.instant())
    }
}

impl Jsonable for DateTime {
    fn type_name(&self) -> &'static str {
        match self {
            DateTime::Date(_) => "date",
            DateTime::Time(_) => "time without time zone",
            DateTime::TimeTz(..) => "time with time zone",
            DateTime::Timestamp(..) => "timestamp without time zone",
            DateTime::TimestampTz(..) => "timestamp with time zone",
        }
    }

    fn to_json(&self) -> String {
        match self {
            DateTime::Date(date) => format!("{}{}", date.render(), era_suffix(date)),
            DateTime::Time(time) => time.render(),
            DateTime::TimeTz(time, offset) => {
                format!("{}{}", time.render(), render_offset(*offset))
            }
            DateTime::Timestamp(date, time) => {
                format!("{}T{}{}", date.render(), time.render(), era_suffix(date))
            }
            DateTime::TimestampTz(date, time, offset) => format!(
                "{}T{}{}{}",
                date.render(),
                time.render(),
                render_offset(*offset),
                era_suffix(date)
            ),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

// ========================================
// Captured fields and reconciliation
// ========================================

/// Partial fields matched from an input string. Repeated contributions to
/// one field are summed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captured {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<f64>,
    pub tzh: Option<i64>,
    pub tzm: Option<i64>,
    pub era: Option<i64>,
    /// Set when the time-zone hour carried a minus sign, so `-00:30` keeps
    /// its direction.
    pub tz_negative: bool,
}

fn add<T: std::ops::Add<Output = T> + Copy>(slot: &mut Option<T>, value: T) {
    *slot = Some(match *slot {
        Some(existing) => existing + value,
        None => value,
    });
}

impl Captured {
    pub fn add_year(&mut self, n: i64) {
        add(&mut self.year, n);
    }
    pub fn add_month(&mut self, n: i64) {
        add(&mut self.month, n);
    }
    pub fn add_day(&mut self, n: i64) {
        add(&mut self.day, n);
    }
    pub fn add_hour(&mut self, n: i64) {
        add(&mut self.hour, n);
    }
    pub fn add_minute(&mut self, n: i64) {
        add(&mut self.minute, n);
    }
    pub fn add_second(&mut self, n: f64) {
        add(&mut self.second, n);
    }
    pub fn add_tzh(&mut self, n: i64) {
        add(&mut self.tzh, n);
    }
    pub fn add_tzm(&mut self, n: i64) {
        add(&mut self.tzm, n);
    }
    pub fn add_era(&mut self, n: i64) {
        add(&mut self.era, n);
    }
}

fn is_leap_year(year: i64) -> bool {
    let y = if year < 0 { year + 1 } else { year };
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> Option<i64> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if is_leap_year(year) => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Validates captured fields and picks the variant from the fields present.
///
/// Returns `None` for any calendar or clock violation.
pub fn reconcile(captured: &Captured) -> Option<DateTime> {
    let has_date = captured.year.is_some()
        || captured.month.is_some()
        || captured.day.is_some()
        || captured.era.is_some();
    let has_time =
        captured.hour.is_some() || captured.minute.is_some() || captured.second.is_some();

    let date = if has_date {
        let mut year = captured.year.unwrap_or(0) * captured.era.unwrap_or(1);
        let month = captured.month.unwrap_or(1);
        let day = captured.day.unwrap_or(1);
        if year == 0 {
            year = -1;
        }
        // Julian day zero
        if (year, month, day) < (-4714, 11, 24) {
            return None;
        }
        let last_day = days_in_month(year, month)?;
        if day < 1 || day > last_day {
            return None;
        }
        Some(Date {
            year,
            month: month as u32,
            day: day as u32,
        })
    } else {
        None
    };

    if !has_time {
        return date.map(DateTime::Date);
    }

    let hour = captured.hour.unwrap_or(0);
    let minute = captured.minute.unwrap_or(0);
    // microsecond precision, truncated
    let second = (captured.second.unwrap_or(0.0) * 1e6 + 1e-3).floor() / 1e6;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0.0..60.0).contains(&second) {
        return None;
    }
    let time = Time {
        hour: hour as u32,
        minute: minute as u32,
        second,
    };

    if captured.tzh.is_none() && captured.tzm.is_none() {
        return Some(match date {
            Some(date) => DateTime::Timestamp(date, time),
            None => DateTime::Time(time),
        });
    }

    let tzh = captured.tzh.unwrap_or(0);
    let tzm = captured.tzm.unwrap_or(0);
    if !(0..60).contains(&tzm) || tzh.abs() > 15 {
        return None;
    }
    let magnitude = (tzh.abs() * 60 + tzm) as i32;
    let offset = if captured.tz_negative || tzh < 0 {
        -magnitude
    } else {
        magnitude
    };
    Some(match date {
        Some(date) => DateTime::TimestampTz(date, time, offset),
        None => DateTime::TimeTz(time, offset),
    })
}

// ========================================
// Default grammar
// ========================================

const DATE: &str = r"(?:([+\-]?\d{1,4})-(\d{1,2})-(\d{1,2}))";
const TIME: &str = r"(?:(\d{1,2}):(\d{1,2}):(\d{1,2}(?:\.\d+)?))";
const TZ: &str = r"(?:((?:\s+|[+\-])\d{1,2})(?::(\d{1,2}))?)";

static DATETIME_TZ: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{DATE}(?:(?:\s+|T){TIME}{TZ}?)?\s*$")).ok()
});

static TIME_TZ: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(&format!(r"^\s*{TIME}{TZ}?\s*$")).ok());

fn capture_time(captured: &mut Captured, groups: &[Option<&str>]) -> Option<()> {
    let &[hour, minute, second, tzh, tzm] = groups else {
        return None;
    };
    captured.add_hour(hour?.parse().ok()?);
    captured.add_minute(minute?.parse().ok()?);
    captured.add_second(second?.parse().ok()?);
    if let Some(tzh) = tzh {
        let tzh = tzh.trim();
        captured.tz_negative = tzh.starts_with('-');
        captured.add_tzh(tzh.parse().ok()?);
        captured.add_tzm(tzm.map_or(Ok(0), str::parse).ok()?);
    }
    Some(())
}

/// Matches `value` against the default date/time grammar.
pub fn capture_default(value: &str) -> Option<Captured> {
    let mut captured = Captured::default();
    let datetime_tz = DATETIME_TZ.as_ref()?;
    let time_tz = TIME_TZ.as_ref()?;

    if let Some(caps) = datetime_tz.captures(value) {
        let group = |i: usize| caps.get(i).map(|m| m.as_str());
        captured.add_year(group(1)?.parse().ok()?);
        captured.add_month(group(2)?.parse().ok()?);
        captured.add_day(group(3)?.parse().ok()?);
        if group(4).is_some() {
            let groups: Vec<_> = (4..=8).map(group).collect();
            capture_time(&mut captured, &groups)?;
        }
    } else if let Some(caps) = time_tz.captures(value) {
        let groups: Vec<_> = (1..=5).map(|i| caps.get(i).map(|m| m.as_str())).collect();
        capture_time(&mut captured, &groups)?;
    }
    Some(captured)
}

/// Converts a string to a date/time value.
///
/// # Examples
///
/// ```
/// use sqljson_path::datetime::{self, Jsonable, Template};
///
/// let value = datetime::parse("2017-03-10 12:34:56+3:10", None).unwrap();
/// assert_eq!(value.to_json(), "2017-03-10T12:34:56+03:10");
///
/// let template = Template::compile("dd.mm.yyyy").unwrap();
/// let value = datetime::parse("13.12.2011", Some(&template)).unwrap();
/// assert_eq!(value.type_name(), "date");
/// ```
pub fn parse(value: &str, template: Option<&Template>) -> Option<DateTime> {
    let captured = match template {
        Some(template) => template.captures(value)?,
        None => capture_default(value)?,
    };
    reconcile(&captured)
}
