//! Format templates for `.datetime("...")`.
//!
//! A template such as `yyyy-mm-dd HH24:MI:SS` is split into field codes
//! and separators. Each field contributes one capturing group to a single
//! anchored regex and one parse step that adds its value to a
//! [`Captured`] record. Field codes are matched longest first, so `SSSS`
//! is never read as `SS` followed by `SS`.

use log::trace;
use regex::Regex;

use crate::datetime::Captured;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Hour24,
    Hour12,
    Minute,
    Second,
    /// Fractional second with the given number of digits
    Fraction(u32),
    SecondsOfDay,
    Meridiem,
    YearWithComma,
    Year,
    /// `YYY`, `YY`, `Y`: years below 1000 land in the 2000s
    PartialYear(u32),
    IsoYear(u32),
    Era,
    MonthName,
    Month,
    DayName,
    DayOfYear,
    Day,
    DayOfWeek,
    Week,
    Century,
    Julian,
    Quarter,
    RomanMonth,
    RomanMonthLower,
    TzHour,
    TzMinute,
    Ordinal,
}

/// Every spelling a field may be written in.
const KEYWORDS: &[(&str, Field)] = &[
    ("HH24", Field::Hour24),
    ("hh24", Field::Hour24),
    ("HH12", Field::Hour12),
    ("hh12", Field::Hour12),
    ("HH", Field::Hour12),
    ("hh", Field::Hour12),
    ("MI", Field::Minute),
    ("mi", Field::Minute),
    ("SS", Field::Second),
    ("ss", Field::Second),
    ("FF1", Field::Fraction(1)),
    ("ff1", Field::Fraction(1)),
    ("FF2", Field::Fraction(2)),
    ("ff2", Field::Fraction(2)),
    ("FF3", Field::Fraction(3)),
    ("ff3", Field::Fraction(3)),
    ("MS", Field::Fraction(3)),
    ("ms", Field::Fraction(3)),
    ("FF4", Field::Fraction(4)),
    ("ff4", Field::Fraction(4)),
    ("FF5", Field::Fraction(5)),
    ("ff5", Field::Fraction(5)),
    ("FF6", Field::Fraction(6)),
    ("ff6", Field::Fraction(6)),
    ("US", Field::Fraction(6)),
    ("us", Field::Fraction(6)),
    ("SSSSS", Field::SecondsOfDay),
    ("sssss", Field::SecondsOfDay),
    ("SSSS", Field::SecondsOfDay),
    ("ssss", Field::SecondsOfDay),
    ("AM", Field::Meridiem),
    ("am", Field::Meridiem),
    ("PM", Field::Meridiem),
    ("pm", Field::Meridiem),
    ("A.M.", Field::Meridiem),
    ("a.m.", Field::Meridiem),
    ("P.M.", Field::Meridiem),
    ("p.m.", Field::Meridiem),
    ("Y,YYY", Field::YearWithComma),
    ("y,yyy", Field::YearWithComma),
    ("YYYY", Field::Year),
    ("yyyy", Field::Year),
    ("YYY", Field::PartialYear(3)),
    ("yyy", Field::PartialYear(3)),
    ("YY", Field::PartialYear(2)),
    ("yy", Field::PartialYear(2)),
    ("Y", Field::PartialYear(1)),
    ("y", Field::PartialYear(1)),
    ("IYYY", Field::IsoYear(4)),
    ("iyyy", Field::IsoYear(4)),
    ("IYY", Field::IsoYear(3)),
    ("iyy", Field::IsoYear(3)),
    ("IY", Field::IsoYear(2)),
    ("iy", Field::IsoYear(2)),
    ("I", Field::IsoYear(1)),
    ("i", Field::IsoYear(1)),
    ("BC", Field::Era),
    ("bc", Field::Era),
    ("AD", Field::Era),
    ("ad", Field::Era),
    ("B.C.", Field::Era),
    ("b.c.", Field::Era),
    ("A.D.", Field::Era),
    ("a.d.", Field::Era),
    ("MONTH", Field::MonthName),
    ("Month", Field::MonthName),
    ("month", Field::MonthName),
    ("MON", Field::MonthName),
    ("Mon", Field::MonthName),
    ("mon", Field::MonthName),
    ("MM", Field::Month),
    ("mm", Field::Month),
    ("DAY", Field::DayName),
    ("Day", Field::DayName),
    ("day", Field::DayName),
    ("DY", Field::DayName),
    ("Dy", Field::DayName),
    ("dy", Field::DayName),
    ("DDD", Field::DayOfYear),
    ("ddd", Field::DayOfYear),
    ("IDDD", Field::DayOfYear),
    ("iddd", Field::DayOfYear),
    ("DD", Field::Day),
    ("dd", Field::Day),
    ("D", Field::DayOfWeek),
    ("d", Field::DayOfWeek),
    ("ID", Field::DayOfWeek),
    ("id", Field::DayOfWeek),
    ("W", Field::Week),
    ("w", Field::Week),
    ("WW", Field::Week),
    ("ww", Field::Week),
    ("IW", Field::Week),
    ("iw", Field::Week),
    ("CC", Field::Century),
    ("cc", Field::Century),
    ("J", Field::Julian),
    ("j", Field::Julian),
    ("Q", Field::Quarter),
    ("q", Field::Quarter),
    ("RM", Field::RomanMonth),
    ("rm", Field::RomanMonthLower),
    ("TZH", Field::TzHour),
    ("TZM", Field::TzMinute),
    ("TH", Field::Ordinal),
    ("th", Field::Ordinal),
];

const ROMAN_MONTHS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

impl Field {
    fn pattern(self) -> &'static str {
        match self {
            Field::Hour24 | Field::Hour12 | Field::Minute | Field::Second | Field::Month => {
                r"\d{1,2}"
            }
            Field::Day => r"\d{1,2}",
            Field::Fraction(1) => r"\d{1}",
            Field::Fraction(2) => r"\d{2}",
            Field::Fraction(3) => r"\d{3}",
            Field::Fraction(4) => r"\d{4}",
            Field::Fraction(5) => r"\d{5}",
            Field::Fraction(_) => r"\d{6}",
            Field::SecondsOfDay => r"\d{1,5}",
            Field::Meridiem => r"AM|am|PM|pm|A\.M\.|a\.m\.|P\.M\.|p\.m\.",
            Field::YearWithComma => r"[+\-]?\d,\d{3}",
            Field::Year => r"[+\-]?\d{4}",
            Field::PartialYear(3) => r"[+\-]?\d{3,4}",
            Field::PartialYear(2) => r"[+\-]?\d{2,4}",
            Field::PartialYear(_) => r"[+\-]?\d{1,4}",
            Field::IsoYear(4) => r"\d{4,}",
            Field::IsoYear(3) => r"\d{3}",
            Field::IsoYear(2) => r"\d{2}",
            Field::IsoYear(_) => r"\d",
            Field::Era => r"BC|bc|AD|ad|B\.C\.|b\.c\.|A\.D\.|a\.d\.",
            Field::MonthName | Field::DayName => r"\p{L}+",
            Field::DayOfYear => r"\d{1,3}",
            Field::DayOfWeek => r"[1-7]",
            Field::Week => r"\d{1,2}",
            Field::Century => r"\d{2}",
            Field::Julian => r"\d+",
            Field::Quarter => r"[1-4]",
            Field::RomanMonth => r"XII|XI|X|IX|VIII|VII|VI|V|IV|III|II|I",
            Field::RomanMonthLower => r"xii|xi|x|ix|viii|vii|vi|v|iv|iii|ii|i",
            Field::TzHour => r"[+\- ]?\d{1,2}",
            Field::TzMinute => r"\d{1,2}",
            Field::Ordinal => r"[Ss][Tt]|[Nn][Dd]|[Rr][Dd]|[Tt][Hh]",
        }
    }

    /// Adds the matched text to `captured`. `None` rejects the input.
    fn capture(self, text: &str, captured: &mut Captured) -> Option<()> {
        match self {
            Field::Hour24 => captured.add_hour(text.parse().ok()?),
            // 12 without a meridiem is midnight
            Field::Hour12 => {
                let n: i64 = text.parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                captured.add_hour(n % 12);
            }
            Field::Minute => captured.add_minute(text.parse().ok()?),
            Field::Second => captured.add_second(text.parse().ok()?),
            Field::Fraction(digits) => {
                let n: f64 = text.parse().ok()?;
                captured.add_second(n / 10f64.powi(digits as i32));
            }
            Field::SecondsOfDay => {
                let n: i64 = text.parse().ok()?;
                if n > 86_399 {
                    return None;
                }
                captured.add_hour(n / 3600);
                captured.add_minute(n / 60 % 60);
                captured.add_second((n % 60) as f64);
            }
            Field::Meridiem => {
                let am = text.replace('.', "").eq_ignore_ascii_case("am");
                captured.add_hour(if am { 0 } else { 12 });
            }
            Field::YearWithComma | Field::Year => {
                captured.add_year(text.replace(',', "").parse().ok()?)
            }
            Field::PartialYear(_) => {
                let n: i64 = text.parse().ok()?;
                captured.add_year(if (0..1000).contains(&n) { 2000 + n } else { n });
            }
            Field::Era => {
                let bc = text.replace('.', "").eq_ignore_ascii_case("bc");
                captured.add_era(if bc { -1 } else { 1 });
            }
            Field::Month => captured.add_month(text.parse().ok()?),
            Field::Day => captured.add_day(text.parse().ok()?),
            Field::Century => {
                let n: i64 = text.parse().ok()?;
                captured.add_year((n - 1) * 100 + 1);
            }
            Field::RomanMonth | Field::RomanMonthLower => {
                let upper = text.to_ascii_uppercase();
                let month = ROMAN_MONTHS.iter().position(|r| *r == upper)?;
                captured.add_month(month as i64 + 1);
            }
            Field::TzHour => {
                let text = text.trim();
                captured.tz_negative = text.starts_with('-');
                captured.add_tzh(text.parse().ok()?);
            }
            Field::TzMinute => captured.add_tzm(text.parse().ok()?),
            Field::Quarter | Field::Ordinal => {}
            Field::IsoYear(_)
            | Field::MonthName
            | Field::DayName
            | Field::DayOfYear
            | Field::DayOfWeek
            | Field::Week
            | Field::Julian => return None,
        }
        Some(())
    }
}

/// Finds the longest field code at the start of `rest`.
fn match_field(rest: &str) -> Option<(Field, usize)> {
    KEYWORDS
        .iter()
        .filter(|(spelling, _)| rest.starts_with(spelling))
        .max_by_key(|(spelling, _)| spelling.len())
        .map(|(spelling, field)| (*field, spelling.len()))
}

/// A compiled `.datetime()` format template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    regex: Regex,
    fields: Vec<Field>,
}

impl Template {
    /// Compiles a template; `None` when it contains anything other than
    /// field codes, separators (`- . / , ' ; :` and space) and quoted text.
    pub fn compile(template: &str) -> Option<Self> {
        let mut pattern = String::from(r"^\s*");
        let mut fields = Vec::new();
        let mut rest = template;

        while let Some(ch) = rest.chars().next() {
            // Fixed-format option; matching is always exact here
            if let Some(after) = rest.strip_prefix("FX") {
                rest = after;
                continue;
            }
            if let Some((field, len)) = match_field(rest) {
                pattern.push('(');
                pattern.push_str(field.pattern());
                pattern.push(')');
                fields.push(field);
                rest = &rest[len..];
                continue;
            }
            rest = &rest[ch.len_utf8()..];
            match ch {
                ' ' => pattern.push_str(r"\s+"),
                '-' | '.' | '/' | ',' | '\'' | ';' | ':' => {
                    pattern.push_str(&regex::escape(&ch.to_string()))
                }
                '"' => {
                    let mut literal = String::new();
                    let mut chars = rest.char_indices();
                    let end = loop {
                        match chars.next()? {
                            (i, '"') => break i,
                            (_, '\\') => literal.push(chars.next()?.1),
                            (_, c) => literal.push(c),
                        }
                    };
                    pattern.push_str(&regex::escape(&literal));
                    rest = &rest[end + 1..];
                }
                _ => return None,
            }
        }
        pattern.push_str(r"\s*$");

        trace!("datetime template {template:?} compiled to {pattern}");
        let regex = Regex::new(&pattern).ok()?;
        Some(Template {
            source: template.to_string(),
            regex,
            fields,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches `value` and collects the field contributions.
    pub fn captures(&self, value: &str) -> Option<Captured> {
        let caps = self.regex.captures(value)?;
        let mut captured = Captured::default();
        for (i, field) in self.fields.iter().enumerate() {
            let text = caps.get(i + 1)?.as_str();
            field.capture(text, &mut captured)?;
        }
        Some(captured)
    }
}
