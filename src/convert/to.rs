use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use super::ValueTo;
use super::models::{DurationComponents, PeriodComponents, Primitive, amount};
use crate::error::{Error, Result};
use crate::value::iso_string;

/// Plain string coercion of primitives.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrimitiveValueTo;

impl ValueTo<Primitive> for PrimitiveValueTo {
    fn can_handle(&self, _value: &Primitive) -> bool {
        true
    }

    fn serialize_value(&self, value: &Primitive) -> String {
        value.to_string()
    }
}

/// ISO-8601 instants with millisecond precision: `2024-01-01T00:00:00.000Z`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoDateValueTo;

impl ValueTo<DateTime<Utc>> for IsoDateValueTo {
    fn can_handle(&self, _value: &DateTime<Utc>) -> bool {
        true
    }

    fn serialize_value(&self, value: &DateTime<Utc>) -> String {
        iso_string(value)
    }
}

/// Whole seconds since the Unix epoch, rounded down.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixTimestampValueTo;

impl ValueTo<DateTime<Utc>> for UnixTimestampValueTo {
    fn can_handle(&self, _value: &DateTime<Utc>) -> bool {
        true
    }

    fn serialize_value(&self, value: &DateTime<Utc>) -> String {
        itoa::Buffer::new().format(value.timestamp()).to_string()
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct MsTimestampValueTo;

impl ValueTo<DateTime<Utc>> for MsTimestampValueTo {
    fn can_handle(&self, _value: &DateTime<Utc>) -> bool {
        true
    }

    fn serialize_value(&self, value: &DateTime<Utc>) -> String {
        itoa::Buffer::new()
            .format(value.timestamp_millis())
            .to_string()
    }
}

/// Dates rendered with a `strftime`-style pattern.
///
/// ```
/// use params_qs::convert::{FormattedDateValueTo, ValueTo};
/// use chrono::{TimeZone, Utc};
///
/// let to = FormattedDateValueTo::new("%d/%m/%Y").unwrap();
/// let date = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
/// assert_eq!(to.serialize_value(&date), "09/03/2024");
/// assert!(FormattedDateValueTo::new("%Q").is_err());
/// ```
#[derive(Clone, Debug)]
pub struct FormattedDateValueTo {
    pattern: String,
}

impl FormattedDateValueTo {
    pub const DEFAULT_PATTERN: &'static str = "%Y-%m-%d";

    /// Creates the strategy, rejecting patterns with unknown specifiers.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidDateFormat(pattern));
        }
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for FormattedDateValueTo {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
        }
    }
}

impl ValueTo<DateTime<Utc>> for FormattedDateValueTo {
    fn can_handle(&self, _value: &DateTime<Utc>) -> bool {
        true
    }

    fn serialize_value(&self, value: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(self.pattern.len() + 8);
        // the pattern was validated on construction
        let _ = write!(out, "{}", value.format(&self.pattern));
        out
    }
}

/// Renders seconds plus milliseconds as one decimal amount, e.g. `1.5`.
fn seconds_literal(seconds: Option<i64>, milliseconds: Option<i64>) -> Option<String> {
    let total = i128::from(amount(seconds)) * 1000 + i128::from(amount(milliseconds));
    if total == 0 {
        return None;
    }
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let (whole, frac) = (abs / 1000, abs % 1000);
    if frac == 0 {
        Some(format!("{sign}{whole}"))
    } else {
        let frac = format!("{frac:03}");
        Some(format!("{sign}{whole}.{}", frac.trim_end_matches('0')))
    }
}

fn push_segment(out: &mut String, component: Option<i64>, designator: char) {
    let n = amount(component);
    if n != 0 {
        out.push_str(itoa::Buffer::new().format(n));
        out.push(designator);
    }
}

fn calendar_part(years: Option<i64>, months: Option<i64>, weeks: Option<i64>, days: Option<i64>) -> String {
    let mut out = String::new();
    push_segment(&mut out, years, 'Y');
    push_segment(&mut out, months, 'M');
    push_segment(&mut out, weeks, 'W');
    push_segment(&mut out, days, 'D');
    out
}

/// ISO-8601 durations: `P1Y2M3DT4H5M6.5S`, or `PT0S` when empty.
///
/// Declines durations that only carry calendar fields; those belong to
/// a period serializer.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoDurationValueTo;

impl ValueTo<DurationComponents> for IsoDurationValueTo {
    fn can_handle(&self, value: &DurationComponents) -> bool {
        value.has_time_fields() || !value.has_calendar_fields()
    }

    fn serialize_value(&self, value: &DurationComponents) -> String {
        let date = calendar_part(value.years, value.months, value.weeks, value.days);
        let mut time = String::new();
        push_segment(&mut time, value.hours, 'H');
        push_segment(&mut time, value.minutes, 'M');
        if let Some(seconds) = seconds_literal(value.seconds, value.milliseconds) {
            time.push_str(&seconds);
            time.push('S');
        }

        match (date.is_empty(), time.is_empty()) {
            (true, true) => "PT0S".to_string(),
            (_, true) => format!("P{date}"),
            _ => format!("P{date}T{time}"),
        }
    }
}

/// ISO-8601 periods: `P1Y6M2W15D`, or `P0D` when empty.
///
/// Also accepts duration components with no time fields set.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoPeriodValueTo;

impl ValueTo<PeriodComponents> for IsoPeriodValueTo {
    fn can_handle(&self, _value: &PeriodComponents) -> bool {
        true
    }

    fn serialize_value(&self, value: &PeriodComponents) -> String {
        let date = calendar_part(value.years, value.months, value.weeks, value.days);
        if date.is_empty() {
            "P0D".to_string()
        } else {
            format!("P{date}")
        }
    }
}

impl ValueTo<DurationComponents> for IsoPeriodValueTo {
    fn can_handle(&self, value: &DurationComponents) -> bool {
        value.has_calendar_fields() && !value.has_time_fields()
    }

    fn serialize_value(&self, value: &DurationComponents) -> String {
        self.serialize_value(&PeriodComponents {
            years: value.years,
            months: value.months,
            weeks: value.weeks,
            days: value.days,
        })
    }
}

/// Time-only durations with days folded into hours: `{days: 1, hours: 2}`
/// becomes `PT26H`.
///
/// Declines durations with years, months or weeks, durations with no
/// fields at all, and durations whose hour total overflows.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockDurationValueTo;

impl ClockDurationValueTo {
    fn total_hours(value: &DurationComponents) -> Option<i64> {
        amount(value.days)
            .checked_mul(24)?
            .checked_add(amount(value.hours))
    }
}

impl ValueTo<DurationComponents> for ClockDurationValueTo {
    fn can_handle(&self, value: &DurationComponents) -> bool {
        [value.years, value.months, value.weeks]
            .iter()
            .all(|c| amount(*c) == 0)
            && (value.has_time_fields() || amount(value.days) != 0)
            && Self::total_hours(value).is_some()
    }

    fn serialize_value(&self, value: &DurationComponents) -> String {
        let hours = Self::total_hours(value).unwrap_or_default();
        let mut time = String::new();
        push_segment(&mut time, Some(hours), 'H');
        push_segment(&mut time, value.minutes, 'M');
        if let Some(seconds) = seconds_literal(value.seconds, value.milliseconds) {
            time.push_str(&seconds);
            time.push('S');
        }

        if time.is_empty() {
            "PT0S".to_string()
        } else {
            format!("PT{time}")
        }
    }
}
