use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use super::models::{DurationComponents, PeriodComponents, Primitive};
use super::ValueFrom;
use crate::value::Value;

/// Passes booleans, numbers and strings through as [`Primitive`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrimitiveValueFrom;

impl ValueFrom for PrimitiveValueFrom {
    type Output = Primitive;

    fn normalize_value(&self, value: &Value) -> Option<Primitive> {
        match value {
            Value::Bool(b) => Some(Primitive::Bool(*b)),
            Value::Number(n) => Some(Primitive::Number(*n)),
            Value::String(s) => Some(Primitive::String(s.clone())),
            _ => None,
        }
    }

    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
    }
}

/// Passes native [`Value::Date`] instants through.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateValueFrom;

impl ValueFrom for DateValueFrom {
    type Output = DateTime<Utc>;

    fn normalize_value(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }
}

/// Reads a `chrono::NaiveDate` leaf as midnight UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveDateValueFrom;

impl ValueFrom for NaiveDateValueFrom {
    type Output = DateTime<Utc>;

    fn normalize_value(&self, value: &Value) -> Option<DateTime<Utc>> {
        let date = value.downcast_ref::<NaiveDate>()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

/// Reads a `chrono::NaiveDateTime` leaf as a UTC wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveDateTimeValueFrom;

impl ValueFrom for NaiveDateTimeValueFrom {
    type Output = DateTime<Utc>;

    fn normalize_value(&self, value: &Value) -> Option<DateTime<Utc>> {
        value
            .downcast_ref::<NaiveDateTime>()
            .map(NaiveDateTime::and_utc)
    }
}

/// Moves a `DateTime<FixedOffset>` leaf to UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetDateTimeValueFrom;

impl ValueFrom for OffsetDateTimeValueFrom {
    type Output = DateTime<Utc>;

    fn normalize_value(&self, value: &Value) -> Option<DateTime<Utc>> {
        value
            .downcast_ref::<DateTime<FixedOffset>>()
            .map(|date| date.with_timezone(&Utc))
    }
}

/// Splits a signed millisecond count into hours, minutes, seconds and
/// milliseconds. Every component carries the sign of the total.
fn split_millis(total: i64) -> DurationComponents {
    let nonzero = |n: i64| (n != 0).then_some(n);
    DurationComponents {
        hours: nonzero(total / 3_600_000),
        minutes: nonzero(total % 3_600_000 / 60_000),
        seconds: nonzero(total % 60_000 / 1000),
        milliseconds: nonzero(total % 1000),
        ..DurationComponents::default()
    }
}

/// Reads a `std::time::Duration` leaf as time components.
///
/// Sub-millisecond precision is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDurationValueFrom;

impl ValueFrom for StdDurationValueFrom {
    type Output = DurationComponents;

    fn normalize_value(&self, value: &Value) -> Option<DurationComponents> {
        let duration = value.downcast_ref::<std::time::Duration>()?;
        let millis = i64::try_from(duration.as_millis()).ok()?;
        Some(split_millis(millis))
    }

    fn can_handle(&self, value: &Value) -> bool {
        value.downcast_ref::<std::time::Duration>().is_some()
    }
}

/// Reads a `chrono::TimeDelta` leaf as signed time components.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeDeltaValueFrom;

impl ValueFrom for TimeDeltaValueFrom {
    type Output = DurationComponents;

    fn normalize_value(&self, value: &Value) -> Option<DurationComponents> {
        value
            .downcast_ref::<TimeDelta>()
            .map(|delta| split_millis(delta.num_milliseconds()))
    }
}

/// Reads a `chrono::Months` leaf as a period of years and months.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonthsValueFrom;

impl ValueFrom for MonthsValueFrom {
    type Output = PeriodComponents;

    fn normalize_value(&self, value: &Value) -> Option<PeriodComponents> {
        let months = i64::from(value.downcast_ref::<Months>()?.as_u32());
        Some(PeriodComponents {
            years: (months >= 12).then_some(months / 12),
            months: (months % 12 != 0).then_some(months % 12),
            ..PeriodComponents::default()
        })
    }
}
