use std::fmt;

use crate::value::Number;

/// An elapsed amount of time, split into components.
///
/// Absent and zero components are equivalent. Years and months have no
/// fixed length, so serializers must either render them explicitly or
/// decline durations that carry them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DurationComponents {
    pub years: Option<i64>,
    pub months: Option<i64>,
    pub weeks: Option<i64>,
    pub days: Option<i64>,
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub milliseconds: Option<i64>,
}

macro_rules! component_setters {
    ($($field:ident)*) => {
        $(
            pub const fn $field(mut self, amount: i64) -> Self {
                self.$field = Some(amount);
                self
            }
        )*
    };
}

pub(crate) fn amount(component: Option<i64>) -> i64 {
    component.unwrap_or(0)
}

fn any_set(components: &[Option<i64>]) -> bool {
    components.iter().any(|c| amount(*c) != 0)
}

impl DurationComponents {
    component_setters! { years months weeks days hours minutes seconds milliseconds }

    /// Returns `true` if any of years, months, weeks or days is nonzero.
    pub fn has_calendar_fields(&self) -> bool {
        any_set(&[self.years, self.months, self.weeks, self.days])
    }

    /// Returns `true` if any of hours, minutes, seconds or milliseconds
    /// is nonzero.
    pub fn has_time_fields(&self) -> bool {
        any_set(&[self.hours, self.minutes, self.seconds, self.milliseconds])
    }

    pub fn is_empty(&self) -> bool {
        !self.has_calendar_fields() && !self.has_time_fields()
    }

    /// Total length in milliseconds, counting weeks as 7 days and days as
    /// 24 hours. `None` when years or months are present, or on overflow.
    pub fn total_milliseconds(&self) -> Option<i64> {
        if any_set(&[self.years, self.months]) {
            return None;
        }
        let days = amount(self.weeks)
            .checked_mul(7)?
            .checked_add(amount(self.days))?;
        let hours = days.checked_mul(24)?.checked_add(amount(self.hours))?;
        let minutes = hours.checked_mul(60)?.checked_add(amount(self.minutes))?;
        let seconds = minutes.checked_mul(60)?.checked_add(amount(self.seconds))?;
        seconds.checked_mul(1000)?.checked_add(amount(self.milliseconds))
    }
}

/// A calendar-based amount: years, months, weeks and days.
///
/// Periods cannot be reduced to milliseconds because months and years
/// vary in length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeriodComponents {
    pub years: Option<i64>,
    pub months: Option<i64>,
    pub weeks: Option<i64>,
    pub days: Option<i64>,
}

impl PeriodComponents {
    component_setters! { years months weeks days }

    pub fn is_empty(&self) -> bool {
        !any_set(&[self.years, self.months, self.weeks, self.days])
    }
}

/// A scalar leaf in normalized form.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Number(Number),
    String(String),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Primitive::Number(n) => fmt::Display::fmt(n, f),
            Primitive::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_components_count_as_absent() {
        let d = DurationComponents::default().days(0).hours(0);
        assert!(d.is_empty());
        assert!(!d.has_calendar_fields());

        let d = DurationComponents::default().days(2).minutes(5);
        assert!(d.has_calendar_fields());
        assert!(d.has_time_fields());
        assert!(PeriodComponents::default().years(0).is_empty());
    }

    #[test]
    fn total_milliseconds_rejects_calendar_months() {
        let d = DurationComponents::default()
            .weeks(1)
            .days(1)
            .hours(1)
            .seconds(1)
            .milliseconds(500);
        assert_eq!(d.total_milliseconds(), Some(((8 * 24 + 1) * 3600 + 1) * 1000 + 500));
        assert_eq!(DurationComponents::default().months(1).total_milliseconds(), None);
        assert_eq!(DurationComponents::default().total_milliseconds(), Some(0));
    }
}
