//! Leaf value conversion.
//!
//! Converting a leaf happens in two stages. A [`ValueFrom`] strategy
//! recognises an input [`Value`] and normalizes it into an intermediate
//! type (a `DateTime<Utc>`, [`DurationComponents`], [`PeriodComponents`]
//! or a [`Primitive`]). A [`ValueTo`] strategy then turns that
//! intermediate value into the final parameter string.
//!
//! A [`ValueConverter`] pairs one of each. The processor keeps an ordered
//! list of converters and uses the first one that accepts a leaf:
//!
//! ```
//! use params_qs::convert::{converter, DateValueFrom, UnixTimestampValueTo};
//! use params_qs::{ParamsProcessor, Value};
//! use chrono::{TimeZone, Utc};
//!
//! let processor = ParamsProcessor::new()
//!     .value_converters(vec![converter(DateValueFrom, UnixTimestampValueTo)]);
//! let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! assert_eq!(
//!     processor.to_query_string("since", &Value::from(date)).unwrap(),
//!     "since=1704067200"
//! );
//! ```

mod from;
mod models;
mod to;

pub use from::*;
pub use models::{DurationComponents, PeriodComponents, Primitive};
pub use to::*;

use std::sync::Arc;

use crate::value::Value;

/// Normalizes input values into an intermediate type.
pub trait ValueFrom: Send + Sync {
    type Output;

    /// Normalizes `value`, or returns `None` if this strategy does not
    /// recognise it.
    fn normalize_value(&self, value: &Value) -> Option<Self::Output>;

    fn can_handle(&self, value: &Value) -> bool {
        self.normalize_value(value).is_some()
    }
}

/// Serializes an intermediate value into its parameter string.
pub trait ValueTo<I>: Send + Sync {
    fn can_handle(&self, value: &I) -> bool;

    /// Only called with values accepted by [`ValueTo::can_handle`].
    fn serialize_value(&self, value: &I) -> String;
}

/// A complete leaf conversion, from [`Value`] to string.
pub trait Converter: Send + Sync {
    fn can_handle(&self, value: &Value) -> bool;

    /// Converts a value accepted by [`Converter::can_handle`].
    fn convert(&self, value: &Value) -> String;

    /// Converts `value` if this converter accepts it.
    fn try_convert(&self, value: &Value) -> Option<String> {
        self.can_handle(value).then(|| self.convert(value))
    }
}

/// A from strategy paired with a to strategy for its output type.
#[derive(Clone, Debug, Default)]
pub struct ValueConverter<F, T> {
    pub from: F,
    pub to: T,
}

impl<F, T> ValueConverter<F, T>
where
    F: ValueFrom,
    T: ValueTo<F::Output>,
{
    pub fn new(from: F, to: T) -> Self {
        Self { from, to }
    }
}

impl<F, T> Converter for ValueConverter<F, T>
where
    F: ValueFrom,
    T: ValueTo<F::Output>,
{
    /// Both strategies must accept: the value itself, then its
    /// normalized form.
    fn can_handle(&self, value: &Value) -> bool {
        self.from
            .normalize_value(value)
            .is_some_and(|intermediate| self.to.can_handle(&intermediate))
    }

    fn convert(&self, value: &Value) -> String {
        self.try_convert(value)
            .unwrap_or_else(|| value.coerce_to_string())
    }

    fn try_convert(&self, value: &Value) -> Option<String> {
        let intermediate = self.from.normalize_value(value)?;
        self.to
            .can_handle(&intermediate)
            .then(|| self.to.serialize_value(&intermediate))
    }
}

/// Pairs two strategies into a shareable converter.
pub fn converter<F, T>(from: F, to: T) -> Arc<dyn Converter>
where
    F: ValueFrom + 'static,
    T: ValueTo<F::Output> + 'static,
{
    Arc::new(ValueConverter::new(from, to))
}

/// The default converter chain: dates to ISO-8601, then primitives to
/// their plain string form. Dates come first so they are never taken
/// for primitives.
pub fn default_converters() -> Vec<Arc<dyn Converter>> {
    vec![
        converter(DateValueFrom, IsoDateValueTo),
        converter(PrimitiveValueFrom, PrimitiveValueTo),
    ]
}

/// Converts a leaf with the first accepting converter, falling back to
/// plain string coercion.
pub(crate) fn convert_leaf(value: &Value, converters: &[Arc<dyn Converter>]) -> String {
    for converter in converters {
        if let Some(converted) = converter.try_convert(value) {
            return converted;
        }
    }
    tracing::trace!("no converter accepted leaf, using string coercion");
    value.coerce_to_string()
}
