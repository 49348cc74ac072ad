//! Flatten nested values into querystring parameters
//!
//! HTTP query strings are flat lists of `key=value` pairs, while the
//! filters and options sent through them are often nested. This library
//! walks a nested [`Value`] and produces an ordered list of flat entries,
//! one per leaf, with keys built from the path to the leaf:
//!
//! ```text
//! { "user": { "name": "John", "tags": ["a", "b"] } }   under key "filter"
//!
//! filter.user.name=John
//! filter.user.tags[0]=a
//! filter.user.tags[1]=b
//! ```
//!
//! The walk is configured by three parts:
//!
//! * a [`KeyFormatter`](key::KeyFormatter), rendering nested paths into
//!   flat keys (dot notation by default, see [`key`] for the others),
//! * an ordered list of [converters](convert), turning leaves such as
//!   dates and durations into strings,
//! * a [`QueryEncoding`], used when writing the final query string.
//!
//! The same array or object reached twice in one walk is an error rather
//! than an endless loop.
//!
//! ## Usage
//!
//! Any `Serialize` type can be turned into a [`Value`] with [`to_value`]:
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Address {
//!     city: String,
//!     postcode: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Filter {
//!     id: u8,
//!     name: String,
//!     address: Address,
//!     user_ids: Vec<u8>,
//! }
//!
//! let filter = Filter {
//!     id: 42,
//!     name: "Acme".to_string(),
//!     address: Address {
//!         city: "Carrot City".to_string(),
//!         postcode: "12345".to_string(),
//!     },
//!     user_ids: vec![1, 2],
//! };
//! let value = params_qs::to_value(&filter).unwrap();
//!
//! assert_eq!(
//!     params_qs::build_url("/search", "f", &value).unwrap(),
//!     "/search?f.id=42&f.name=Acme&f.address.city=Carrot%20City&\
//!      f.address.postcode=12345&f.user_ids%5B0%5D=1&f.user_ids%5B1%5D=2"
//! );
//! ```
//!
//! For anything other than the defaults, configure a [`ParamsProcessor`]:
//!
//! ```
//! use params_qs::key::BracketKeyFormatter;
//! use params_qs::{ParamsProcessor, QueryEncoding, Value};
//!
//! let processor = ParamsProcessor::new()
//!     .key_formatter(BracketKeyFormatter::new())
//!     .encoding(QueryEncoding::Raw);
//! let value = Value::from(serde_json::json!({ "ids": [1, 2] }));
//! assert_eq!(
//!     processor.to_query_string("q", &value).unwrap(),
//!     "q[ids][0]=1&q[ids][1]=2"
//! );
//! ```

pub mod convert;
mod encode;
mod error;
pub mod key;
mod output;
mod processor;
mod ser;
mod value;

#[doc(inline)]
pub use encode::{QueryEncoding, encode};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use output::{ParamValue, PlainParams, QueryParams, join_url};
#[doc(inline)]
pub use processor::{ParamsEntry, ParamsProcessor, ProcessOptions, TYPE_DISCRIMINATOR};
#[doc(inline)]
pub use ser::to_value;
#[doc(inline)]
pub use value::{Array, Number, Object, Opaque, Value};

/// Flattens `value` under `key` with the default processor.
///
/// See [`ParamsProcessor::process`].
pub fn process(key: &str, value: &Value) -> Result<Vec<ParamsEntry>> {
    ParamsProcessor::new().process(key, value)
}

/// Flattens `value` into a query string with the default processor.
///
/// See [`ParamsProcessor::to_query_string`].
pub fn to_query_string(key: &str, value: &Value) -> Result<String> {
    ParamsProcessor::new().to_query_string(key, value)
}

/// Flattens `value` into a [`QueryParams`] with the default processor.
pub fn to_query_params(key: &str, value: &Value) -> Result<QueryParams> {
    ParamsProcessor::new().to_query_params(key, value)
}

/// Flattens `value` into a [`PlainParams`] map with the default processor.
pub fn to_plain_object(key: &str, value: &Value) -> Result<PlainParams> {
    ParamsProcessor::new().to_plain_object(key, value)
}

/// Appends the query string for `value` to `base` with the default
/// processor.
pub fn build_url(base: &str, key: &str, value: &Value) -> Result<String> {
    ParamsProcessor::new().build_url(base, key, value)
}
