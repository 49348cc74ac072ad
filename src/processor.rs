//! The recursive walk from a [`Value`] tree to flat entries.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::convert::{Converter, convert_leaf, default_converters};
use crate::encode::{QueryEncoding, write_query};
use crate::error::{Error, Result};
use crate::key::{DefaultKeyFormatter, KeyFormatter, Transform};
use crate::output::{PlainParams, QueryParams, fold_entries, join_url};
use crate::value::Value;

/// One flattened parameter: `(flat key, value)`.
///
/// Keys may repeat; repeated keys are meaningful to consumers that collect
/// them into lists.
pub type ParamsEntry = (String, String);

/// Object property that marks a type discriminator. Never emitted.
pub const TYPE_DISCRIMINATOR: &str = "$type";

/// Flattens nested values into query parameters.
///
/// A processor holds the key formatter, the converter chain and the
/// query encoding to use. It is cheap to clone and can be shared between
/// threads; each call keeps its own traversal state.
///
/// ```
/// use params_qs::{ParamsProcessor, Value};
/// use params_qs::key::BracketKeyFormatter;
///
/// let value = Value::from(serde_json::json!({ "user": { "name": "John" } }));
///
/// let processor = ParamsProcessor::new();
/// assert_eq!(
///     processor.process("filter", &value).unwrap(),
///     [("filter.user.name".to_string(), "John".to_string())]
/// );
///
/// let processor = processor.key_formatter(BracketKeyFormatter::new());
/// assert_eq!(
///     processor.process("filter", &value).unwrap(),
///     [("filter[user][name]".to_string(), "John".to_string())]
/// );
/// ```
#[derive(Clone)]
pub struct ParamsProcessor {
    key_formatter: Arc<dyn KeyFormatter>,
    value_converters: Arc<[Arc<dyn Converter>]>,
    encoding: QueryEncoding,
}

impl Default for ParamsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParamsProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsProcessor")
            .field("value_converters", &self.value_converters.len())
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl ParamsProcessor {
    /// A processor with dot/bracket keys, the default converters
    /// (dates to ISO-8601, then primitives) and the default encoding.
    pub fn new() -> Self {
        Self {
            key_formatter: Arc::new(DefaultKeyFormatter),
            value_converters: default_converters().into(),
            encoding: QueryEncoding::default(),
        }
    }

    /// Specifies how nested keys are formatted.
    pub fn key_formatter(mut self, key_formatter: impl KeyFormatter + 'static) -> Self {
        self.key_formatter = Arc::new(key_formatter);
        self
    }

    /// Replaces the converter chain. Converters are tried in order and
    /// the first one accepting a leaf converts it.
    pub fn value_converters(mut self, value_converters: Vec<Arc<dyn Converter>>) -> Self {
        self.value_converters = value_converters.into();
        self
    }

    /// Specifies how [`ParamsProcessor::to_query_string`] escapes keys
    /// and values.
    pub fn encoding(mut self, encoding: QueryEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns a processor with `options` applied on top of this one.
    pub fn with_options(&self, options: &ProcessOptions) -> Self {
        Self {
            key_formatter: options
                .key_formatter
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.key_formatter)),
            value_converters: options
                .value_converters
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.value_converters)),
            encoding: options.encoding.unwrap_or(self.encoding),
        }
    }

    /// Flattens `value` under the root `key` into ordered entries.
    ///
    /// Entries come out in depth-first order: object properties in
    /// insertion order, array elements in index order. `Null` values and
    /// empty containers produce nothing.
    ///
    /// Fails with [`Error::CycleDetected`] if the same array or object is
    /// reached twice; no partial result is returned.
    pub fn process(&self, key: &str, value: &Value) -> Result<Vec<ParamsEntry>> {
        let mut walk = Walk {
            key_formatter: &*self.key_formatter,
            value_converters: &self.value_converters,
            visited: HashSet::new(),
            entries: Vec::new(),
        };
        walk.walk(key, value)?;
        Ok(walk.entries)
    }

    /// Flattens `value` into an encoded query string, without a leading `?`.
    pub fn to_query_string(&self, key: &str, value: &Value) -> Result<String> {
        let entries = self.process(key, value)?;
        Ok(write_query(
            entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            self.encoding,
        ))
    }

    /// Flattens `value` into an ordered multimap, duplicates included.
    pub fn to_query_params(&self, key: &str, value: &Value) -> Result<QueryParams> {
        Ok(self.process(key, value)?.into_iter().collect())
    }

    /// Flattens `value` into a single-level map. Keys seen once map to a
    /// single value, repeated keys to all of their values in order.
    pub fn to_plain_object(&self, key: &str, value: &Value) -> Result<PlainParams> {
        Ok(fold_entries(self.process(key, value)?))
    }

    /// Appends the query string for `value` to `base`.
    ///
    /// ```
    /// use params_qs::{ParamsProcessor, Value};
    ///
    /// let value = Value::from(serde_json::json!({ "status": "active" }));
    /// let processor = ParamsProcessor::new();
    /// assert_eq!(
    ///     processor.build_url("/api?page=2", "filter", &value).unwrap(),
    ///     "/api?page=2&filter.status=active"
    /// );
    /// ```
    pub fn build_url(&self, base: &str, key: &str, value: &Value) -> Result<String> {
        let query = self.to_query_string(key, value)?;
        Ok(join_url(base, &query))
    }

    /// Appends the entries for `value` after the existing ones in `params`.
    pub fn append_to(&self, params: &mut QueryParams, key: &str, value: &Value) -> Result<()> {
        params.extend(self.process(key, value)?);
        Ok(())
    }

    /// Appends the entries for `value` to the query of `url`.
    ///
    /// The `url` crate always applies form encoding to query pairs, so
    /// the processor's own encoding does not apply here.
    pub fn append_to_url(&self, url: &mut url::Url, key: &str, value: &Value) -> Result<()> {
        let entries = self.process(key, value)?;
        if !entries.is_empty() {
            url.query_pairs_mut().extend_pairs(entries);
        }
        Ok(())
    }

    /// Returns a reusable function turning values into query strings
    /// under a fixed root key.
    pub fn serializer(&self, key: &str) -> impl Fn(&Value) -> Result<String> + use<> {
        let processor = self.clone();
        let key = key.to_string();
        move |value| processor.to_query_string(&key, value)
    }
}

/// Per-call overrides for a [`ParamsProcessor`]. Unset fields keep the
/// processor's own setting.
#[derive(Clone, Default)]
pub struct ProcessOptions {
    key_formatter: Option<Arc<dyn KeyFormatter>>,
    value_converters: Option<Arc<[Arc<dyn Converter>]>>,
    encoding: Option<QueryEncoding>,
}

impl fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessOptions")
            .field("key_formatter", &self.key_formatter.is_some())
            .field(
                "value_converters",
                &self.value_converters.as_ref().map(|c| c.len()),
            )
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl ProcessOptions {
    /// Options that override nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the key formatter for calls using these options.
    pub fn key_formatter(mut self, key_formatter: impl KeyFormatter + 'static) -> Self {
        self.key_formatter = Some(Arc::new(key_formatter));
        self
    }

    /// Overrides the converter chain. An empty chain leaves every leaf
    /// to plain string coercion.
    pub fn value_converters(mut self, value_converters: Vec<Arc<dyn Converter>>) -> Self {
        self.value_converters = Some(value_converters.into());
        self
    }

    /// Overrides the query string encoding.
    pub fn encoding(mut self, encoding: QueryEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// State of a single `process` call.
struct Walk<'a> {
    key_formatter: &'a dyn KeyFormatter,
    value_converters: &'a [Arc<dyn Converter>],
    /// Identities of every container entered so far.
    visited: HashSet<usize>,
    entries: Vec<ParamsEntry>,
}

impl Walk<'_> {
    fn walk(&mut self, key: &str, value: &Value) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Array(_) | Value::Object(_) if self.transform(key, value)? => {}
            Value::Array(array) => {
                self.enter(array.identity(), key)?;
                for (index, item) in array.items().iter().enumerate() {
                    let child = self.key_formatter.format_array_key(key, index);
                    self.walk(&child, item)?;
                }
            }
            Value::Object(object) => {
                self.enter(object.identity(), key)?;
                for (name, item) in object.entries().iter() {
                    if name == TYPE_DISCRIMINATOR {
                        continue;
                    }
                    let child = self.key_formatter.format_object_key(key, name);
                    self.walk(&child, item)?;
                }
            }
            leaf => {
                let converted = convert_leaf(leaf, self.value_converters);
                self.entries.push((key.to_string(), converted));
            }
        }
        Ok(())
    }

    /// Offers a container to the formatter's subtree transform. Returns
    /// `true` if the transform handled it.
    fn transform(&mut self, key: &str, value: &Value) -> Result<bool> {
        let Some(transform) = self.key_formatter.complex_transform() else {
            return Ok(false);
        };
        let mut collected = Vec::new();
        match transform.transform(&mut collected, key, value)? {
            Transform::Handled => {
                tracing::trace!(key, entries = collected.len(), "subtree transformed");
                self.entries.extend(collected);
                Ok(true)
            }
            Transform::Recurse => Ok(false),
        }
    }

    fn enter(&mut self, identity: usize, key: &str) -> Result<()> {
        if !self.visited.insert(identity) {
            tracing::debug!(key, "circular reference detected");
            return Err(Error::cycle(key));
        }
        Ok(())
    }
}
