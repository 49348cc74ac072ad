//! Collections derived from the flat entry list.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::encode::{QueryEncoding, write_query};
use crate::key::ParamsAppender;

/// An ordered multimap of query parameters.
///
/// Every appended pair is kept, duplicates included, in insertion order.
///
/// ```
/// let mut params = params_qs::QueryParams::new();
/// params.append("page", "1");
/// params.append("id", "a");
/// params.append("id", "b");
/// assert_eq!(params.get("id"), Some("a"));
/// assert_eq!(params.get_all("id").collect::<Vec<_>>(), ["a", "b"]);
/// assert_eq!(params.to_string(), "page=1&id=a&id=b");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// The first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Writes the pairs as a query string, without a leading `?`.
    pub fn to_query_string(&self, encoding: QueryEncoding) -> String {
        write_query(self.iter(), encoding)
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string(QueryEncoding::Component))
    }
}

impl ParamsAppender for QueryParams {
    fn append(&mut self, key: &str, value: &str) {
        QueryParams::append(self, key, value);
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        params.extend(iter);
        params
    }
}

impl IntoIterator for QueryParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// A value of a folded parameter map: one string, or every string seen
/// for a repeated key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    /// All values, in the order they were seen.
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(value) => std::slice::from_ref(value),
            ParamValue::Multiple(values) => values,
        }
    }
}

/// Serializes as a bare string or a sequence of strings.
impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Single(value) => serializer.serialize_str(value),
            ParamValue::Multiple(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

/// A single-level map of parameters, keyed in first-seen order.
pub type PlainParams = IndexMap<String, ParamValue>;

/// Folds entries into a [`PlainParams`] map. A key seen once keeps a
/// single value; a repeated key collects all of its values.
pub(crate) fn fold_entries(entries: Vec<(String, String)>) -> PlainParams {
    let mut result = PlainParams::with_capacity(entries.len());
    for (key, value) in entries {
        match result.get_mut(&key) {
            Some(ParamValue::Multiple(values)) => values.push(value),
            Some(existing) => {
                if let ParamValue::Single(first) = existing {
                    let first = std::mem::take(first);
                    *existing = ParamValue::Multiple(vec![first, value]);
                }
            }
            None => {
                result.insert(key, ParamValue::Single(value));
            }
        }
    }
    result
}

/// Appends a query string to a URL, using `&` if the URL already has a
/// query and `?` otherwise. An empty query leaves the URL unchanged.
pub fn join_url(base: &str, query: &str) -> String {
    if query.is_empty() {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut url = String::with_capacity(base.len() + 1 + query.len());
    url.push_str(base);
    url.push(separator);
    url.push_str(query);
    url
}
