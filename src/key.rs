//! Key formatting strategies.
//!
//! A [`KeyFormatter`] decides how the path to a nested value is rendered
//! into one flat key. Formatters only ever see the immediate parent key
//! and the local property name or index, so nesting is the composition
//! of one call per level:
//!
//! | formatter                | object      | array        |
//! |--------------------------|-------------|--------------|
//! | [`DefaultKeyFormatter`]  | `a.b.c`     | `a[0]`       |
//! | [`BracketKeyFormatter`]  | `a[b][c]`   | `a[0]`       |
//! | [`FlatKeyFormatter`]     | `a_b_c`     | `a_0`        |
//! | [`DelimiterKeyFormatter`]| `a:b:c`     | `a[0]`       |
//! | [`JsonKeyFormatter`]     | `a={..}`    | `a=[..]`     |

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::value::{Number, Value, iso_string};

/// Receives flat entries produced by a [`ComplexTransform`].
pub trait ParamsAppender {
    fn append(&mut self, key: &str, value: &str);
}

impl ParamsAppender for Vec<(String, String)> {
    fn append(&mut self, key: &str, value: &str) {
        self.push((key.to_string(), value.to_string()));
    }
}

/// Outcome of a [`ComplexTransform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// The subtree was fully written to the appender.
    Handled,
    /// Nothing was written; recurse into the subtree as usual.
    Recurse,
}

/// Serializes a whole array or object subtree in one step, replacing the
/// default recursion for it.
pub trait ComplexTransform: Send + Sync {
    fn transform(
        &self,
        appender: &mut dyn ParamsAppender,
        key: &str,
        value: &Value,
    ) -> Result<Transform>;
}

/// Renders nested paths into flat keys.
pub trait KeyFormatter: Send + Sync {
    /// Key of property `property` inside the object at `parent_key`.
    fn format_object_key(&self, parent_key: &str, property: &str) -> String;

    /// Key of element `index` inside the array at `parent_key`.
    fn format_array_key(&self, parent_key: &str, index: usize) -> String;

    /// The subtree transform of this formatter, if it has one.
    ///
    /// Checked once for every array and object before recursing into it.
    fn complex_transform(&self) -> Option<&dyn ComplexTransform> {
        None
    }
}

fn bracketed(parent_key: &str, segment: &str) -> String {
    let mut key = String::with_capacity(parent_key.len() + segment.len() + 2);
    key.push_str(parent_key);
    key.push('[');
    key.push_str(segment);
    key.push(']');
    key
}

fn delimited(parent_key: &str, delimiter: &str, segment: &str) -> String {
    let mut key = String::with_capacity(parent_key.len() + delimiter.len() + segment.len());
    key.push_str(parent_key);
    key.push_str(delimiter);
    key.push_str(segment);
    key
}

/// Dot notation for objects, brackets for arrays: `user.tags[0]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKeyFormatter;

impl KeyFormatter for DefaultKeyFormatter {
    fn format_object_key(&self, parent_key: &str, property: &str) -> String {
        delimited(parent_key, ".", property)
    }

    fn format_array_key(&self, parent_key: &str, index: usize) -> String {
        bracketed(parent_key, itoa::Buffer::new().format(index))
    }
}

/// How [`BracketKeyFormatter`] renders array elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArrayFormat {
    /// Use the `a[0]=1&a[1]=2` format.
    #[default]
    Indexed,
    /// Use the `a[]=1&a[]=2` format.
    EmptyIndexed,
    /// Use the `a=1&a=2` format.
    Unindexed,
}

/// Rails and PHP style brackets for everything: `user[tags][0]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BracketKeyFormatter {
    array_format: ArrayFormat,
}

impl BracketKeyFormatter {
    pub const fn new() -> Self {
        Self {
            array_format: ArrayFormat::Indexed,
        }
    }

    /// Specifies how array elements are keyed. The default is
    /// [`ArrayFormat::Indexed`].
    pub const fn array_format(mut self, array_format: ArrayFormat) -> Self {
        self.array_format = array_format;
        self
    }
}

impl KeyFormatter for BracketKeyFormatter {
    fn format_object_key(&self, parent_key: &str, property: &str) -> String {
        bracketed(parent_key, property)
    }

    fn format_array_key(&self, parent_key: &str, index: usize) -> String {
        match self.array_format {
            ArrayFormat::Indexed => bracketed(parent_key, itoa::Buffer::new().format(index)),
            ArrayFormat::EmptyIndexed => bracketed(parent_key, ""),
            ArrayFormat::Unindexed => parent_key.to_string(),
        }
    }
}

/// One separator for objects and arrays alike: `user_tags_0`.
#[derive(Clone, Debug)]
pub struct FlatKeyFormatter {
    separator: String,
}

impl FlatKeyFormatter {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for FlatKeyFormatter {
    fn default() -> Self {
        Self::new("_")
    }
}

impl KeyFormatter for FlatKeyFormatter {
    fn format_object_key(&self, parent_key: &str, property: &str) -> String {
        delimited(parent_key, &self.separator, property)
    }

    fn format_array_key(&self, parent_key: &str, index: usize) -> String {
        delimited(parent_key, &self.separator, itoa::Buffer::new().format(index))
    }
}

/// How [`DelimiterKeyFormatter`] renders array elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArrayKeyStyle {
    /// `parent[0]`
    #[default]
    Bracket,
    /// `parent<delimiter>0`
    Delimiter,
}

/// A custom object delimiter, `user:name` by default.
#[derive(Clone, Debug)]
pub struct DelimiterKeyFormatter {
    delimiter: String,
    array_style: ArrayKeyStyle,
}

impl DelimiterKeyFormatter {
    pub fn new(delimiter: impl Into<String>, array_style: ArrayKeyStyle) -> Self {
        Self {
            delimiter: delimiter.into(),
            array_style,
        }
    }
}

impl Default for DelimiterKeyFormatter {
    fn default() -> Self {
        Self::new(":", ArrayKeyStyle::Bracket)
    }
}

impl KeyFormatter for DelimiterKeyFormatter {
    fn format_object_key(&self, parent_key: &str, property: &str) -> String {
        delimited(parent_key, &self.delimiter, property)
    }

    fn format_array_key(&self, parent_key: &str, index: usize) -> String {
        let mut buffer = itoa::Buffer::new();
        let index = buffer.format(index);
        match self.array_style {
            ArrayKeyStyle::Bracket => bracketed(parent_key, index),
            ArrayKeyStyle::Delimiter => delimited(parent_key, &self.delimiter, index),
        }
    }
}

/// Embeds every array and object as one compact JSON value.
///
/// `{ "status": "active" }` under key `q` becomes the single entry
/// `("q", "{\"status\":\"active\"}")`. Dates are embedded as ISO-8601
/// strings, opaque leaves as their display string and non-finite numbers
/// as `null`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonKeyFormatter;

impl KeyFormatter for JsonKeyFormatter {
    fn format_object_key(&self, parent_key: &str, property: &str) -> String {
        DefaultKeyFormatter.format_object_key(parent_key, property)
    }

    fn format_array_key(&self, parent_key: &str, index: usize) -> String {
        DefaultKeyFormatter.format_array_key(parent_key, index)
    }

    fn complex_transform(&self) -> Option<&dyn ComplexTransform> {
        Some(self)
    }
}

impl ComplexTransform for JsonKeyFormatter {
    fn transform(
        &self,
        appender: &mut dyn ParamsAppender,
        key: &str,
        value: &Value,
    ) -> Result<Transform> {
        let mut visited = HashSet::new();
        let json = to_json(value, key, &mut visited)?;
        appender.append(key, &json.to_string());
        Ok(Transform::Handled)
    }
}

fn to_json(value: &Value, key: &str, visited: &mut HashSet<usize>) -> Result<serde_json::Value> {
    use serde_json::Value as Json;

    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(Number::Int(i)) => Json::from(*i),
        Value::Number(Number::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number)
        }
        Value::String(s) => Json::String(s.clone()),
        Value::Date(date) => Json::String(iso_string(date)),
        Value::Opaque(opaque) => Json::String(opaque.to_string()),
        Value::Array(array) => {
            if !visited.insert(array.identity()) {
                return Err(Error::cycle(key));
            }
            let items = array.items();
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(to_json(item, key, visited)?);
            }
            Json::Array(out)
        }
        Value::Object(object) => {
            if !visited.insert(object.identity()) {
                return Err(Error::cycle(key));
            }
            let mut out = serde_json::Map::new();
            for (name, item) in object.entries().iter() {
                out.insert(name.clone(), to_json(item, key, visited)?);
            }
            Json::Object(out)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Object;

    #[test]
    fn formatters_compose_per_level() {
        let f = DefaultKeyFormatter;
        assert_eq!(f.format_array_key(&f.format_object_key("a", "b"), 2), "a.b[2]");

        let f = BracketKeyFormatter::new();
        assert_eq!(f.format_object_key(&f.format_object_key("a", "b"), "c"), "a[b][c]");
        assert_eq!(f.format_array_key("a", 0), "a[0]");

        let f = FlatKeyFormatter::default();
        assert_eq!(f.format_array_key(&f.format_object_key("a", "b"), 0), "a_b_0");
        let f = FlatKeyFormatter::new("__");
        assert_eq!(f.format_object_key("a", "b"), "a__b");
    }

    #[test]
    fn bracket_array_formats() {
        let f = BracketKeyFormatter::new().array_format(ArrayFormat::EmptyIndexed);
        assert_eq!(f.format_array_key("ids", 3), "ids[]");
        let f = BracketKeyFormatter::new().array_format(ArrayFormat::Unindexed);
        assert_eq!(f.format_array_key("ids", 3), "ids");
    }

    #[test]
    fn delimiter_array_styles() {
        let f = DelimiterKeyFormatter::default();
        assert_eq!(f.format_object_key("a", "b"), "a:b");
        assert_eq!(f.format_array_key("a", 1), "a[1]");
        let f = DelimiterKeyFormatter::new("|", ArrayKeyStyle::Delimiter);
        assert_eq!(f.format_array_key(&f.format_object_key("a", "b"), 1), "a|b|1");
    }

    #[test]
    fn json_transform_embeds_subtree() {
        let value = Value::from(serde_json::json!({"status": "active", "ids": [1, 2.5], "none": null}));
        let mut entries = Vec::new();
        let outcome = JsonKeyFormatter.transform(&mut entries, "filter", &value).unwrap();
        assert_eq!(outcome, Transform::Handled);
        assert_eq!(
            entries,
            vec![(
                "filter".to_string(),
                r#"{"status":"active","ids":[1,2.5],"none":null}"#.to_string()
            )]
        );
    }

    #[test]
    fn json_transform_detects_cycles() {
        let object = Object::new();
        object.insert("self", object.clone());
        let mut entries = Vec::new();
        let err = JsonKeyFormatter
            .transform(&mut entries, "q", &Value::from(object))
            .unwrap_err();
        assert!(matches!(err, Error::CycleDetected { ref key } if key == "q"));
        assert!(entries.is_empty());
    }
}
