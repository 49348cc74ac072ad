//! The nested input model accepted by the processor.
//!
//! A [`Value`] is a tree of scalars, dates and containers. Containers are
//! reference-counted handles: cloning an [`Array`] or [`Object`] aliases
//! the same storage, so the same container can be reached twice (or be
//! inserted into itself). The processor uses handle identity to detect
//! those cycles.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use indexmap::IndexMap;

/// A value that can be flattened into parameters.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value. Contributes no entries.
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// A native date-time instant.
    Date(DateTime<Utc>),
    Array(Array),
    Object(Object),
    /// A third-party leaf, recognised by "from" strategies through
    /// downcasting. Never recursed into.
    Opaque(Opaque),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Downcasts an opaque leaf to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(opaque) => opaque.downcast_ref(),
            _ => None,
        }
    }

    /// Plain string coercion, used when no converter accepts a leaf.
    pub(crate) fn coerce_to_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Date(date) => iso_string(date),
            Value::Opaque(opaque) => opaque.to_string(),
            // containers are walked, never coerced
            Value::Array(_) | Value::Object(_) => String::new(),
        }
    }
}

/// Renders an instant as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub(crate) fn iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A numeric leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => f.write_str(itoa::Buffer::new().format(i)),
            Number::Float(v) => f.write_str(&format_float(v)),
        }
    }
}

/// Formats a float the way a number reads in a URL: integral values lose
/// their fraction and non-finite values are spelled out.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v.fract() == 0.0 {
        if v.abs() < 1e15 {
            return itoa::Buffer::new().format(v as i64).to_string();
        }
        if v.abs() < 1e21 {
            return integral_digits(v);
        }
    }
    ryu::Buffer::new().format_finite(v).to_string()
}

/// Writes a large integral float in full: the shortest round-trip digits
/// padded with zeros, so `2^60` prints as `1152921504606847000`.
fn integral_digits(v: f64) -> String {
    let scientific = format!("{:e}", v.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: usize = exponent.parse().unwrap_or(0);
    let mut out = String::with_capacity(exponent + 2);
    if v < 0.0 {
        out.push('-');
    }
    let digits = mantissa.chars().filter(char::is_ascii_digit);
    let start = out.len();
    out.extend(digits);
    while out.len() - start <= exponent {
        out.push('0');
    }
    out
}

/// A shared, ordered sequence of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Borrows the elements. Pushing while the borrow is held panics.
    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    /// Returns `true` if both handles point at the same array.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // shallow: the contents may refer back to this array
        f.debug_struct("Array")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        arrays_eq(self, other, &mut HashSet::new())
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Array(Rc::new(RefCell::new(iter.into_iter().map(Into::into).collect())))
    }
}

/// A shared mapping from property names to values, in insertion order.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<IndexMap<String, Value>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, returning the previous value for that name.
    ///
    /// Re-inserting an existing name keeps its original position.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Borrows the properties. Inserting while the borrow is held panics.
    pub fn entries(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.0.borrow()
    }

    /// Returns `true` if both handles point at the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.0.borrow();
        f.debug_struct("Object")
            .field("keys", &entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        objects_eq(self, other, &mut HashSet::new())
    }
}

/// Structural equality. Containers compare by contents; a pair of
/// containers already under comparison counts as equal, so cyclic values
/// terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut HashSet::new())
    }
}

type Pairs = HashSet<(usize, usize)>;

fn values_eq(a: &Value, b: &Value, seen: &mut Pairs) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Opaque(a), Value::Opaque(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => arrays_eq(a, b, seen),
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b, seen),
        _ => false,
    }
}

fn arrays_eq(a: &Array, b: &Array, seen: &mut Pairs) -> bool {
    if a.ptr_eq(b) || !seen.insert((a.identity(), b.identity())) {
        return true;
    }
    let (a, b) = (a.items(), b.items());
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_eq(x, y, seen))
}

fn objects_eq(a: &Object, b: &Object, seen: &mut Pairs) -> bool {
    if a.ptr_eq(b) || !seen.insert((a.identity(), b.identity())) {
        return true;
    }
    let (a, b) = (a.entries(), b.entries());
    a.len() == b.len()
        && a.iter().all(|(name, x)| b.get(name).is_some_and(|y| values_eq(x, y, seen)))
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Object(Rc::new(RefCell::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )))
    }
}

/// A type-erased leaf value from another library.
///
/// Keeps the concrete type available for downcasting, together with a
/// way to print it for the plain string fallback.
#[derive(Clone)]
pub struct Opaque {
    inner: Rc<dyn Any>,
    type_name: &'static str,
    render: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Opaque {
    /// Wraps a value whose `Display` output is its fallback string.
    pub fn new<T: Any + fmt::Display>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            type_name: std::any::type_name::<T>(),
            render: |any, f| match any.downcast_ref::<T>() {
                Some(v) => fmt::Display::fmt(v, f),
                None => Ok(()),
            },
        }
    }

    /// Wraps a value whose `Debug` output is its fallback string.
    pub fn from_debug<T: Any + fmt::Debug>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            type_name: std::any::type_name::<T>(),
            render: |any, f| match any.downcast_ref::<T>() {
                Some(v) => fmt::Debug::fmt(v, f),
                None => Ok(()),
            },
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.render)(&*self.inner, f)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>({self})", self.type_name)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

macro_rules! from_int {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(Number::Int(i64::from(v)))
                }
            }
        )*
    };
}

from_int! { i8 i16 i32 i64 u8 u16 u32 }

macro_rules! from_wide_int {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    match i64::try_from(v) {
                        Ok(i) => Value::Number(Number::Int(i)),
                        Err(_) => Value::Number(Number::Float(v as f64)),
                    }
                }
            }
        )*
    };
}

from_wide_int! { u64 usize isize }

macro_rules! from_opaque {
    ($ctor:ident => $($ty:ty)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Opaque(Opaque::$ctor(v))
                }
            }
        )*
    };
}

from_opaque! { new => NaiveDate NaiveDateTime DateTime<FixedOffset> TimeDelta }
from_opaque! { from_debug => std::time::Duration Months }

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(Number::Float(f64::from(v)))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<Opaque> for Value {
    fn from(v: Opaque) -> Self {
        Value::Opaque(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().collect()),
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}
