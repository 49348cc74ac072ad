//! Building a [`Value`] from any `serde::Serialize` type.

mod key;

use key::MapKeySerializer;

use serde::ser;

use crate::error::*;
use crate::value::{Array, Object, Value};

use std::fmt::Display;

/// Converts a serializable value into a [`Value`] tree.
///
/// Structs and maps become objects (in field order), sequences and tuples
/// become arrays, `None` and unit become [`Value::Null`].
///
/// ```
/// # use serde::Serialize;
/// #[derive(Serialize)]
/// struct Query {
///     name: String,
///     tags: Vec<&'static str>,
/// }
///
/// let q = Query { name: "Alice".to_owned(), tags: vec!["a", "b"] };
/// let value = params_qs::to_value(&q).unwrap();
/// assert_eq!(
///     params_qs::to_query_string("q", &value).unwrap(),
///     "q.name=Alice&q.tags%5B0%5D=a&q.tags%5B1%5D=b"
/// );
/// ```
pub fn to_value<T: ser::Serialize + ?Sized>(input: &T) -> Result<Value> {
    input.serialize(ValueSerializer)
}

/// A serializer producing [`Value`] trees.
///
/// Enum variants carrying data are wrapped in a single-property object
/// keyed by the variant name, e.g. `{ "circle": { "r": 1 } }`.
pub struct ValueSerializer;

macro_rules! serialize_number {
    (
        $($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                Ok(Value::from(v))
            }
        )*
    };
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    serialize_number! {
        u8  => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
        i8  => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
        f32 => serialize_f32,
        f64 => serialize_f64,
    }

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        Ok(Value::Bool(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(Value::from(v))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<Self::Ok> {
        Ok(Value::Array(value.iter().copied().collect()))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        let object = Object::new();
        object.insert(variant, value.serialize(self)?);
        Ok(Value::Object(object))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqBuilder::default())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(SeqBuilder::default())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(SeqBuilder::default())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(VariantSeqBuilder {
            variant,
            seq: SeqBuilder::default(),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapBuilder::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(MapBuilder::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(VariantMapBuilder {
            variant,
            map: MapBuilder::default(),
        })
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

fn wrap_variant(variant: &'static str, value: Value) -> Value {
    let object = Object::new();
    object.insert(variant, value);
    Value::Object(object)
}

#[doc(hidden)]
#[derive(Default)]
pub struct SeqBuilder {
    array: Array,
}

impl SeqBuilder {
    fn push<T: ser::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.array.push(value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

#[doc(hidden)]
pub struct VariantSeqBuilder {
    variant: &'static str,
    seq: SeqBuilder,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.seq.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(wrap_variant(self.variant, Value::Array(self.seq.array)))
    }
}

#[doc(hidden)]
#[derive(Default)]
pub struct MapBuilder {
    object: Object,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        let Some(key) = self.next_key.take() else {
            return Err(Error::Custom(
                "internal error: value serialized before its key".to_string(),
            ));
        };
        self.object.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Object(self.object))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.object.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Object(self.object))
    }
}

#[doc(hidden)]
pub struct VariantMapBuilder {
    variant: &'static str,
    map: MapBuilder,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        ser::SerializeStruct::serialize_field(&mut self.map, key, value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(wrap_variant(self.variant, Value::Object(self.map.object)))
    }
}
