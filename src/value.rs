//! Runtime values for the schema-driven codec.

use crate::ast::{FieldType, Literal, ScalarType};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A single decoded value (field or compound).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    /// String content; opaque bytes, not necessarily UTF-8.
    Str(Vec<u8>),
    List(Vec<Value>),
    /// Entries in decode order. Keys are unique; encoding writes them sorted by key.
    Map(Vec<(Value, Value)>),
    Struct(HashMap<String, Value>),
}

impl Value {
    /// Zero/empty value for `ty`. Nested structs come back as empty field maps,
    /// which encode as all-default fields.
    pub fn zero(ty: &FieldType) -> Value {
        match ty {
            FieldType::Scalar(s) => Value::zero_scalar(*s),
            FieldType::String => Value::Str(Vec::new()),
            FieldType::List(_) => Value::List(Vec::new()),
            FieldType::Map(_, _) => Value::Map(Vec::new()),
            FieldType::StructRef(_) => Value::Struct(HashMap::new()),
        }
    }

    pub fn zero_scalar(s: ScalarType) -> Value {
        match s {
            ScalarType::U8 => Value::U8(0),
            ScalarType::U16 => Value::U16(0),
            ScalarType::U32 => Value::U32(0),
            ScalarType::U64 => Value::U64(0),
            ScalarType::I8 => Value::I8(0),
            ScalarType::I16 => Value::I16(0),
            ScalarType::I32 => Value::I32(0),
            ScalarType::I64 => Value::I64(0),
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Float => Value::Float(0.0),
            ScalarType::Double => Value::Double(0.0),
        }
    }

    /// Value of a schema default literal. Literals are range checked at resolve time.
    pub fn from_literal(ty: &FieldType, lit: &Literal) -> Option<Value> {
        let v = match (ty, lit) {
            (FieldType::String, Literal::String(s)) => Value::Str(s.clone().into_bytes()),
            (FieldType::Scalar(ScalarType::Bool), Literal::Bool(b)) => Value::Bool(*b),
            (FieldType::Scalar(ScalarType::Bool), Literal::Int(i)) => Value::Bool(*i != 0),
            (FieldType::Scalar(ScalarType::Float), Literal::Float(f)) => Value::Float(*f as f32),
            (FieldType::Scalar(ScalarType::Float), Literal::Int(i)) => Value::Float(*i as f32),
            (FieldType::Scalar(ScalarType::Double), Literal::Float(f)) => Value::Double(*f),
            (FieldType::Scalar(ScalarType::Double), Literal::Int(i)) => Value::Double(*i as f64),
            (FieldType::Scalar(s), Literal::Int(i)) => match s {
                ScalarType::U8 => Value::U8(u8::try_from(*i).ok()?),
                ScalarType::U16 => Value::U16(u16::try_from(*i).ok()?),
                ScalarType::U32 => Value::U32(u32::try_from(*i).ok()?),
                ScalarType::U64 => Value::U64(u64::try_from(*i).ok()?),
                ScalarType::I8 => Value::I8(i8::try_from(*i).ok()?),
                ScalarType::I16 => Value::I16(i16::try_from(*i).ok()?),
                ScalarType::I32 => Value::I32(i32::try_from(*i).ok()?),
                ScalarType::I64 => Value::I64(*i),
                _ => return None,
            },
            _ => return None,
        };
        Some(v)
    }

    /// Variant name, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::U8(_) => "uint8",
            Value::U16(_) => "uint16",
            Value::U32(_) => "uint32",
            Value::U64(_) => "uint64",
            Value::I8(_) => "int8",
            Value::I16(_) => "int16",
            Value::I32(_) => "int32",
            Value::I64(_) => "int64",
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(*x as u64),
            Value::U16(x) => Some(*x as u64),
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(x) => Some(*x as i64),
            Value::I16(x) => Some(*x as i64),
            Value::I32(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U8(x) => Some(*x as i64),
            Value::U16(x) => Some(*x as i64),
            Value::U32(x) => Some(*x as i64),
            Value::U64(x) => i64::try_from(*x).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x as f64),
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(b) => Some(b),
            _ => None,
        }
    }

    /// String content when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_struct(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric identity of an integer or `bool` value (`false` is 0, `true` is 1).
    /// Map keys are encoded in ascending order of it.
    pub fn key_ordinal(&self) -> Option<i128> {
        Some(match *self {
            Value::U8(x) => i128::from(x),
            Value::U16(x) => i128::from(x),
            Value::U32(x) => i128::from(x),
            Value::U64(x) => i128::from(x),
            Value::I8(x) => i128::from(x),
            Value::I16(x) => i128::from(x),
            Value::I32(x) => i128::from(x),
            Value::I64(x) => i128::from(x),
            Value::Bool(b) => i128::from(b),
            _ => return None,
        })
    }

    /// Value stored under `key` in a map value.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Insert into a map value's entries; a repeated key overwrites the earlier value in place.
pub fn map_insert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

/// Map entries being collected from the wire.
///
/// Same semantics as [`map_insert`], but integer and `bool` keys are found
/// through a hash index instead of a scan.
#[derive(Debug, Default)]
pub struct MapBuilder {
    entries: Vec<(Value, Value)>,
    index: HashMap<(&'static str, i128), usize>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        let ordinal = match key.key_ordinal() {
            Some(o) => o,
            None => return map_insert(&mut self.entries, key, value),
        };
        match self.index.entry((key.kind(), ordinal)) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 = value,
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Value {
        Value::Map(self.entries)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into_bytes())
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    bool => Bool,
    f32 => Float,
    f64 => Double,
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(m: HashMap<String, Value>) -> Self {
        Value::Struct(m)
    }
}
