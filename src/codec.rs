//! Encode/decode records described by a resolved schema.
//!
//! Produces exactly the bytes the typed API produces for an equivalent
//! record: the list and map algorithms are the ones in [`crate::wire`], only
//! the element codec is chosen at runtime from the field type.

use crate::ast::*;
use crate::error::CodecError;
use crate::stream::{Endianness, Sink, Source};
use crate::value::{MapBuilder, Value};
use crate::wire::{self, Decode};
use std::collections::HashMap;
use std::io::{Read, Write};

#[derive(Debug, Clone)]
pub struct Codec {
    pub endianness: Endianness,
    resolved: ResolvedSchema,
}

impl Codec {
    pub fn new(resolved: ResolvedSchema, endianness: Endianness) -> Self {
        Codec { endianness, resolved }
    }

    pub fn resolved(&self) -> &ResolvedSchema {
        &self.resolved
    }

    /// Decode a whole buffer as one `struct_name`. Leftover bytes are malformed input.
    pub fn decode_struct(&self, struct_name: &str, bytes: &[u8]) -> Result<HashMap<String, Value>, CodecError> {
        let (consumed, result) = self.decode_struct_with_extent(struct_name, bytes);
        let values = result?;
        if consumed != bytes.len() {
            return Err(CodecError::Malformed {
                offset: consumed,
                reason: format!("{} trailing byte(s) after {}", bytes.len() - consumed, struct_name),
            });
        }
        Ok(values)
    }

    /// Decode one struct from the front of `bytes` and return (bytes_consumed, result).
    /// On error, `bytes_consumed` is where decoding stopped.
    pub fn decode_struct_with_extent(
        &self,
        struct_name: &str,
        bytes: &[u8],
    ) -> (usize, Result<HashMap<String, Value>, CodecError>) {
        let mut source = Source::from_slice(bytes, self.endianness);
        let result = self.decode_struct_from(&mut source, struct_name);
        (source.consumed(), result)
    }

    /// Decode one struct from any source.
    pub fn decode_struct_from<R: Read>(
        &self,
        source: &mut Source<R>,
        struct_name: &str,
    ) -> Result<HashMap<String, Value>, CodecError> {
        let s = self.lookup(struct_name)?;
        self.decode_fields(source, s)
    }

    /// Encode `values` as `struct_name`. Fields are written in schema order.
    pub fn encode_struct(&self, struct_name: &str, values: &HashMap<String, Value>) -> Result<Vec<u8>, CodecError> {
        let mut sink = Sink::with_order(Vec::new(), self.endianness);
        self.encode_struct_to(&mut sink, struct_name, values)?;
        Ok(sink.into_inner())
    }

    pub fn encode_struct_to<W: Write>(
        &self,
        sink: &mut Sink<W>,
        struct_name: &str,
        values: &HashMap<String, Value>,
    ) -> Result<(), CodecError> {
        let s = self.lookup(struct_name)?;
        self.encode_fields(sink, s, values)
    }

    /// The default-constructed record: schema defaults, else zero/empty, nested structs expanded.
    pub fn default_struct(&self, struct_name: &str) -> Result<HashMap<String, Value>, CodecError> {
        let s = self.lookup(struct_name)?;
        let mut out = HashMap::with_capacity(s.fields.len());
        for f in &s.fields {
            let v = match &f.ty {
                FieldType::StructRef(child) => Value::Struct(self.default_struct(child)?),
                _ => self.field_default(f),
            };
            out.insert(f.name.clone(), v);
        }
        Ok(out)
    }

    fn lookup(&self, struct_name: &str) -> Result<&StructDef, CodecError> {
        self.resolved
            .get_struct(struct_name)
            .ok_or_else(|| CodecError::UnknownStruct(struct_name.to_string()))
    }

    fn field_default(&self, f: &FieldDef) -> Value {
        f.default
            .as_ref()
            .and_then(|lit| Value::from_literal(&f.ty, lit))
            .unwrap_or_else(|| Value::zero(&f.ty))
    }

    fn decode_fields<R: Read>(&self, source: &mut Source<R>, s: &StructDef) -> Result<HashMap<String, Value>, CodecError> {
        source.nested(|source| {
            let start = source.consumed();
            let mut out = HashMap::with_capacity(s.fields.len());
            for f in &s.fields {
                let v = self.decode_type(source, &f.ty)?;
                out.insert(f.name.clone(), v);
            }
            log::trace!("decoded {} ({} bytes at {})", s.name, source.consumed() - start, start);
            Ok(out)
        })
    }

    fn decode_type<R: Read>(&self, source: &mut Source<R>, ty: &FieldType) -> Result<Value, CodecError> {
        match ty {
            FieldType::Scalar(s) => decode_scalar(source, *s),
            FieldType::String => Ok(Value::Str(wire::decode_string(source)?)),
            FieldType::List(elem) => {
                let items = wire::decode_list_with(source, |src| self.decode_type(src, elem))?;
                Ok(Value::List(items))
            }
            FieldType::Map(key, value) => {
                let mut entries = MapBuilder::new();
                wire::decode_map_with(
                    source,
                    |src| self.decode_type(src, key),
                    |src| self.decode_type(src, value),
                    |k, v| entries.insert(k, v),
                )?;
                Ok(entries.finish())
            }
            FieldType::StructRef(name) => {
                let s = self.lookup(name)?;
                Ok(Value::Struct(self.decode_fields(source, s)?))
            }
        }
    }

    fn encode_fields<W: Write>(
        &self,
        sink: &mut Sink<W>,
        s: &StructDef,
        values: &HashMap<String, Value>,
    ) -> Result<(), CodecError> {
        if let Some(unknown) = values.keys().find(|k| !s.fields.iter().any(|f| &f.name == *k)) {
            return Err(CodecError::UnknownField(format!("{}.{}", s.name, unknown)));
        }
        for f in &s.fields {
            let path = format!("{}.{}", s.name, f.name);
            match values.get(&f.name) {
                Some(v) => self.encode_type(sink, &f.ty, v, &path)?,
                None => match &f.ty {
                    FieldType::StructRef(child) => {
                        let child = self.lookup(child)?;
                        self.encode_fields(sink, child, &HashMap::new())?;
                    }
                    _ => self.encode_type(sink, &f.ty, &self.field_default(f), &path)?,
                },
            }
        }
        Ok(())
    }

    fn encode_type<W: Write>(&self, sink: &mut Sink<W>, ty: &FieldType, v: &Value, path: &str) -> Result<(), CodecError> {
        let mismatch = || CodecError::TypeMismatch {
            field: path.to_string(),
            expected: ty.describe(),
            found: v.kind(),
        };
        match (ty, v) {
            (FieldType::Scalar(s), _) => encode_scalar(sink, *s, v).ok_or_else(mismatch)?,
            (FieldType::String, Value::Str(bytes)) => wire::encode_string(sink, bytes),
            (FieldType::List(elem), Value::List(items)) => {
                wire::encode_list_with(sink, items, |snk, item| self.encode_type(snk, elem, item, path))
            }
            (FieldType::Map(key, value), Value::Map(entries)) => {
                // Same key order as the typed HashMap/BTreeMap encoders.
                let mut sorted: Vec<&(Value, Value)> = entries.iter().collect();
                sorted.sort_by_key(|(k, _)| k.key_ordinal());
                wire::encode_map_with(
                    sink,
                    sorted.into_iter().map(|(k, v)| (k, v)),
                    |snk, k| self.encode_type(snk, key, k, path),
                    |snk, v| self.encode_type(snk, value, v, path),
                )
            }
            (FieldType::StructRef(name), Value::Struct(fields)) => {
                let s = self.lookup(name)?;
                self.encode_fields(sink, s, fields)
            }
            _ => Err(mismatch()),
        }
    }
}

fn decode_scalar<R: Read>(source: &mut Source<R>, s: ScalarType) -> Result<Value, CodecError> {
    Ok(match s {
        ScalarType::U8 => Value::U8(source.read_u8()?),
        ScalarType::U16 => Value::U16(source.read_u16()?),
        ScalarType::U32 => Value::U32(source.read_u32()?),
        ScalarType::U64 => Value::U64(source.read_u64()?),
        ScalarType::I8 => Value::I8(source.read_i8()?),
        ScalarType::I16 => Value::I16(source.read_i16()?),
        ScalarType::I32 => Value::I32(source.read_i32()?),
        ScalarType::I64 => Value::I64(source.read_i64()?),
        ScalarType::Bool => Value::Bool(bool::decode(source)?),
        ScalarType::Float => Value::Float(source.read_f32()?),
        ScalarType::Double => Value::Double(source.read_f64()?),
    })
}

/// Write `v` as scalar kind `s`. Integers of another width are accepted when
/// they fit. `None` means `v` cannot be represented as `s`.
fn encode_scalar<W: Write>(sink: &mut Sink<W>, s: ScalarType, v: &Value) -> Option<Result<(), CodecError>> {
    let wide = || v.as_i64().map(i128::from).or_else(|| v.as_u64().map(i128::from));
    let r = match s {
        ScalarType::U8 => sink.write_u8(u8::try_from(wide()?).ok()?),
        ScalarType::U16 => sink.write_u16(u16::try_from(wide()?).ok()?),
        ScalarType::U32 => sink.write_u32(u32::try_from(wide()?).ok()?),
        ScalarType::U64 => sink.write_u64(u64::try_from(wide()?).ok()?),
        ScalarType::I8 => sink.write_i8(i8::try_from(wide()?).ok()?),
        ScalarType::I16 => sink.write_i16(i16::try_from(wide()?).ok()?),
        ScalarType::I32 => sink.write_i32(i32::try_from(wide()?).ok()?),
        ScalarType::I64 => sink.write_i64(i64::try_from(wide()?).ok()?),
        ScalarType::Bool => sink.write_u8(u8::from(v.as_bool()?)),
        ScalarType::Float => match v {
            Value::Float(x) => sink.write_f32(*x),
            _ => return None,
        },
        ScalarType::Double => sink.write_f64(v.as_f64()?),
    };
    Some(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const SCHEMA: &str = r#"
        syntax 1.0.0
        package t
        struct Inner {
            uint16 a = 7
            bool flag
        }
        struct Outer {
            int8 small
            Inner inner
            map[uint8, string] names
        }
    "#;

    fn codec() -> Codec {
        let resolved = ResolvedSchema::resolve(vec![parse(SCHEMA).unwrap()]).unwrap();
        Codec::new(resolved, Endianness::Little)
    }

    #[test]
    fn missing_fields_use_defaults() {
        let bytes = codec().encode_struct("Outer", &HashMap::new()).unwrap();
        assert_eq!(bytes, vec![0, 7, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn narrower_integer_values_are_widened() {
        let mut values = HashMap::new();
        values.insert("small".to_string(), Value::I64(-3));
        let bytes = codec().encode_struct("Outer", &values).unwrap();
        assert_eq!(bytes[0], 0xfd);

        values.insert("small".to_string(), Value::I64(300));
        let err = codec().encode_struct("Outer", &values).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }), "{}", err);
    }

    #[test]
    fn extent_reports_stop_offset_on_truncation() {
        let (consumed, result) = codec().decode_struct_with_extent("Outer", &[1, 2, 0, 1, 5, 0]);
        assert!(result.unwrap_err().is_truncated());
        assert_eq!(consumed, 4);
    }
}
