//! Wire layout for the typed API: scalars, strings, lists and maps.
//!
//! | Kind        | Layout                                         |
//! |-------------|------------------------------------------------|
//! | scalar      | raw fixed-width bytes                          |
//! | string      | `u32` byte length, then the bytes              |
//! | `list<T>`   | `u32` count, then each element                 |
//! | `map<K, V>` | `u32` count, then key and value for each entry |
//! | record      | its fields in declaration order, no wrapper    |
//!
//! There is no header, tag, padding or terminator anywhere. The list and map
//! algorithms are shared with the schema-driven codec through the `*_with`
//! functions, which take the element codec as a closure.

use crate::error::CodecError;
use crate::stream::{Sink, Source, PREALLOC_LIMIT};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::{Read, Write};
use std::mem::size_of;

/// Types that can write themselves to a [`Sink`].
pub trait Encode {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError>;

    /// Exact number of bytes `encode` writes.
    fn encoded_len(&self) -> usize;
}

/// Types that can read themselves back from a [`Source`].
pub trait Decode: Sized {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError>;
}

/// Fixed-width scalar kinds.
pub trait Scalar: Encode + Decode + Copy {
    const SIZE: usize;
}

/// Scalars usable as map keys.
pub trait MapKey: Scalar + Ord + Hash {}

macro_rules! impl_scalar {
    ($($ty:ty => $write:ident, $read:ident);* $(;)?) => {
        $(
            impl Encode for $ty {
                #[inline]
                fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
                    sink.$write(*self)
                }
                #[inline]
                fn encoded_len(&self) -> usize {
                    size_of::<$ty>()
                }
            }

            impl Decode for $ty {
                #[inline]
                fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
                    source.$read()
                }
            }

            impl Scalar for $ty {
                const SIZE: usize = size_of::<$ty>();
            }
        )*
    };
}

impl_scalar! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl MapKey for u8 {}
impl MapKey for u16 {}
impl MapKey for u32 {}
impl MapKey for u64 {}
impl MapKey for i8 {}
impl MapKey for i16 {}
impl MapKey for i32 {}
impl MapKey for i64 {}
impl MapKey for bool {}

impl Encode for bool {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        sink.write_u8(u8::from(*self))
    }
    fn encoded_len(&self) -> usize {
        1
    }
}

impl Decode for bool {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
        match source.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::Malformed {
                offset: source.consumed() - 1,
                reason: format!("bool byte must be 0 or 1, got {}", other),
            }),
        }
    }
}

impl Scalar for bool {
    const SIZE: usize = 1;
}

/// Write a scalar with no prefix.
pub fn encode_scalar<T: Scalar, W: Write>(sink: &mut Sink<W>, value: T) -> Result<(), CodecError> {
    value.encode(sink)
}

/// Read exactly `T::SIZE` bytes as a `T`.
pub fn decode_scalar<T: Scalar, R: Read>(source: &mut Source<R>) -> Result<T, CodecError> {
    T::decode(source)
}

/// Write a length-prefixed byte string.
pub fn encode_string<W: Write>(sink: &mut Sink<W>, bytes: &[u8]) -> Result<(), CodecError> {
    sink.write_len(bytes.len())?;
    sink.write_raw(bytes)
}

/// Read a length-prefixed byte string. The content is not validated.
pub fn decode_string<R: Read>(source: &mut Source<R>) -> Result<Vec<u8>, CodecError> {
    let n = source.read_len()?;
    source.read_raw(n)
}

impl Encode for str {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        encode_string(sink, self.as_bytes())
    }
    fn encoded_len(&self) -> usize {
        4 + self.len()
    }
}

impl Encode for String {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        self.as_str().encode(sink)
    }
    fn encoded_len(&self) -> usize {
        self.as_str().encoded_len()
    }
}

/// `String` fields must hold UTF-8; use `Vec<u8>` for opaque bytes (same layout).
impl Decode for String {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
        let start = source.consumed();
        let bytes = decode_string(source)?;
        String::from_utf8(bytes).map_err(|e| CodecError::Malformed {
            offset: start + 4 + e.utf8_error().valid_up_to(),
            reason: "string is not valid UTF-8".to_string(),
        })
    }
}

/// Write a count prefix, then every item through `encode_item`.
pub fn encode_list_with<T, W, F>(sink: &mut Sink<W>, items: &[T], mut encode_item: F) -> Result<(), CodecError>
where
    W: Write,
    F: FnMut(&mut Sink<W>, &T) -> Result<(), CodecError>,
{
    sink.write_len(items.len())?;
    for item in items {
        encode_item(sink, item)?;
    }
    Ok(())
}

/// Read a count prefix, then that many items through `decode_item`.
/// The list counts as one nesting level on `source`.
pub fn decode_list_with<T, R, F>(source: &mut Source<R>, mut decode_item: F) -> Result<Vec<T>, CodecError>
where
    R: Read,
    F: FnMut(&mut Source<R>) -> Result<T, CodecError>,
{
    source.nested(|source| {
        let n = source.read_len()?;
        let mut out = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        for _ in 0..n {
            out.push(decode_item(source)?);
        }
        Ok(out)
    })
}

pub fn encode_list<T: Encode, W: Write>(sink: &mut Sink<W>, items: &[T]) -> Result<(), CodecError> {
    encode_list_with(sink, items, |s, item| item.encode(s))
}

pub fn decode_list<T: Decode, R: Read>(source: &mut Source<R>) -> Result<Vec<T>, CodecError> {
    decode_list_with(source, T::decode)
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        encode_list(sink, self)
    }
    fn encoded_len(&self) -> usize {
        4 + self.iter().map(Encode::encoded_len).sum::<usize>()
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
        decode_list(source)
    }
}

/// Write a count prefix, then key and value of every entry in iteration order.
pub fn encode_map_with<'a, K, V, W, I, FK, FV>(
    sink: &mut Sink<W>,
    entries: I,
    mut encode_key: FK,
    mut encode_value: FV,
) -> Result<(), CodecError>
where
    K: 'a,
    V: 'a,
    W: Write,
    I: IntoIterator<Item = (&'a K, &'a V)>,
    I::IntoIter: ExactSizeIterator,
    FK: FnMut(&mut Sink<W>, &K) -> Result<(), CodecError>,
    FV: FnMut(&mut Sink<W>, &V) -> Result<(), CodecError>,
{
    let entries = entries.into_iter();
    sink.write_len(entries.len())?;
    for (k, v) in entries {
        encode_key(sink, k)?;
        encode_value(sink, v)?;
    }
    Ok(())
}

/// Read a count prefix, then that many key/value pairs, handing each to `insert`
/// in stream order. Containers with insert-overwrites semantics therefore keep
/// the last value written for a repeated key.
pub fn decode_map_with<K, V, R, FK, FV, FI>(
    source: &mut Source<R>,
    mut decode_key: FK,
    mut decode_value: FV,
    mut insert: FI,
) -> Result<(), CodecError>
where
    R: Read,
    FK: FnMut(&mut Source<R>) -> Result<K, CodecError>,
    FV: FnMut(&mut Source<R>) -> Result<V, CodecError>,
    FI: FnMut(K, V),
{
    source.nested(|source| {
        let n = source.read_len()?;
        for _ in 0..n {
            let k = decode_key(source)?;
            let v = decode_value(source)?;
            insert(k, v);
        }
        Ok(())
    })
}

/// Encode a `HashMap` with its entries sorted by key, so equal maps always
/// produce identical bytes.
pub fn encode_map<K, V, S, W>(sink: &mut Sink<W>, map: &HashMap<K, V, S>) -> Result<(), CodecError>
where
    K: MapKey,
    V: Encode,
    W: Write,
{
    let mut entries: Vec<(&K, &V)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    encode_map_with(sink, entries, |s, k| k.encode(s), |s, v| v.encode(s))
}

pub fn decode_map<K, V, S, R>(source: &mut Source<R>) -> Result<HashMap<K, V, S>, CodecError>
where
    K: MapKey,
    V: Decode,
    S: BuildHasher + Default,
    R: Read,
{
    let mut map = HashMap::default();
    decode_map_with(source, K::decode, V::decode, |k, v| {
        map.insert(k, v);
    })?;
    Ok(map)
}

impl<K: MapKey, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        encode_map(sink, self)
    }
    fn encoded_len(&self) -> usize {
        4 + self.iter().map(|(k, v)| k.encoded_len() + v.encoded_len()).sum::<usize>()
    }
}

impl<K: MapKey, V: Decode, S: BuildHasher + Default> Decode for HashMap<K, V, S> {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
        decode_map(source)
    }
}

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        encode_map_with(sink, self, |s, k| k.encode(s), |s, v| v.encode(s))
    }
    fn encoded_len(&self) -> usize {
        4 + self.iter().map(|(k, v)| k.encoded_len() + v.encoded_len()).sum::<usize>()
    }
}

impl<K: MapKey, V: Decode> Decode for BTreeMap<K, V> {
    fn decode<R: Read>(source: &mut Source<R>) -> Result<Self, CodecError> {
        let mut map = BTreeMap::new();
        decode_map_with(source, K::decode, V::decode, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Endianness;

    fn encode_le<T: Encode + ?Sized>(v: &T) -> Vec<u8> {
        let mut sink = Sink::new(Vec::new());
        v.encode(&mut sink).unwrap();
        assert_eq!(sink.written(), v.encoded_len());
        sink.into_inner()
    }

    #[test]
    fn string_layout_is_length_then_bytes() {
        assert_eq!(encode_le("ab"), vec![2, 0, 0, 0, b'a', b'b']);
        assert_eq!(encode_le(""), vec![0, 0, 0, 0]);
    }

    #[test]
    fn opaque_bytes_share_the_string_layout() {
        let bytes: Vec<u8> = vec![0xff, 0xfe];
        let encoded = encode_le(&bytes);
        assert_eq!(encoded, vec![2, 0, 0, 0, 0xff, 0xfe]);
        let mut src = Source::from_slice(&encoded, Endianness::Little);
        assert_eq!(decode_string(&mut src).unwrap(), bytes);
    }

    #[test]
    fn invalid_utf8_is_malformed_for_typed_strings() {
        let encoded = [2u8, 0, 0, 0, 0xff, 0xfe];
        let mut src = Source::from_slice(&encoded, Endianness::Little);
        let err = String::decode(&mut src).unwrap_err();
        assert!(err.is_malformed(), "{}", err);
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let mut src = Source::from_slice(&[2u8], Endianness::Little);
        assert!(bool::decode(&mut src).unwrap_err().is_malformed());
        let mut src = Source::from_slice(&[1u8, 0], Endianness::Little);
        assert!(bool::decode(&mut src).unwrap());
        assert!(!bool::decode(&mut src).unwrap());
    }

    #[test]
    fn hash_map_is_encoded_in_key_order() {
        let mut m = HashMap::new();
        for k in [9u32, 1, 5] {
            m.insert(k, k as u8);
        }
        let encoded = encode_le(&m);
        assert_eq!(
            encoded,
            vec![3, 0, 0, 0, 1, 0, 0, 0, 1, 5, 0, 0, 0, 5, 9, 0, 0, 0, 9]
        );
    }

    #[test]
    fn huge_list_count_is_truncation_not_allocation() {
        let encoded = [0xffu8, 0xff, 0xff, 0xff, 1, 0, 0, 0];
        let mut src = Source::from_slice(&encoded, Endianness::Little);
        let err = Vec::<u32>::decode(&mut src).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn scalar_helpers_round_trip_big_endian() {
        let mut sink = Sink::with_order(Vec::new(), Endianness::Big);
        encode_scalar(&mut sink, -2i16).unwrap();
        encode_scalar(&mut sink, 0.5f32).unwrap();
        let bytes = sink.into_inner();
        assert_eq!(&bytes[..2], &[0xff, 0xfe]);
        let mut src = Source::from_slice(&bytes, Endianness::Big);
        assert_eq!(decode_scalar::<i16, _>(&mut src).unwrap(), -2);
        assert_eq!(decode_scalar::<f32, _>(&mut src).unwrap(), 0.5);
    }
}
