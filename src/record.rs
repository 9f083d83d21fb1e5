//! Records: ordered tuples of typed fields that encode themselves in place.
//!
//! A record is encoded as the concatenation of its fields in declaration
//! order. Nested records carry no length prefix or type tag; the enclosing
//! type already knows what sits at each position. Use [`record!`](crate::record!)
//! to declare one, or implement [`Encode`], [`Decode`] and [`Record`] by hand.

use crate::error::CodecError;
use crate::stream::{Endianness, Sink, Source};
use crate::wire::{Decode, Encode};
use std::io::{Read, Write};

pub trait Record: Encode + Decode + Default {
    /// Type name, for diagnostics.
    const NAME: &'static str;
    /// Field names in wire order.
    const FIELDS: &'static [&'static str];

    /// Replace `self` with a record decoded from `source`.
    ///
    /// On error `self` keeps its previous value.
    fn read_from<R: Read>(&mut self, source: &mut Source<R>) -> Result<(), CodecError> {
        *self = Self::decode(source)?;
        Ok(())
    }

    fn write_to<W: Write>(&self, sink: &mut Sink<W>) -> Result<(), CodecError> {
        self.encode(sink)
    }

    fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        serialize_with(self, Endianness::default())
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CodecError> {
        deserialize_with(bytes, Endianness::default())
    }
}

/// Encode `record` field by field.
pub fn encode_record<T: Record, W: Write>(sink: &mut Sink<W>, record: &T) -> Result<(), CodecError> {
    record.encode(sink)
}

/// Decode one `T` from `source`. Either every field decodes or nothing is returned.
pub fn decode_record<T: Record, R: Read>(source: &mut Source<R>) -> Result<T, CodecError> {
    T::decode(source)
}

/// Serialize to a fresh buffer in the default (little-endian) byte order.
pub fn serialize<T: Record>(record: &T) -> Result<Vec<u8>, CodecError> {
    serialize_with(record, Endianness::default())
}

pub fn serialize_with<T: Record>(record: &T, order: Endianness) -> Result<Vec<u8>, CodecError> {
    let mut sink = Sink::with_order(Vec::with_capacity(record.encoded_len()), order);
    record.encode(&mut sink)?;
    Ok(sink.into_inner())
}

/// Deserialize a whole buffer. Bytes left over after the record are malformed input.
pub fn deserialize<T: Record>(bytes: &[u8]) -> Result<T, CodecError> {
    deserialize_with(bytes, Endianness::default())
}

pub fn deserialize_with<T: Record>(bytes: &[u8], order: Endianness) -> Result<T, CodecError> {
    let mut source = Source::from_slice(bytes, order);
    let record = T::decode(&mut source)?;
    if source.remaining() != 0 {
        return Err(source.malformed(format!(
            "{} trailing byte(s) after {}",
            source.remaining(),
            T::NAME
        )));
    }
    Ok(record)
}

/// Deserialize one record from the front of `bytes`; returns it with the number of bytes consumed.
pub fn deserialize_prefix<T: Record>(bytes: &[u8], order: Endianness) -> Result<(T, usize), CodecError> {
    let mut source = Source::from_slice(bytes, order);
    let record = T::decode(&mut source)?;
    Ok((record, source.consumed()))
}
