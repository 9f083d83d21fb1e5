//! # smecodec: fixed-layout binary records
//!
//! A compact binary encoding for structured records made of scalars, strings,
//! lists, nested records and maps, plus a small schema language describing
//! such records.
//!
//! ## Wire format
//!
//! - Scalars: raw fixed-width bytes (`u8`..`u64`, `i8`..`i64`, `bool` as one
//!   byte 0/1, `f32`, `f64`). Little-endian unless big-endian is selected.
//! - Strings: `u32` byte length, then the bytes.
//! - `list[T]`: `u32` count, then the elements.
//! - `map[K, V]`: `u32` count, then key/value pairs. On decode a repeated key
//!   keeps the last value.
//! - Nested records: their fields in place, no prefix or tag.
//!
//! ## Two ways in
//!
//! - **Typed**: declare Rust structs with [`record!`] and use [`serialize`] /
//!   [`deserialize`] (or [`Record`] methods).
//! - **Schema-driven**: [`parse`] / [`load_dir`] schema files, [`ResolvedSchema::resolve`]
//!   them, and encode/decode [`Value`]s with a [`Codec`]. Both produce the same bytes.
//!
//! ## Example schema
//!
//! ```text
//! syntax 1.0.0
//! package example
//!
//! struct NestedStruct {
//!     uint32 field1
//!     int64 field2
//!     double field3, field4
//! }
//!
//! struct ExampleClass1 {
//!     uint32 field1 = 4
//!     string field5 = "abacaba"
//!     list[NestedStruct] field8
//!     map[uint32, NestedStruct] field10
//! }
//! ```
//!
//! See `tests/wire.rs` and `tests/integration.rs` for full examples.

#[macro_use]
pub mod macros;

pub mod ast;
pub mod codec;
pub mod dump;
pub mod error;
pub mod parser;
pub mod record;
pub mod stream;
pub mod value;
pub mod wire;

pub use ast::{FieldDef, FieldType, Literal, ResolvedSchema, ScalarType, Schema, StructDef};
pub use codec::Codec;
pub use error::{CodecError, SchemaError};
pub use parser::{load_dir, parse, parse_file};
pub use record::{decode_record, deserialize, deserialize_prefix, deserialize_with, encode_record, serialize, serialize_with, Record};
pub use stream::{Endianness, Sink, Source, DEFAULT_MAX_DEPTH};
pub use value::{MapBuilder, Value};
pub use wire::{Decode, Encode, MapKey, Scalar};
