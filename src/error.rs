//! Error types for the wire codec and the schema loader.

use std::io;
use std::path::PathBuf;

/// Errors raised while encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Sink/source failure other than running out of input. Passed through untouched.
    #[error(transparent)]
    Io(io::Error),
    /// The source ran out of bytes before `what` could be read.
    #[error("truncated input: stream ended at byte {offset} while reading {what}")]
    Truncated { offset: usize, what: &'static str },
    /// The bytes were all there but do not form a valid value.
    #[error("malformed input at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
    /// A string, list or map is too long for its 32-bit prefix.
    #[error("length {0} does not fit a 32-bit length prefix")]
    LengthOverflow(usize),
    #[error("Unknown struct: {0}")]
    UnknownStruct(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("field {field}: expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },
}

impl CodecError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::Truncated { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, CodecError::Malformed { .. })
    }
}

/// Errors raised while parsing or resolving schema files.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parse error: {0}")]
    Syntax(String),
    #[error("Duplicate struct name: {0}")]
    DuplicateStruct(String),
    #[error("struct {structure}: duplicate field {field}")]
    DuplicateField { structure: String, field: String },
    #[error("struct {structure}: unknown type {name}")]
    UnknownType { structure: String, name: String },
    #[error("struct {structure}, field {field}: map key must be an integer or bool scalar")]
    InvalidMapKey { structure: String, field: String },
    #[error("struct {structure}, field {field}: invalid default value: {reason}")]
    InvalidDefault {
        structure: String,
        field: String,
        reason: String,
    },
    #[error("struct {0} contains itself by direct nesting")]
    RecursiveStruct(String),
}
