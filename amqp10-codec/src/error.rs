use crate::constructor::Type;
use thiserror::Error;

/// A `DecodeError` together with the input position at which decoding stopped.
#[derive(Debug, PartialEq, Error)]
#[error("{inner} at input position {at}")]
pub struct DecoderError {
    #[source]
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn inner(&self) -> &DecodeError {
        &self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }
}

/// Everything that can go wrong while turning bytes into values. Apart from `NotImplemented`, every variant means
/// the payload is malformed.
#[derive(Debug, PartialEq, Error)]
pub enum DecodeError {
    #[error("Unexpected end of buffer while decoding")]
    Eof,
    #[error("String was not valid Utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Symbol contains non-ascii characters")]
    InvalidSymbol,
    #[error("{0:#x} is not a unicode code point")]
    InvalidChar(u32),
    #[error("{0:#04x} is not a valid boolean payload")]
    InvalidBoolean(u8),
    #[error("Unknown constructor {0:#04x}")]
    UnknownConstructor(u8),
    #[error("Decoding of {0} is not implemented")]
    NotImplemented(Type),
    #[error("Map with odd number of elements {0}")]
    OddMap(usize),
    #[error("Declared size {declared} does not match the {actual} bytes of content")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("Nesting exceeds maximum depth {0}")]
    Depth(usize),
    #[error("{what} of length {len} exceeds maximum {max}")]
    Limit { what: &'static str, len: usize, max: usize },
    #[error("Payload of composite {0} is not a list")]
    CompositePayload(String),
    #[error("An allocation failed")]
    Allocation,
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }

    /// The payload was well-formed but uses a type this codec does not support.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, DecodeError::NotImplemented(_))
    }
}

impl From<std::collections::TryReserveError> for DecodeError {
    fn from(_e: std::collections::TryReserveError) -> DecodeError {
        DecodeError::Allocation
    }
}

/// Everything that can go wrong while turning values into bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),
    #[error("Value {value} cannot be encoded as {ty}")]
    Incompatible { ty: Type, value: String },
    #[error("Value {value} is out of range for {ty}")]
    Range { ty: Type, value: String },
    #[error("Array of {expected} cannot hold element {found}")]
    ArrayElement { expected: Type, found: String },
    #[error("Arrays need an explicit element type")]
    UntypedArray,
    #[error("Encoding of {0} is not implemented")]
    NotImplemented(Type),
    #[error("Length {0} exceeds maximum {}", u32::MAX)]
    Length(usize),
}

impl EncodeError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, EncodeError::NotImplemented(_))
    }
}

/// Raised when a value cannot be stored in a composite field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("missing mandatory field: {0}")]
    Missing(&'static str),
    #[error("field {field} does not accept multiple values, got {value}")]
    NotMultiple { field: &'static str, value: String },
    #[error("composite {composite} has no field {field}")]
    UnknownField { composite: &'static str, field: String },
    #[error("field {field} requires {target}, got {value}")]
    Coercion { field: &'static str, target: &'static str, value: String },
    #[error("payload of composite {0} is not a list")]
    Payload(&'static str),
    #[error("field {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: EncodeError,
    },
}

/// Raised when two composite definitions claim the same descriptor.
#[derive(Debug, PartialEq, Error)]
pub enum RegistryError {
    #[error("descriptor code {code:#x} is already registered by {existing}")]
    DuplicateCode { code: u64, existing: String },
    #[error("descriptor name {0} is already registered")]
    DuplicateName(String),
}

/// Raised when a type name is not part of the type table.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("Unknown type name {0}")]
pub struct UnknownType(pub String);
