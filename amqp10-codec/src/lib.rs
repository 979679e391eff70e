//! The AMQP 1.0 type system: primitive values, their binary encoding and the composite types built on top of
//! described lists.
//!
//! All encoding functions take a value and a writer and return the amount of written bytes. All decoding functions
//! take a buffer and return the value and the number of consumed bytes.
//!
//! # Picking a wire type
//!
//! Many values have more than one possible representation on wire. Concrete variants such as `Value::Ulong` always
//! stay within their family while `Value::Number` lets the encoder infer one. Within a family the narrowest
//! constructor wins, so `Value::Ulong(0)` takes a single byte. To pin a value to a family, wrap it in
//! `Value::Forced`; arrays additionally need their element type spelled out since all elements share one constructor.
//!
//! # A note on Maps
//!
//! The variant `Value::Map` uses a `Vec` of key-value pairs internally because Rust's floating point types `f32` and
//! `f64` implement neither `Ord` nor `Hash` and thus a `Value` cannot be used as a key in any of the standard library
//! maps. Decoding a map with duplicate keys keeps the last value.
//!
//! # Composites
//!
//! Composite types are described lists with named fields. They are defined once at startup and registered in a
//! [`Registry`] which is then handed to every decode so that described values with a known descriptor come back as
//! [`Composite`]s. The common definitions of the messaging layer come with [`Registry::standard`].
//!
//! # Examples
//!
//! ```
//! use amqp10_codec::*;
//!
//! let mut buf = Vec::new();
//! let value = Value::List(vec![Value::Number(1.0), Value::symbol("a")]);
//! encode(&value, &mut buf).unwrap();
//! assert_eq!(buf, [
//!     0xc0, // list8
//!     0x06, // size in bytes, including the count
//!     0x02, // count
//!     0x52, // smalluint
//!     0x01, // 1
//!     0xa3, // sym8
//!     0x01, // length
//!     0x61, // 'a'
//! ]);
//! let registry = Registry::standard().unwrap();
//! let decoded = decode(&buf, 0, None, &registry).unwrap();
//! assert_eq!(Value::List(vec![Value::Uint(1), Value::symbol("a")]), decoded.0);
//! assert_eq!(8, decoded.1);
//!
//! let header = registry.by_code(definitions::HEADER).unwrap().create(vec![
//!     ("durable", FieldValue::from(true)),
//! ]).unwrap();
//! buf.clear();
//! encode(&header.clone().into(), &mut buf).unwrap();
//! let decoded = decode(&buf, 0, None, &registry).unwrap();
//! assert_eq!(Some(&header), decoded.0.as_composite());
//! ```

mod codec;
mod composite;
mod config;
mod constructor;
pub mod definitions;
mod error;
mod field;
mod value;
mod wrapper;

pub use codec::*;
pub use composite::*;
pub use config::*;
pub use constructor::*;
pub use error::*;
pub use field::*;
pub use value::*;
pub use wrapper::*;

use std::io::Write;

/// Appends the encoding of `value` to `sink`.
pub fn encode<W: Write>(value: &Value, sink: &mut W) -> Result<usize, EncodeError> {
    Encoder::encode(value, sink)
}

/// Decodes one value starting at `offset`. If the constructor is already known, e.g. because it is shared by the
/// elements of an array, pass it as `forced` and only the payload is read. The returned count does not include the
/// skipped offset.
pub fn decode<B: ?Sized + AsRef<[u8]>>(
    buf: &B,
    offset: usize,
    forced: Option<Constructor>,
    registry: &Registry,
) -> Result<(Value, usize), DecoderError> {
    let mut decoder = Decoder::new(buf, registry).starting_at(offset);
    let value = decoder.read(forced)?;
    Ok((value, decoder.position() - offset))
}
