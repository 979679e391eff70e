//! Conversion between values and their wire representation. Encoding always picks the narrowest constructor of a
//! family which can carry the value. Containers are encoded into a scratch buffer first so their size and count are
//! known before the width of the size prefix gets chosen.

use crate::composite::{Describe, Registry};
use crate::config::Limits;
use crate::constructor::{Constructor, Layout, Type};
use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::value::Value;
use crate::wrapper::{coerce, Array};
use log::{debug, trace};
use std::collections::hash_map::{Entry, HashMap};
use std::io::Write;
use std::str::from_utf8;
use uuid::Uuid;

/// A value reduced to the parts which don't depend on the constructor, so that the same value can be written under
/// any constructor of its family. Arrays need this to write all elements under one shared constructor.
enum Body {
    /// A fixed width value, written at the width of the constructor
    Scalar(Value),
    /// Raw bytes of a binary, string or symbol
    Bytes(Vec<u8>),
    /// Encoded elements of a list or map, or the shared constructor and payloads of an array
    Counted { count: usize, content: Vec<u8> },
    /// Encoded descriptor and value
    Raw(Vec<u8>),
}

struct Prepared {
    constructor: Constructor,
    body: Body,
}

impl Prepared {
    fn new(constructor: Constructor, body: Body) -> Self {
        Self { constructor, body }
    }
}

/// Used to encode values into AMQP wire format.
pub struct Encoder<'w, W: Write> {
    writer: &'w mut W,
}

impl<'w, W: Write> Encoder<'w, W> {

    /// Encode a value to the given writer. The resulting `usize` is the amount of bytes that got written.
    pub fn encode(value: &Value, writer: &'w mut W) -> Result<usize, EncodeError> {
        Self { writer }.encode_inner(value)
    }

    fn encode_inner(&mut self, value: &Value) -> Result<usize, EncodeError> {
        let prepared = prepare(value)?;
        let c = prepared.constructor.encode(self.writer)?;
        Ok(c + write_body(self.writer, prepared.constructor, &prepared.body)?)
    }

}

/// Infers the family of a native number. Integral values prefer the unsigned 32 bit family, then the 64 bit ones;
/// everything else becomes a double. Integers above 2^53 can't be represented exactly and are encoded best effort.
pub(crate) fn infer(n: f64) -> Value {
    if !n.is_finite() || n.fract() != 0.0 {
        Value::Double(n)
    } else if n >= 0.0 && n <= f64::from(u32::MAX) {
        Value::Uint(n as u32)
    } else if n >= 0.0 {
        Value::Ulong(n as u64)
    } else if n >= f64::from(i32::MIN) {
        Value::Int(n as i32)
    } else {
        Value::Long(n as i64)
    }
}

fn prepare(value: &Value) -> Result<Prepared, EncodeError> {
    use Constructor as C;
    let scalar = |c: Constructor| Ok(Prepared::new(c, Body::Scalar(value.clone())));
    match value {
        Value::Null                              => scalar(C::Null),
        Value::Bool(true)                        => scalar(C::True),
        Value::Bool(false)                       => scalar(C::False),
        Value::Ubyte(_)                          => scalar(C::Ubyte),
        Value::Ushort(_)                         => scalar(C::Ushort),
        Value::Uint(0)                           => scalar(C::Uint0),
        Value::Uint(v) if *v <= 0xff             => scalar(C::SmallUint),
        Value::Uint(_)                           => scalar(C::Uint),
        Value::Ulong(0)                          => scalar(C::Ulong0),
        Value::Ulong(v) if *v <= 0xff            => scalar(C::SmallUlong),
        Value::Ulong(_)                          => scalar(C::Ulong),
        Value::Byte(_)                           => scalar(C::Byte),
        Value::Short(_)                          => scalar(C::Short),
        Value::Int(v) if i8::try_from(*v).is_ok()  => scalar(C::SmallInt),
        Value::Int(_)                            => scalar(C::Int),
        Value::Long(v) if i8::try_from(*v).is_ok() => scalar(C::SmallLong),
        Value::Long(_)                           => scalar(C::Long),
        Value::Float(_)                          => scalar(C::Float),
        Value::Double(_)                         => scalar(C::Double),
        Value::Char(_)                           => scalar(C::Char),
        Value::Timestamp(_)                      => scalar(C::Timestamp),
        Value::Uuid(_)                           => scalar(C::Uuid),
        Value::Binary(v)                         => Ok(variable(C::Vbin8, C::Vbin32, v.clone())),
        Value::String(v)                         => Ok(variable(C::Str8, C::Str32, v.as_bytes().to_vec())),
        Value::Symbol(v) if v.is_ascii()         => Ok(variable(C::Sym8, C::Sym32, v.as_bytes().to_vec())),
        Value::Symbol(v)                         => Err(EncodeError::Incompatible { ty: Type::Symbol, value: v.clone() }),
        Value::Number(v)                         => prepare(&infer(*v)),
        Value::List(v) if v.is_empty()           => Ok(Prepared::new(C::List0, Body::Counted { count: 0, content: Vec::new() })),
        Value::List(v) => {
            let mut content = Vec::new();
            for element in v.iter() {
                Encoder::encode(element, &mut content)?;
            }
            Ok(counted(C::List8, C::List32, v.len(), content))
        },
        Value::Map(v) => {
            let mut content = Vec::new();
            for (key, val) in v.iter() {
                Encoder::encode(key, &mut content)?;
                Encoder::encode(val, &mut content)?;
            }
            Ok(counted(C::Map8, C::Map32, v.len() * 2, content))
        },
        Value::Array(v)                          => prepare_array(v),
        Value::Described(v) => {
            let mut content = Vec::new();
            Encoder::encode(&v.descriptor, &mut content)?;
            Encoder::encode(&v.value, &mut content)?;
            Ok(Prepared::new(C::Described, Body::Raw(content)))
        },
        Value::Composite(v)                      => prepare(&Value::Described(Box::new(v.to_described()))),
        Value::Forced(v)                         => prepare(&v.resolve()?),
    }
}

fn variable(narrow: Constructor, wide: Constructor, bytes: Vec<u8>) -> Prepared {
    let constructor = if bytes.len() <= 0xff { narrow } else { wide };
    Prepared::new(constructor, Body::Bytes(bytes))
}

/// The size of a list, map or array includes the count, which is as wide as the size.
fn counted(narrow: Constructor, wide: Constructor, count: usize, content: Vec<u8>) -> Prepared {
    let constructor = if content.len() + 1 <= 0xff && count <= 0xff { narrow } else { wide };
    trace!("{} elements in {} bytes use {}", count, content.len(), constructor);
    Prepared::new(constructor, Body::Counted { count, content })
}

fn prepare_array(array: &Array) -> Result<Prepared, EncodeError> {
    let ty = array.element_type();
    let mut elements = Vec::with_capacity(array.len());
    for element in array.elements() {
        elements.push(prepare_element(ty, element)?);
    }
    // every element must fit the shared constructor, so the widest one wins
    let element = match ty {
        Type::Boolean => Constructor::Boolean,
        Type::Decimal32 | Type::Decimal64 | Type::Decimal128 => { return Err(EncodeError::NotImplemented(ty)); },
        _ => elements.iter()
            .map(|p| p.constructor)
            .max_by_key(Constructor::rank)
            .unwrap_or(ty.constructors()[0]),
    };
    let mut content = Vec::new();
    if let Some(descriptor) = array.descriptor() {
        Constructor::Described.encode(&mut content)?;
        Encoder::encode(descriptor, &mut content)?;
    }
    element.encode(&mut content)?;
    for p in elements.iter() {
        write_body(&mut content, element, &p.body)?;
    }
    Ok(counted(Constructor::Array8, Constructor::Array32, array.len(), content))
}

fn prepare_element(ty: Type, element: &Value) -> Result<Prepared, EncodeError> {
    let mismatch = || EncodeError::ArrayElement { expected: ty, found: element.to_string() };
    match element.natural_type() {
        Some(t) if t != ty                                   => { return Err(mismatch()); },
        None if !matches!(element.unwrapped(), Value::Number(_)) => { return Err(mismatch()); },
        _ if element.is_null() && ty != Type::Null           => { return Err(mismatch()); },
        _ => {},
    }
    let value = coerce(ty, element).map_err(|e| if e.is_not_implemented() { e } else { mismatch() })?;
    prepare(&value)
}

fn write_length<W: Write>(w: &mut W, width: usize, len: usize) -> Result<usize, EncodeError> {
    if width == 1 {
        w.write_all(&[u8::try_from(len).map_err(|_| EncodeError::Length(len))?])?;
    } else {
        w.write_all(&u32::try_from(len).map_err(|_| EncodeError::Length(len))?.to_be_bytes())?;
    }
    Ok(width)
}

fn write_body<W: Write>(w: &mut W, constructor: Constructor, body: &Body) -> Result<usize, EncodeError> {
    match (constructor.layout(), body) {
        (Layout::Fixed(0), _)                    => Ok(0),
        (Layout::Fixed(_), Body::Scalar(v))      => write_scalar(w, constructor, v),
        (Layout::Variable(width), Body::Bytes(v)) => {
            let c = write_length(w, width, v.len())?;
            w.write_all(v)?;
            Ok(c + v.len())
        },
        (Layout::Compound(width) | Layout::Array(width), Body::Counted { count, content }) => {
            let mut c = write_length(w, width, content.len() + width)?;
            c += write_length(w, width, *count)?;
            w.write_all(content)?;
            Ok(c + content.len())
        },
        (Layout::Described, Body::Raw(v)) => {
            w.write_all(v)?;
            Ok(v.len())
        },
        _ => Err(EncodeError::Incompatible {
            ty: constructor.family().unwrap_or(Type::Null),
            value: constructor.to_string(),
        }),
    }
}

fn write_scalar<W: Write>(w: &mut W, constructor: Constructor, value: &Value) -> Result<usize, EncodeError> {
    use Constructor as C;
    let mut buf = [0u8; 16];
    let len = {
        let mut put = |bytes: &[u8]| {
            buf[..bytes.len()].copy_from_slice(bytes);
            bytes.len()
        };
        match (constructor, value) {
            (C::Boolean, Value::Bool(v))       => put(&[u8::from(*v)]),
            (C::Ubyte, Value::Ubyte(v))        => put(&[*v]),
            (C::Byte, Value::Byte(v))          => put(&v.to_be_bytes()),
            (C::SmallUint, Value::Uint(v))     => put(&[*v as u8]),
            (C::SmallUlong, Value::Ulong(v))   => put(&[*v as u8]),
            (C::SmallInt, Value::Int(v))       => put(&(*v as i8).to_be_bytes()),
            (C::SmallLong, Value::Long(v))     => put(&(*v as i8).to_be_bytes()),
            (C::Ushort, Value::Ushort(v))      => put(&v.to_be_bytes()),
            (C::Short, Value::Short(v))        => put(&v.to_be_bytes()),
            (C::Uint, Value::Uint(v))          => put(&v.to_be_bytes()),
            (C::Int, Value::Int(v))            => put(&v.to_be_bytes()),
            (C::Float, Value::Float(v))        => put(&v.to_be_bytes()),
            (C::Char, Value::Char(v))          => put(&u32::from(*v).to_be_bytes()),
            (C::Ulong, Value::Ulong(v))        => put(&v.to_be_bytes()),
            (C::Long, Value::Long(v))          => put(&v.to_be_bytes()),
            (C::Double, Value::Double(v))      => put(&v.to_be_bytes()),
            (C::Timestamp, Value::Timestamp(v)) => put(&v.to_be_bytes()),
            (C::Uuid, Value::Uuid(v))          => put(v.as_bytes()),
            _ => {
                return Err(EncodeError::Incompatible {
                    ty: constructor.family().unwrap_or(Type::Null),
                    value: value.to_string(),
                });
            },
        }
    };
    w.write_all(&buf[..len])?;
    Ok(len)
}

/// Used to decode values from AMQP wire format. Described values whose descriptor is known to the registry are turned
/// into composites.
pub struct Decoder<'a, 'r> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    limits: Limits,
    registry: &'r Registry,
}

impl<'a, 'r> Decoder<'a, 'r> {

    pub fn new<B: ?Sized + AsRef<[u8]>>(buf: &'a B, registry: &'r Registry) -> Self {
        Self { buf: buf.as_ref(), pos: 0, depth: 0, limits: Limits::default(), registry }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Continue decoding at the given absolute offset.
    pub fn starting_at(mut self, offset: usize) -> Self {
        self.pos = offset;
        self
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode a single value from the given buffer, returning it along with the number of consumed bytes.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B, registry: &'r Registry) -> Result<(Value, usize), DecoderError> {
        let mut decoder = Self::new(buf, registry);
        let value = decoder.read(None)?;
        Ok((value, decoder.pos))
    }

    /// Decode the next value. If the constructor has already been fixed by an enclosing container, pass it as
    /// `forced` and only the payload will be read.
    pub fn read(&mut self, forced: Option<Constructor>) -> Result<Value, DecoderError> {
        self.decode_value(forced).map_err(|e| e.at(self.pos))
    }

    fn decode_value(&mut self, forced: Option<Constructor>) -> Result<Value, DecodeError> {
        let constructor = match forced {
            Some(c) => c,
            None    => self.decode_constructor()?,
        };
        match constructor.layout() {
            Layout::Fixed(_)        => self.decode_fixed(constructor),
            Layout::Variable(width) => self.decode_variable(constructor, width),
            Layout::Compound(width) => self.nested(|d| d.decode_compound(constructor, width)),
            Layout::Array(width)    => self.nested(|d| d.decode_array(width)),
            Layout::Described       => self.nested(|d| d.decode_described()),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, DecodeError>) -> Result<T, DecodeError> {
        if self.depth >= self.limits.max_depth {
            return Err(DecodeError::Depth(self.limits.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn decode_fixed(&mut self, constructor: Constructor) -> Result<Value, DecodeError> {
        use Constructor as C;
        Ok(match constructor {
            C::Null       => Value::Null,
            C::True       => Value::Bool(true),
            C::False      => Value::Bool(false),
            C::Uint0      => Value::Uint(0),
            C::Ulong0     => Value::Ulong(0),
            C::List0      => Value::List(Vec::new()),
            C::Boolean    => match self.fixed::<1>()? {
                [0] => Value::Bool(false),
                [1] => Value::Bool(true),
                [b] => { return Err(DecodeError::InvalidBoolean(b)); },
            },
            C::Ubyte      => Value::Ubyte(u8::from_be_bytes(self.fixed()?)),
            C::Byte       => Value::Byte(i8::from_be_bytes(self.fixed()?)),
            C::SmallUint  => Value::Uint(u8::from_be_bytes(self.fixed()?).into()),
            C::SmallUlong => Value::Ulong(u8::from_be_bytes(self.fixed()?).into()),
            C::SmallInt   => Value::Int(i8::from_be_bytes(self.fixed()?).into()),
            C::SmallLong  => Value::Long(i8::from_be_bytes(self.fixed()?).into()),
            C::Ushort     => Value::Ushort(u16::from_be_bytes(self.fixed()?)),
            C::Short      => Value::Short(i16::from_be_bytes(self.fixed()?)),
            C::Uint       => Value::Uint(u32::from_be_bytes(self.fixed()?)),
            C::Int        => Value::Int(i32::from_be_bytes(self.fixed()?)),
            C::Float      => Value::Float(f32::from_be_bytes(self.fixed()?)),
            C::Char       => {
                let code = u32::from_be_bytes(self.fixed()?);
                Value::Char(char::from_u32(code).ok_or(DecodeError::InvalidChar(code))?)
            },
            C::Ulong      => Value::Ulong(u64::from_be_bytes(self.fixed()?)),
            C::Long       => Value::Long(i64::from_be_bytes(self.fixed()?)),
            C::Double     => Value::Double(f64::from_be_bytes(self.fixed()?)),
            C::Timestamp  => Value::Timestamp(i64::from_be_bytes(self.fixed()?)),
            C::Uuid       => Value::Uuid(Uuid::from_bytes(self.fixed()?)),
            C::Decimal32  => { return Err(DecodeError::NotImplemented(Type::Decimal32)); },
            C::Decimal64  => { return Err(DecodeError::NotImplemented(Type::Decimal64)); },
            C::Decimal128 => { return Err(DecodeError::NotImplemented(Type::Decimal128)); },
            c             => { return Err(DecodeError::UnknownConstructor(c as u8)); },
        })
    }

    fn decode_variable(&mut self, constructor: Constructor, width: usize) -> Result<Value, DecodeError> {
        let len = self.decode_length(width)?;
        if len > self.limits.max_payload_len {
            return Err(DecodeError::Limit { what: constructor.name(), len, max: self.limits.max_payload_len });
        }
        let bytes = self.decode_slice(len)?;
        Ok(match constructor {
            Constructor::Vbin8 | Constructor::Vbin32 => Value::Binary(bytes.to_vec()),
            Constructor::Str8 | Constructor::Str32   => Value::String(from_utf8(bytes)?.to_owned()),
            _ if bytes.is_ascii()                    => Value::Symbol(from_utf8(bytes)?.to_owned()),
            _                                        => { return Err(DecodeError::InvalidSymbol); },
        })
    }

    fn decode_compound(&mut self, constructor: Constructor, width: usize) -> Result<Value, DecodeError> {
        let (size, start) = self.decode_size(width)?;
        let count = self.decode_count(constructor, width)?;
        fits(constructor, count, size.saturating_sub(width))?;
        let value = match constructor {
            Constructor::List8 | Constructor::List32 => {
                let mut elements = Vec::new();
                elements.try_reserve(count.min(size))?;
                for _ in 0..count {
                    elements.push(self.decode_value(None)?);
                }
                Value::List(elements)
            },
            _ if count % 2 != 0 => { return Err(DecodeError::OddMap(count)); },
            _ => {
                let mut entries: Vec<(Value, Value)> = Vec::new();
                entries.try_reserve((count / 2).min(size))?;
                // keys are identified by their narrowest encoding, the last occurrence of a key wins
                let mut positions: HashMap<Vec<u8>, usize> = HashMap::new();
                positions.try_reserve((count / 2).min(size))?;
                for _ in 0..count / 2 {
                    let key = self.decode_value(None)?;
                    let val = self.decode_value(None)?;
                    let mut canonical = Vec::new();
                    if Encoder::encode(&key, &mut canonical).is_err() {
                        entries.push((key, val));
                        continue;
                    }
                    match positions.entry(canonical) {
                        Entry::Occupied(e) => entries[*e.get()].1 = val,
                        Entry::Vacant(e)   => {
                            e.insert(entries.len());
                            entries.push((key, val));
                        },
                    }
                }
                Value::Map(entries)
            },
        };
        self.expect_consumed(start, size)?;
        Ok(value)
    }

    fn decode_array(&mut self, width: usize) -> Result<Value, DecodeError> {
        let array = if width == 1 { Constructor::Array8 } else { Constructor::Array32 };
        let (size, start) = self.decode_size(width)?;
        let count = self.decode_count(array, width)?;
        let (descriptor, element) = match self.decode_constructor()? {
            Constructor::Described => {
                let descriptor = self.decode_value(None)?;
                (Some(descriptor), self.decode_constructor()?)
            },
            c => (None, c),
        };
        let ty = element.family().ok_or(DecodeError::UnknownConstructor(element as u8))?;
        // elements without payload are only bounded by the container limit
        if element.layout() != Layout::Fixed(0) {
            fits(array, count, size.saturating_sub(width))?;
        }
        let mut elements = Vec::new();
        elements.try_reserve(count.min(size))?;
        for _ in 0..count {
            elements.push(self.decode_value(Some(element))?);
        }
        // payloads which don't match the shared constructor throw off the size
        self.expect_consumed(start, size)?;
        Ok(Value::Array(match descriptor {
            Some(descriptor) => Array::described(descriptor, ty, elements),
            None             => Array::new(ty, elements),
        }))
    }

    fn decode_described(&mut self) -> Result<Value, DecodeError> {
        let descriptor = self.decode_value(None)?;
        let value = self.decode_value(None)?;
        match self.registry.lookup(&descriptor) {
            Some(definition) => match value {
                Value::List(values) => Ok(definition.from_values(values).into()),
                _ => Err(DecodeError::CompositePayload(definition.qualified_name())),
            },
            None => {
                debug!("no composite registered for descriptor {}", descriptor);
                Ok(Value::described(descriptor, value))
            },
        }
    }

    fn decode_constructor(&mut self) -> Result<Constructor, DecodeError> {
        let (constructor, c) = Constructor::decode(self.rest())?;
        self.pos += c;
        Ok(constructor)
    }

    fn decode_length(&mut self, width: usize) -> Result<usize, DecodeError> {
        let len = if width == 1 {
            u32::from(u8::from_be_bytes(self.fixed()?))
        } else {
            u32::from_be_bytes(self.fixed()?)
        };
        usize::try_from(len).map_err(|_| DecodeError::Allocation)
    }

    /// Reads the size of a container and returns it along with the position its content starts at.
    fn decode_size(&mut self, width: usize) -> Result<(usize, usize), DecodeError> {
        let size = self.decode_length(width)?;
        if size > self.remaining() {
            return Err(DecodeError::Eof);
        }
        Ok((size, self.pos))
    }

    fn decode_count(&mut self, constructor: Constructor, width: usize) -> Result<usize, DecodeError> {
        let count = self.decode_length(width)?;
        if count > self.limits.max_container_len {
            return Err(DecodeError::Limit { what: constructor.name(), len: count, max: self.limits.max_container_len });
        }
        Ok(count)
    }

    fn expect_consumed(&self, start: usize, declared: usize) -> Result<(), DecodeError> {
        let actual = self.pos - start;
        if actual == declared {
            Ok(())
        } else {
            Err(DecodeError::SizeMismatch { declared, actual })
        }
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.decode_slice(N)?);
        Ok(bytes)
    }

    fn decode_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            Err(DecodeError::Eof)
        } else {
            let buf = self.buf;
            self.pos += len;
            Ok(&buf[self.pos - len .. self.pos])
        }
    }

    fn rest(&self) -> &'a [u8] {
        let buf = self.buf;
        buf.get(self.pos..).unwrap_or(&[])
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

}

/// Rejects counts which can't possibly fit the declared size since every element takes at least one byte.
fn fits(constructor: Constructor, count: usize, room: usize) -> Result<(), DecodeError> {
    if count > room {
        Err(DecodeError::Limit { what: constructor.name(), len: count, max: room })
    } else {
        Ok(())
    }
}
