//! Every AMQP value on wire starts with a constructor byte. The upper nibble of the byte selects the
//! subcategory which fixes how the payload is laid out: `0x4` has no payload, `0x5` to `0x9` carry a
//! fixed width payload of 1, 2, 4, 8 or 16 bytes, `0xa`/`0xb` carry a 1 or 4 byte length followed by raw
//! bytes, `0xc`/`0xd` carry a 1 or 4 byte size and count followed by the elements and `0xe`/`0xf`
//! additionally share one element constructor across all elements. The constructor `0x00` is special:
//! it introduces a described value, i.e. a descriptor value followed by the described value.

use crate::error::{DecodeError, EncodeError, UnknownType};
use std::convert::TryFrom;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// The families of the AMQP type system. Each family may have several constructors on wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Boolean,
    Ubyte,
    Ushort,
    Uint,
    Ulong,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal32,
    Decimal64,
    Decimal128,
    Char,
    Timestamp,
    Uuid,
    Binary,
    String,
    Symbol,
    List,
    Map,
    Array,
}

impl Type {

    pub const ALL: [Type; 24] = [
        Type::Null, Type::Boolean, Type::Ubyte, Type::Ushort, Type::Uint, Type::Ulong, Type::Byte, Type::Short,
        Type::Int, Type::Long, Type::Float, Type::Double, Type::Decimal32, Type::Decimal64, Type::Decimal128,
        Type::Char, Type::Timestamp, Type::Uuid, Type::Binary, Type::String, Type::Symbol, Type::List, Type::Map,
        Type::Array,
    ];

    /// The name of the type as used by the AMQP specification.
    pub fn name(&self) -> &'static str {
        match *self {
            Type::Null       => "null",
            Type::Boolean    => "boolean",
            Type::Ubyte      => "ubyte",
            Type::Ushort     => "ushort",
            Type::Uint       => "uint",
            Type::Ulong      => "ulong",
            Type::Byte       => "byte",
            Type::Short      => "short",
            Type::Int        => "int",
            Type::Long       => "long",
            Type::Float      => "float",
            Type::Double     => "double",
            Type::Decimal32  => "decimal32",
            Type::Decimal64  => "decimal64",
            Type::Decimal128 => "decimal128",
            Type::Char       => "char",
            Type::Timestamp  => "timestamp",
            Type::Uuid       => "uuid",
            Type::Binary     => "binary",
            Type::String     => "string",
            Type::Symbol     => "symbol",
            Type::List       => "list",
            Type::Map        => "map",
            Type::Array      => "array",
        }
    }

    /// All constructors of this family ordered from narrowest to widest.
    pub fn constructors(&self) -> &'static [Constructor] {
        use Constructor::*;
        match *self {
            Type::Null       => &[Null],
            Type::Boolean    => &[True, False, Boolean],
            Type::Ubyte      => &[Ubyte],
            Type::Ushort     => &[Ushort],
            Type::Uint       => &[Uint0, SmallUint, Uint],
            Type::Ulong      => &[Ulong0, SmallUlong, Ulong],
            Type::Byte       => &[Byte],
            Type::Short      => &[Short],
            Type::Int        => &[SmallInt, Int],
            Type::Long       => &[SmallLong, Long],
            Type::Float      => &[Float],
            Type::Double     => &[Double],
            Type::Decimal32  => &[Decimal32],
            Type::Decimal64  => &[Decimal64],
            Type::Decimal128 => &[Decimal128],
            Type::Char       => &[Char],
            Type::Timestamp  => &[Timestamp],
            Type::Uuid       => &[Uuid],
            Type::Binary     => &[Vbin8, Vbin32],
            Type::String     => &[Str8, Str32],
            Type::Symbol     => &[Sym8, Sym32],
            Type::List       => &[List0, List8, List32],
            Type::Map        => &[Map8, Map32],
            Type::Array      => &[Array8, Array32],
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Ubyte | Type::Ushort | Type::Uint | Type::Ulong | Type::Byte | Type::Short | Type::Int
            | Type::Long)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, Type::Float | Type::Double)
    }

}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Type::ALL.iter().copied().find(|t| t.name() == s).ok_or_else(|| UnknownType(s.to_owned()))
    }
}

/// The layout of the bytes following a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A payload of exactly this many bytes. Zero for constructors which are values themselves.
    Fixed(usize),
    /// Raw bytes preceded by a length of this many bytes.
    Variable(usize),
    /// Size and count of this many bytes each, followed by `count` complete values.
    Compound(usize),
    /// Size and count of this many bytes each, followed by one shared constructor and `count` payloads.
    Array(usize),
    /// A descriptor value followed by the described value.
    Described,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constructor {
    Described  = 0x00,
    Null       = 0x40,
    True       = 0x41,
    False      = 0x42,
    Uint0      = 0x43,
    Ulong0     = 0x44,
    List0      = 0x45,
    Ubyte      = 0x50,
    Byte       = 0x51,
    SmallUint  = 0x52,
    SmallUlong = 0x53,
    SmallInt   = 0x54,
    SmallLong  = 0x55,
    Boolean    = 0x56,
    Ushort     = 0x60,
    Short      = 0x61,
    Uint       = 0x70,
    Int        = 0x71,
    Float      = 0x72,
    Char       = 0x73,
    Decimal32  = 0x74,
    Ulong      = 0x80,
    Long       = 0x81,
    Double     = 0x82,
    Timestamp  = 0x83,
    Decimal64  = 0x84,
    Decimal128 = 0x94,
    Uuid       = 0x98,
    Vbin8      = 0xa0,
    Str8       = 0xa1,
    Sym8       = 0xa3,
    Vbin32     = 0xb0,
    Str32      = 0xb1,
    Sym32      = 0xb3,
    List8      = 0xc0,
    Map8       = 0xc1,
    List32     = 0xd0,
    Map32      = 0xd1,
    Array8     = 0xe0,
    Array32    = 0xf0,
}

impl Constructor {

    const ALL: [Constructor; 40] = [
        Constructor::Described, Constructor::Null, Constructor::True, Constructor::False, Constructor::Uint0,
        Constructor::Ulong0, Constructor::List0, Constructor::Ubyte, Constructor::Byte, Constructor::SmallUint,
        Constructor::SmallUlong, Constructor::SmallInt, Constructor::SmallLong, Constructor::Boolean,
        Constructor::Ushort, Constructor::Short, Constructor::Uint, Constructor::Int, Constructor::Float,
        Constructor::Char, Constructor::Decimal32, Constructor::Ulong, Constructor::Long, Constructor::Double,
        Constructor::Timestamp, Constructor::Decimal64, Constructor::Decimal128, Constructor::Uuid,
        Constructor::Vbin8, Constructor::Str8, Constructor::Sym8, Constructor::Vbin32, Constructor::Str32,
        Constructor::Sym32, Constructor::List8, Constructor::Map8, Constructor::List32, Constructor::Map32,
        Constructor::Array8, Constructor::Array32,
    ];

    /// Returns the mnemonic of the constructor as used by the AMQP specification. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Constructor::Described  => "described",
            Constructor::Null       => "null",
            Constructor::True       => "true",
            Constructor::False      => "false",
            Constructor::Uint0      => "uint0",
            Constructor::Ulong0     => "ulong0",
            Constructor::List0      => "list0",
            Constructor::Ubyte      => "ubyte",
            Constructor::Byte       => "byte",
            Constructor::SmallUint  => "smalluint",
            Constructor::SmallUlong => "smallulong",
            Constructor::SmallInt   => "smallint",
            Constructor::SmallLong  => "smalllong",
            Constructor::Boolean    => "boolean",
            Constructor::Ushort     => "ushort",
            Constructor::Short      => "short",
            Constructor::Uint       => "uint",
            Constructor::Int        => "int",
            Constructor::Float      => "float",
            Constructor::Char       => "char",
            Constructor::Decimal32  => "decimal32",
            Constructor::Ulong      => "ulong",
            Constructor::Long       => "long",
            Constructor::Double     => "double",
            Constructor::Timestamp  => "timestamp",
            Constructor::Decimal64  => "decimal64",
            Constructor::Decimal128 => "decimal128",
            Constructor::Uuid       => "uuid",
            Constructor::Vbin8      => "vbin8",
            Constructor::Str8       => "str8-utf8",
            Constructor::Sym8       => "sym8",
            Constructor::Vbin32     => "vbin32",
            Constructor::Str32      => "str32-utf8",
            Constructor::Sym32      => "sym32",
            Constructor::List8      => "list8",
            Constructor::Map8       => "map8",
            Constructor::List32     => "list32",
            Constructor::Map32      => "map32",
            Constructor::Array8     => "array8",
            Constructor::Array32    => "array32",
        }
    }

    /// The family this constructor belongs to. Described values have no family of their own.
    pub fn family(&self) -> Option<Type> {
        Type::ALL.iter().copied().find(|t| t.constructors().contains(self))
    }

    /// Derives the payload layout from the subcategory nibble.
    pub fn layout(&self) -> Layout {
        let code = *self as u8;
        match code >> 4 {
            0x0 => Layout::Described,
            0x4 => Layout::Fixed(0),
            0x5 => Layout::Fixed(1),
            0x6 => Layout::Fixed(2),
            0x7 => Layout::Fixed(4),
            0x8 => Layout::Fixed(8),
            0x9 => Layout::Fixed(16),
            0xa => Layout::Variable(1),
            0xb => Layout::Variable(4),
            0xc => Layout::Compound(1),
            0xd => Layout::Compound(4),
            0xe => Layout::Array(1),
            _   => Layout::Array(4),
        }
    }

    /// Position of this constructor within its family, narrowest first.
    pub(crate) fn rank(&self) -> usize {
        self.family()
            .and_then(|t| t.constructors().iter().position(|c| c == self))
            .unwrap_or(0)
    }

    /// Returns the number of written bytes
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        w.write_all(&[*self as u8])?;
        Ok(1)
    }

    /// Returns the decoded constructor and the number of consumed bytes
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Self, usize), DecodeError> {
        match buf.as_ref().first() {
            Some(byte) => Ok((Self::try_from(*byte)?, 1)),
            None       => Err(DecodeError::Eof),
        }
    }

}

impl TryFrom<u8> for Constructor {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Constructor::ALL.iter().copied().find(|c| *c as u8 == v).ok_or(DecodeError::UnknownConstructor(v))
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#04x})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::{Constructor, Layout, Type};
    use crate::error::DecodeError;
    use std::convert::TryFrom;

    #[test]
    fn lead_bytes() {
        let mut dst = Vec::with_capacity(1);
        for l in 0..=u8::MAX {
            dst.clear();
            match Constructor::decode(&[l]) {
                Ok((c, 1)) => {
                    c.encode(&mut dst).unwrap();
                    assert_eq!(dst, [l]);
                },
                Ok(_) => unreachable!(),
                Err(e) => assert_eq!(e, DecodeError::UnknownConstructor(l)),
            }
        }
    }

    #[test]
    fn every_constructor_has_a_family() {
        for c in Constructor::ALL.iter().filter(|c| **c != Constructor::Described) {
            assert!(c.family().is_some(), "{} has no family", c);
        }
        assert_eq!(None, Constructor::Described.family());
    }

    #[test]
    fn layouts() {
        assert_eq!(Layout::Fixed(0), Constructor::Ulong0.layout());
        assert_eq!(Layout::Fixed(1), Constructor::SmallUlong.layout());
        assert_eq!(Layout::Fixed(2), Constructor::Ushort.layout());
        assert_eq!(Layout::Fixed(4), Constructor::Char.layout());
        assert_eq!(Layout::Fixed(8), Constructor::Timestamp.layout());
        assert_eq!(Layout::Fixed(16), Constructor::Uuid.layout());
        assert_eq!(Layout::Variable(1), Constructor::Sym8.layout());
        assert_eq!(Layout::Variable(4), Constructor::Vbin32.layout());
        assert_eq!(Layout::Compound(1), Constructor::Map8.layout());
        assert_eq!(Layout::Compound(4), Constructor::List32.layout());
        assert_eq!(Layout::Array(1), Constructor::Array8.layout());
        assert_eq!(Layout::Array(4), Constructor::Array32.layout());
        assert_eq!(Layout::Described, Constructor::Described.layout());
    }

    #[test]
    fn ranks() {
        assert!(Constructor::Uint0.rank() < Constructor::SmallUint.rank());
        assert!(Constructor::SmallUint.rank() < Constructor::Uint.rank());
        assert!(Constructor::List0.rank() < Constructor::List32.rank());
    }

    #[test]
    fn type_names() {
        for t in Type::ALL.iter() {
            assert_eq!(*t, t.name().parse().unwrap());
        }
        assert!("decimal".parse::<Type>().is_err());
        assert_eq!(Ok(Constructor::SmallUlong), Constructor::try_from(0x53));
    }

}
