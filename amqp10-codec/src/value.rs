//! The atom of the AMQP type system is the `Value`.
//! Decoding always yields concrete variants. Encoding additionally accepts `Value::Number`, a native number whose wire
//! family gets inferred, and `Value::Forced`, which pins a value to an explicit family.

use crate::codec::infer;
use crate::composite::Composite;
use crate::constructor::Type;
use crate::wrapper::{Array, Described, Forced};
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

/// The possible values according to the AMQP 1.0 data model.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Ubyte(u8),
    Ushort(u16),
    Uint(u32),
    Ulong(u64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    /// Milliseconds since the unix epoch
    Timestamp(i64),
    Uuid(Uuid),
    Binary(Vec<u8>),
    String(String),
    Symbol(String),
    /// A number without explicit width. Integral values are exact up to 2^53.
    Number(f64),
    List(Vec<Value>),
    /// A `Vec` of pairs since floating point values can be keys but implement neither `Ord` nor `Hash`
    Map(Vec<(Value, Value)>),
    Array(Array),
    Described(Box<Described>),
    Composite(Box<Composite>),
    Forced(Box<Forced>),
}

impl Value {

    pub fn symbol<S: Into<String>>(s: S) -> Self {
        Value::Symbol(s.into())
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    pub fn forced(ty: Type, value: Value) -> Self {
        Value::Forced(Box::new(Forced::new(ty, value)))
    }

    pub fn described(descriptor: Value, value: Value) -> Self {
        Value::Described(Box::new(Described::new(descriptor, value)))
    }

    pub fn array(element_type: Type, elements: Vec<Value>) -> Self {
        Value::Array(Array::new(element_type, elements))
    }

    pub(crate) fn typename(&self) -> &'static str {
        match self {
            Value::Number(_)    => "number",
            Value::Described(_) => "described",
            Value::Composite(_) => "composite",
            Value::Forced(f)    => f.ty().name(),
            v                   => v.natural_type().map(|t| t.name()).unwrap_or("unknown"),
        }
    }

    /// The family a value belongs to without any inference. Numbers, described values and composites have none.
    pub fn natural_type(&self) -> Option<Type> {
        Some(match self {
            Value::Null         => Type::Null,
            Value::Bool(_)      => Type::Boolean,
            Value::Ubyte(_)     => Type::Ubyte,
            Value::Ushort(_)    => Type::Ushort,
            Value::Uint(_)      => Type::Uint,
            Value::Ulong(_)     => Type::Ulong,
            Value::Byte(_)      => Type::Byte,
            Value::Short(_)     => Type::Short,
            Value::Int(_)       => Type::Int,
            Value::Long(_)      => Type::Long,
            Value::Float(_)     => Type::Float,
            Value::Double(_)    => Type::Double,
            Value::Char(_)      => Type::Char,
            Value::Timestamp(_) => Type::Timestamp,
            Value::Uuid(_)      => Type::Uuid,
            Value::Binary(_)    => Type::Binary,
            Value::String(_)    => Type::String,
            Value::Symbol(_)    => Type::Symbol,
            Value::List(_)      => Type::List,
            Value::Map(_)       => Type::Map,
            Value::Array(_)     => Type::Array,
            Value::Forced(f)    => f.ty(),
            Value::Number(_) | Value::Described(_) | Value::Composite(_) => { return None; },
        })
    }

    /// Strips any number of forced type wrappers.
    pub fn unwrapped(&self) -> &Value {
        match self {
            Value::Forced(f) => f.value().unwrapped(),
            v                => v,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.unwrapped(), Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrapped() {
            Value::Bool(v) => Some(*v),
            _              => None,
        }
    }

    /// Any integral value, regardless of its width. Numbers qualify if they have no fractional part.
    pub fn as_i128(&self) -> Option<i128> {
        match *self.unwrapped() {
            Value::Ubyte(v)  => Some(v.into()),
            Value::Ushort(v) => Some(v.into()),
            Value::Uint(v)   => Some(v.into()),
            Value::Ulong(v)  => Some(v.into()),
            Value::Byte(v)   => Some(v.into()),
            Value::Short(v)  => Some(v.into()),
            Value::Int(v)    => Some(v.into()),
            Value::Long(v)   => Some(v.into()),
            Value::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i128),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Strings and symbols
    pub fn as_str(&self) -> Option<&str> {
        match self.unwrapped() {
            Value::String(v) | Value::Symbol(v) => Some(v),
            _                                   => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self.unwrapped() {
            Value::List(v) => Some(v),
            _              => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self.unwrapped() {
            Value::Map(v) => Some(v),
            _             => None,
        }
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self.unwrapped() {
            Value::Composite(v) => Some(v),
            _                   => None,
        }
    }

    pub fn as_described(&self) -> Option<&Described> {
        match self.unwrapped() {
            Value::Described(v) => Some(v),
            _                   => None,
        }
    }

    /// Looks up the value stored under a string or symbol key in a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.iter().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
    }

    /// Forced values become the concrete variant they put on wire.
    fn settled(&self) -> Cow<'_, Value> {
        match self {
            Value::Forced(f) => match f.resolve() {
                Ok(v)  => Cow::Owned(v),
                Err(_) => f.value().settled(),
            },
            v => Cow::Borrowed(v),
        }
    }

}

/// Forced type wrappers are transparent: a forced value equals its inner value as well as the concrete value it
/// resolves to. A `Number` equals every concrete numeric variant of the same numeric value, so that native numbers
/// survive a round trip over the wire.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let forced = matches!(self, Value::Forced(_)) || matches!(other, Value::Forced(_));
        same(self.unwrapped(), other.unwrapped()) || (forced && same(&self.settled(), &other.settled()))
    }
}

fn same(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (Null, Null)                 => true,
        (Bool(a), Bool(b))           => a == b,
        (Ubyte(a), Ubyte(b))         => a == b,
        (Ushort(a), Ushort(b))       => a == b,
        (Uint(a), Uint(b))           => a == b,
        (Ulong(a), Ulong(b))         => a == b,
        (Byte(a), Byte(b))           => a == b,
        (Short(a), Short(b))         => a == b,
        (Int(a), Int(b))             => a == b,
        (Long(a), Long(b))           => a == b,
        (Float(a), Float(b))         => a == b,
        (Double(a), Double(b))       => a == b,
        (Char(a), Char(b))           => a == b,
        (Timestamp(a), Timestamp(b)) => a == b,
        (Uuid(a), Uuid(b))           => a == b,
        (Binary(a), Binary(b))       => a == b,
        (String(a), String(b))       => a == b,
        (Symbol(a), Symbol(b))       => a == b,
        (Number(a), Number(b))       => a == b,
        (Number(n), v) | (v, Number(n)) => number_eq(*n, v),
        (List(a), List(b))           => a == b,
        (Map(a), Map(b))             => a == b,
        (Array(a), Array(b))         => a == b,
        (Described(a), Described(b)) => a == b,
        (Composite(a), Composite(b)) => a == b,
        _                            => false,
    }
}

fn number_eq(n: f64, other: &Value) -> bool {
    match other {
        Value::Float(v)  => f64::from(*v) == n,
        Value::Double(v) => *v == n,
        v => match v.as_i128() {
            // saturates beyond i128, which no integral variant reaches
            Some(i) => n.is_finite() && n.fract() == 0.0 && n as i128 == i,
            None    => false,
        },
    }
}

/// Renders values in the tuple notation, e.g. `(list (uint 1) (symbol "a"))`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null         => f.write_str("(null)"),
            Value::Number(v)    => fmt::Display::fmt(&infer(*v), f),
            Value::List(v)      => {
                f.write_str("(list")?;
                v.iter().try_for_each(|e| write!(f, " {}", e))?;
                f.write_str(")")
            },
            Value::Map(v)       => {
                f.write_str("(map")?;
                v.iter().try_for_each(|(k, e)| write!(f, " {} {}", k, e))?;
                f.write_str(")")
            },
            Value::Array(v)     => fmt::Display::fmt(v, f),
            Value::Described(v) => fmt::Display::fmt(v, f),
            Value::Composite(v) => fmt::Display::fmt(v, f),
            Value::Forced(v)    => fmt::Display::fmt(v, f),
            v                   => write!(f, "({} {})", v.typename(), Literal(v)),
        }
    }
}

/// The literal part of a scalar in tuple notation, as used for array elements.
pub(crate) struct Literal<'a>(pub &'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.unwrapped() {
            Value::Null         => f.write_str("null"),
            Value::Bool(v)      => write!(f, "{}", v),
            Value::Ubyte(v)     => write!(f, "{}", v),
            Value::Ushort(v)    => write!(f, "{}", v),
            Value::Uint(v)      => write!(f, "{}", v),
            Value::Ulong(v)     => write!(f, "{}", v),
            Value::Byte(v)      => write!(f, "{}", v),
            Value::Short(v)     => write!(f, "{}", v),
            Value::Int(v)       => write!(f, "{}", v),
            Value::Long(v)      => write!(f, "{}", v),
            Value::Float(v)     => write!(f, "{:?}", v),
            Value::Double(v) | Value::Number(v) => write!(f, "{:?}", v),
            Value::Char(v)      => f.write_str(&quote(&v.to_string())),
            Value::Timestamp(v) => write!(f, "{}", v),
            Value::Uuid(v)      => write!(f, "\"{}\"", v.hyphenated()),
            Value::Binary(v)    => write!(f, ":{}", base64::encode(v)),
            Value::String(v)    => f.write_str(&quote(v)),
            Value::Symbol(v)    => f.write_str(&quote(v)),
            v                   => fmt::Display::fmt(v, f),
        }
    }
}

pub(crate) fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => Ubyte,
    u16 => Ushort,
    u32 => Uint,
    u64 => Ulong,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    Uuid => Uuid,
    Vec<u8> => Binary,
    String => String,
    Vec<Value> => List,
    Array => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<Described> for Value {
    fn from(v: Described) -> Self {
        Value::Described(Box::new(v))
    }
}

impl From<Composite> for Value {
    fn from(v: Composite) -> Self {
        Value::Composite(Box::new(v))
    }
}

impl From<Forced> for Value {
    fn from(v: Forced) -> Self {
        Value::Forced(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod test {
    use super::Value;
    use crate::constructor::Type;

    #[test]
    fn forced_is_transparent_for_equality() {
        assert_eq!(Value::forced(Type::Ulong, Value::Ulong(7)), Value::Ulong(7));
        assert_eq!(Value::Ulong(7), Value::forced(Type::Ulong, Value::forced(Type::Ulong, Value::Ulong(7))));
        assert_ne!(Value::Uint(7), Value::Ulong(7));
        assert_eq!(
            Value::List(vec![Value::forced(Type::Symbol, Value::symbol("a"))]),
            Value::List(vec![Value::symbol("a")]),
        );
    }

    #[test]
    fn forced_compares_inner_and_resolved() {
        assert_eq!(Value::forced(Type::Ulong, Value::Number(123.0)), Value::Ulong(123));
        assert_eq!(Value::forced(Type::Symbol, Value::string("a")), Value::symbol("a"));
        assert_eq!(Value::forced(Type::Symbol, Value::string("a")), Value::string("a"));
        assert_eq!(Value::forced(Type::Ubyte, Value::Ubyte(1)), Value::forced(Type::Ubyte, Value::Number(1.0)));
        assert_ne!(Value::forced(Type::Ubyte, Value::Ubyte(1)), Value::Ushort(1));
        assert_ne!(Value::forced(Type::Binary, Value::string("a")), Value::symbol("a"));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(Value::Number(5.0), Value::Uint(5));
        assert_eq!(Value::Ulong(5), Value::Number(5.0));
        assert_eq!(Value::Number(-1.0), Value::Byte(-1));
        assert_eq!(Value::Number(0.5), Value::Double(0.5));
        assert_eq!(Value::Number(1.5), Value::Float(1.5));
        assert_ne!(Value::Number(5.5), Value::Uint(5));
        assert_ne!(Value::Number(1e40), Value::Ulong(u64::MAX));
        assert_ne!(Value::Number(5.0), Value::Timestamp(5));
        assert_ne!(Value::Number(5.0), Value::string("5"));
    }

    #[test]
    fn display() {
        let value = Value::List(vec![
            Value::Uint(1),
            Value::symbol("x\"y"),
            Value::Binary(vec![1, 2, 3]),
            Value::Map(vec![(Value::string("k"), Value::Null)]),
        ]);
        assert_eq!(r#"(list (uint 1) (symbol "x\"y") (binary :AQID) (map (string "k") (null)))"#, value.to_string());
        assert_eq!("(ulong 5)", Value::forced(Type::Ulong, Value::Ulong(5)).to_string());
        assert_eq!("(uint 5)", Value::Number(5.0).to_string());
        assert_eq!("(long -1099511627776)", Value::Number(-(2f64.powi(40))).to_string());
        assert_eq!("(double NaN)", Value::Number(f64::NAN).to_string());
        assert_eq!("(array ulong 5.0 300.0)", Value::array(Type::Ulong, vec![Value::Number(5.0), Value::Number(300.0)]).to_string());
    }

    #[test]
    fn integral_accessors() {
        assert_eq!(Some(255), Value::Ubyte(255).as_u64());
        assert_eq!(None, Value::Byte(-1).as_u64());
        assert_eq!(Some(-1), Value::Byte(-1).as_i64());
        assert_eq!(Some(3), Value::Number(3.0).as_u64());
        assert_eq!(None, Value::Number(3.5).as_u64());
        assert_eq!(None, Value::string("3").as_u64());
    }

    #[test]
    fn map_lookup() {
        let map = Value::Map(vec![
            (Value::symbol("a"), Value::Uint(1)),
            (Value::string("b"), Value::Uint(2)),
        ]);
        assert_eq!(Some(&Value::Uint(2)), map.get("b"));
        assert_eq!(None, map.get("c"));
        assert_eq!(Value::Null, Value::from(None::<u32>));
    }

}
