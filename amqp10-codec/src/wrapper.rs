//! Wrappers which carry information the bare value cannot express: an explicit wire family, a descriptor, or the
//! element type shared by all elements of an array.

use crate::constructor::Type;
use crate::error::EncodeError;
use crate::value::{Literal, Value};
use std::fmt;
use uuid::Uuid;

/// A value pinned to an explicit wire family. The encoder still picks the narrowest constructor within the family.
#[derive(Clone)]
pub struct Forced {
    ty: Type,
    value: Value,
}

impl Forced {

    /// Wraps the value as is. Whether it fits the family is checked when encoding.
    pub fn new(ty: Type, value: Value) -> Self {
        Self { ty, value }
    }

    /// Wraps the value after converting it into the family, so that incompatible values are rejected right away.
    pub fn coerced(ty: Type, value: Value) -> Result<Self, EncodeError> {
        let value = coerce(ty, &value)?;
        Ok(Self { ty, value })
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_inner(self) -> Value {
        self.value
    }

    /// The concrete value of the family which ends up on wire.
    pub fn resolve(&self) -> Result<Value, EncodeError> {
        coerce(self.ty, &self.value)
    }

}

impl fmt::Debug for Forced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

impl fmt::Display for Forced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

/// Equal to the inner value and to the value it resolves to.
impl PartialEq<Value> for Forced {
    fn eq(&self, other: &Value) -> bool {
        self.value == *other || self.resolve().map_or(false, |v| v == *other)
    }
}

impl PartialEq<Forced> for Value {
    fn eq(&self, other: &Forced) -> bool {
        other == self
    }
}

/// A descriptor followed by an arbitrary value.
#[derive(Debug, Clone, PartialEq)]
pub struct Described {
    pub descriptor: Value,
    pub value: Value,
}

impl Described {
    pub fn new(descriptor: Value, value: Value) -> Self {
        Self { descriptor, value }
    }
}

impl fmt::Display for Described {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(described {} {})", self.descriptor, self.value)
    }
}

/// A homogeneous sequence. All elements share one constructor on wire, which is why the element type has to be known
/// up front. Arrays of described values additionally share one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element_type: Type,
    descriptor: Option<Box<Value>>,
    elements: Vec<Value>,
}

impl Array {

    pub fn new(element_type: Type, elements: Vec<Value>) -> Self {
        Self { element_type, descriptor: None, elements }
    }

    /// Every element is described by `descriptor`; `elements` holds the undescribed values.
    pub fn described(descriptor: Value, element_type: Type, elements: Vec<Value>) -> Self {
        Self { element_type, descriptor: Some(Box::new(descriptor)), elements }
    }

    pub fn element_type(&self) -> Type {
        self.element_type
    }

    pub fn descriptor(&self) -> Option<&Value> {
        self.descriptor.as_deref()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Value> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(array ")?;
        if let Some(descriptor) = &self.descriptor {
            write!(f, "{} ", descriptor)?;
        }
        f.write_str(self.element_type.name())?;
        self.elements.iter().try_for_each(|e| write!(f, " {}", Literal(e)))?;
        f.write_str(")")
    }
}

/// Converts a value into the concrete variant of the given family. `Value::Null` stays null in every family, described
/// values and composites are kept as they are.
pub fn coerce(ty: Type, value: &Value) -> Result<Value, EncodeError> {
    let value = value.unwrapped();
    let incompatible = || EncodeError::Incompatible { ty, value: value.to_string() };
    let range = || EncodeError::Range { ty, value: value.to_string() };
    // described values carry their own encoding
    if matches!(value, Value::Null | Value::Described(_) | Value::Composite(_)) {
        return Ok(value.clone());
    }
    if ty.is_integral() {
        let i = value.as_i128().ok_or_else(incompatible)?;
        return match ty {
            Type::Ubyte  => u8::try_from(i).map(Value::Ubyte).map_err(|_| range()),
            Type::Ushort => u16::try_from(i).map(Value::Ushort).map_err(|_| range()),
            Type::Uint   => u32::try_from(i).map(Value::Uint).map_err(|_| range()),
            Type::Ulong  => u64::try_from(i).map(Value::Ulong).map_err(|_| range()),
            Type::Byte   => i8::try_from(i).map(Value::Byte).map_err(|_| range()),
            Type::Short  => i16::try_from(i).map(Value::Short).map_err(|_| range()),
            Type::Int    => i32::try_from(i).map(Value::Int).map_err(|_| range()),
            _            => i64::try_from(i).map(Value::Long).map_err(|_| range()),
        };
    }
    match (ty, value) {
        (Type::Boolean, Value::Bool(v))                  => Ok(Value::Bool(*v)),
        (Type::Float, Value::Float(v))                   => Ok(Value::Float(*v)),
        (Type::Float, Value::Double(v) | Value::Number(v)) => Ok(Value::Float(*v as f32)),
        (Type::Double, Value::Float(v))                  => Ok(Value::Double(f64::from(*v))),
        (Type::Double, Value::Double(v) | Value::Number(v)) => Ok(Value::Double(*v)),
        (Type::Float | Type::Double, v) => {
            let i = v.as_i128().ok_or_else(incompatible)?;
            Ok(if ty == Type::Float { Value::Float(i as f32) } else { Value::Double(i as f64) })
        },
        (Type::Decimal32 | Type::Decimal64 | Type::Decimal128, _) => Err(EncodeError::NotImplemented(ty)),
        (Type::Char, Value::Char(v))                     => Ok(Value::Char(*v)),
        (Type::Char, Value::String(v)) => {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _               => Err(incompatible()),
            }
        },
        (Type::Char, v) => {
            let code = v.as_i128().and_then(|i| u32::try_from(i).ok()).ok_or_else(incompatible)?;
            char::from_u32(code).map(Value::Char).ok_or_else(range)
        },
        (Type::Timestamp, Value::Timestamp(v))           => Ok(Value::Timestamp(*v)),
        (Type::Timestamp, v) => {
            let i = v.as_i128().ok_or_else(incompatible)?;
            i64::try_from(i).map(Value::Timestamp).map_err(|_| range())
        },
        (Type::Uuid, Value::Uuid(v))                     => Ok(Value::Uuid(*v)),
        (Type::Uuid, Value::String(v))                   => Uuid::parse_str(v).map(Value::Uuid).map_err(|_| incompatible()),
        (Type::Uuid, Value::Binary(v))                   => Uuid::from_slice(v).map(Value::Uuid).map_err(|_| incompatible()),
        (Type::Binary, Value::Binary(v))                 => Ok(Value::Binary(v.clone())),
        (Type::Binary, Value::String(v))                 => Ok(Value::Binary(v.as_bytes().to_vec())),
        (Type::String, Value::String(v) | Value::Symbol(v)) => Ok(Value::String(v.clone())),
        (Type::Symbol, Value::String(v) | Value::Symbol(v)) if v.is_ascii() => Ok(Value::Symbol(v.clone())),
        (Type::List, Value::List(v))                     => Ok(Value::List(v.clone())),
        (Type::Map, Value::Map(v))                       => Ok(Value::Map(v.clone())),
        (Type::Array, Value::Array(v))                   => Ok(Value::Array(v.clone())),
        (Type::Array, Value::List(_))                    => Err(EncodeError::UntypedArray),
        _                                                => Err(incompatible()),
    }
}

#[cfg(test)]
mod test {
    use super::{coerce, Array, Forced};
    use crate::constructor::Type;
    use crate::error::EncodeError;
    use crate::value::Value;

    #[test]
    fn coerce_integers() {
        assert_eq!(Value::Ulong(123), coerce(Type::Ulong, &Value::Number(123.0)).unwrap());
        assert_eq!(Value::Ubyte(7), coerce(Type::Ubyte, &Value::Long(7)).unwrap());
        assert_eq!(Value::Ulong(u64::MAX), coerce(Type::Ulong, &Value::Ulong(u64::MAX)).unwrap());
        assert_eq!(Value::Long(i64::MIN), coerce(Type::Long, &Value::Long(i64::MIN)).unwrap());
        assert!(matches!(coerce(Type::Ubyte, &Value::Uint(256)), Err(EncodeError::Range { .. })));
        assert!(matches!(coerce(Type::Uint, &Value::Number(-1.0)), Err(EncodeError::Range { .. })));
        assert!(matches!(coerce(Type::Uint, &Value::Number(1.5)), Err(EncodeError::Incompatible { .. })));
        assert!(matches!(coerce(Type::Int, &Value::string("1")), Err(EncodeError::Incompatible { .. })));
    }

    #[test]
    fn coerce_null_stays_null() {
        for ty in Type::ALL.iter() {
            assert_eq!(Value::Null, coerce(*ty, &Value::Null).unwrap());
        }
    }

    #[test]
    fn coerce_strings() {
        assert_eq!(Value::symbol("amqp:accepted:list"), coerce(Type::Symbol, &Value::string("amqp:accepted:list")).unwrap());
        assert!(coerce(Type::Symbol, &Value::string("größe")).is_err());
        assert_eq!(Value::Char('ß'), coerce(Type::Char, &Value::string("ß")).unwrap());
        assert_eq!(
            "f81d4fae-7dec-11d0-a765-00a0c91e6bf6",
            coerce(Type::Uuid, &Value::string("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")).unwrap().to_string()
                .trim_start_matches("(uuid \"").trim_end_matches("\")"),
        );
    }

    #[test]
    fn coerce_arrays_need_element_type() {
        assert!(matches!(coerce(Type::Array, &Value::List(vec![Value::Uint(1)])), Err(EncodeError::UntypedArray)));
        let array = Value::Array(Array::new(Type::Uint, vec![Value::Uint(1)]));
        assert_eq!(array, coerce(Type::Array, &array).unwrap());
    }

    #[test]
    fn coerce_decimals() {
        assert!(coerce(Type::Decimal64, &Value::Double(1.0)).unwrap_err().is_not_implemented());
    }

    #[test]
    fn forced_renders_inner_value() {
        let forced = Forced::new(Type::Symbol, Value::string("x"));
        assert_eq!("(string \"x\")", forced.to_string());
        assert_eq!("String(\"x\")", format!("{:?}", forced));
        assert!(forced == Value::string("x"));
        assert!(forced == Value::symbol("x"));
        assert!(Value::symbol("x") == forced);
        assert_eq!(Value::symbol("x"), forced.resolve().unwrap());
        let unresolvable = Forced::new(Type::Ubyte, Value::Uint(300));
        assert!(unresolvable == Value::Uint(300));
        assert!(unresolvable != Value::Ubyte(44));
    }

}
