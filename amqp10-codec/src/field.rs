//! Normalization of caller supplied field values into something the encoder can serialize without guessing.

use crate::composite::CompositeDefinition;
use crate::constructor::Type;
use crate::error::FieldError;
use crate::value::Value;
use crate::wrapper::Forced;
use std::fmt;
use std::sync::Arc;

/// The declared type of a composite field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Accepts any value, its representation is decided when encoding
    Any,
    Of(Type),
}

impl From<Type> for FieldType {
    fn from(ty: Type) -> Self {
        FieldType::Of(ty)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any   => f.write_str("*"),
            FieldType::Of(t) => fmt::Display::fmt(t, f),
        }
    }
}

/// One entry of a composite's field list.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    ty: FieldType,
    mandatory: bool,
    multiple: bool,
    default: Option<Value>,
    requires: Option<Arc<CompositeDefinition>>,
}

impl Field {

    pub fn new<T: Into<FieldType>>(name: &'static str, ty: T) -> Self {
        Self { name, ty: ty.into(), mandatory: false, multiple: false, default: None, requires: None }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// The field may hold zero, one or many values.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Values of this field get turned into composites of `definition`.
    pub fn requires(mut self, definition: &Arc<CompositeDefinition>) -> Self {
        self.requires = Some(Arc::clone(definition));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn required_definition(&self) -> Option<&Arc<CompositeDefinition>> {
        self.requires.as_ref()
    }

}

/// What a caller hands in for a field.
pub enum FieldValue {
    Absent,
    Value(Value),
    /// Computed when the field is assigned
    Deferred(Box<dyn FnOnce() -> FieldValue>),
}

impl FieldValue {
    pub fn deferred<F: FnOnce() -> FieldValue + 'static>(f: F) -> Self {
        FieldValue::Deferred(Box::new(f))
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent      => f.write_str("Absent"),
            FieldValue::Value(v)    => f.debug_tuple("Value").field(v).finish(),
            FieldValue::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

impl<T: Into<Value>> From<T> for FieldValue {
    fn from(v: T) -> Self {
        FieldValue::Value(v.into())
    }
}

/// Wraps `input` according to the declaration of `field`. Null counts as absent.
pub fn wrap_field(field: &Field, input: FieldValue) -> Result<Value, FieldError> {
    let value = match input {
        FieldValue::Value(v @ Value::Forced(_))    => { return Ok(v); },
        FieldValue::Absent | FieldValue::Value(Value::Null) => match &field.default {
            Some(default)          => default.clone(),
            None if field.mandatory => { return Err(FieldError::Missing(field.name)); },
            None                   => { return Ok(Value::Null); },
        },
        FieldValue::Deferred(f)                    => { return wrap_field(field, f()); },
        FieldValue::Value(v)                       => v,
    };

    if let Some(definition) = &field.requires {
        let composite = require(field, definition, value)?;
        return Ok(match field.ty {
            FieldType::Any    => composite,
            FieldType::Of(ty) => Value::forced(ty, composite),
        });
    }

    let ty = match field.ty {
        FieldType::Any    => { return Ok(value); },
        FieldType::Of(ty) => ty,
    };

    match value {
        Value::List(elements) if ty != Type::List && ty != Type::Array => {
            if !field.multiple {
                return Err(FieldError::NotMultiple { field: field.name, value: Value::List(elements).to_string() });
            }
            let mut elements = elements.into_iter();
            match (elements.next(), elements.next()) {
                (None, _)            => Ok(Value::forced(ty, Value::Null)),
                (Some(single), None) => wrap_as(field, ty, single),
                (Some(first), Some(second)) => {
                    let wrapped = std::iter::once(first).chain(std::iter::once(second)).chain(elements)
                        .map(|e| wrap_as(field, ty, e))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::forced(Type::List, Value::List(wrapped)))
                },
            }
        },
        v @ (Value::Composite(_) | Value::Described(_)) => Ok(v),
        v => wrap_as(field, ty, v),
    }
}

fn wrap_as(field: &Field, ty: Type, value: Value) -> Result<Value, FieldError> {
    Forced::coerced(ty, value)
        .map(Value::from)
        .map_err(|source| FieldError::Encode { field: field.name, source })
}

fn require(field: &Field, definition: &Arc<CompositeDefinition>, value: Value) -> Result<Value, FieldError> {
    let coercion = |v: &Value| FieldError::Coercion {
        field: field.name,
        target: definition.name(),
        value: v.to_string(),
    };
    match value {
        Value::Composite(c) if c.definition().code() == definition.code() => Ok(Value::Composite(c)),
        Value::Map(entries) => {
            let mut input = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let key = k.as_str().ok_or_else(|| coercion(&k))?.to_owned();
                input.push((key, FieldValue::Value(v)));
            }
            Ok(definition.create(input)?.into())
        },
        Value::Described(d) => Ok(definition.from_described(&d)?.into()),
        v => Err(coercion(&v)),
    }
}

#[cfg(test)]
mod test {
    use super::{wrap_field, Field, FieldType, FieldValue};
    use crate::composite::CompositeDefinition;
    use crate::constructor::Type;
    use crate::error::{EncodeError, FieldError};
    use crate::value::Value;
    use std::sync::Arc;

    fn wrap<V: Into<FieldValue>>(field: &Field, value: V) -> Result<Value, FieldError> {
        wrap_field(field, value.into())
    }

    #[test]
    fn absent_values() {
        let optional = Field::new("ttl", Type::Uint);
        assert_eq!(Value::Null, wrap_field(&optional, FieldValue::Absent).unwrap());
        assert_eq!(Value::Null, wrap(&optional, Value::Null).unwrap());
        let defaulted = Field::new("priority", Type::Ubyte).default(4u8);
        assert!(matches!(wrap_field(&defaulted, FieldValue::Absent).unwrap(), Value::Forced(f) if f.ty() == Type::Ubyte));
        let mandatory = Field::new("condition", Type::Symbol).mandatory();
        match wrap_field(&mandatory, FieldValue::Absent) {
            Err(e @ FieldError::Missing("condition")) => assert_eq!("missing mandatory field: condition", e.to_string()),
            r => panic!("unexpected {:?}", r),
        }
        // a default satisfies a mandatory field
        let both = Field::new("durable", Type::Boolean).mandatory().default(false);
        assert_eq!(Value::Bool(false), wrap_field(&both, FieldValue::Absent).unwrap());
    }

    #[test]
    fn forced_values_pass_through() {
        let field = Field::new("delivery-count", Type::Uint);
        let forced = Value::forced(Type::Ulong, Value::Ulong(3));
        match wrap(&field, forced).unwrap() {
            Value::Forced(f) => assert_eq!(Type::Ulong, f.ty()),
            v => panic!("expected forced value, got {}", v),
        }
    }

    #[test]
    fn coercion_into_the_field_type() {
        let field = Field::new("delivery-count", Type::Uint);
        match wrap(&field, Value::Number(7.0)).unwrap() {
            Value::Forced(f) => {
                assert_eq!(Type::Uint, f.ty());
                assert!(matches!(f.value(), Value::Uint(7)));
            },
            v => panic!("expected forced value, got {}", v),
        }
        assert!(matches!(
            wrap(&field, Value::Number(-1.0)),
            Err(FieldError::Encode { field: "delivery-count", source: EncodeError::Range { .. } })
        ));
    }

    #[test]
    fn wildcard_keeps_the_value() {
        let field = Field::new("message-id", FieldType::Any);
        assert!(matches!(wrap(&field, Value::Number(5.0)).unwrap(), Value::Number(_)));
        assert!(matches!(wrap(&field, Value::List(vec![Value::Uint(1)])).unwrap(), Value::List(_)));
    }

    #[test]
    fn multiplicity() {
        let field = Field::new("capabilities", Type::Symbol).multiple();
        match wrap(&field, Value::List(Vec::new())).unwrap() {
            Value::Forced(f) => {
                assert_eq!(Type::Symbol, f.ty());
                assert!(f.value().is_null());
            },
            v => panic!("expected forced null, got {}", v),
        }
        match wrap(&field, Value::List(vec![Value::string("a")])).unwrap() {
            Value::Forced(f) => {
                assert_eq!(Type::Symbol, f.ty());
                assert_eq!(Value::symbol("a"), *f.value());
            },
            v => panic!("expected forced scalar, got {}", v),
        }
        match wrap(&field, Value::List(vec![Value::string("a"), Value::string("b"), Value::symbol("c")])).unwrap() {
            Value::Forced(f) => {
                assert_eq!(Type::List, f.ty());
                assert_eq!(Value::List(vec![Value::symbol("a"), Value::symbol("b"), Value::symbol("c")]), *f.value());
            },
            v => panic!("expected forced list, got {}", v),
        }
        let single = Field::new("address", Type::String);
        match wrap(&single, Value::List(vec![Value::string("a")])) {
            Err(e @ FieldError::NotMultiple { field: "address", .. }) => assert!(e.to_string().contains("(string \"a\")")),
            r => panic!("unexpected {:?}", r),
        }
        let list = Field::new("body", Type::List);
        assert!(wrap(&list, Value::List(vec![Value::Uint(1)])).is_ok());
    }

    #[test]
    fn deferred_values() {
        let field = Field::new("ttl", Type::Uint);
        let wrapped = wrap_field(&field, FieldValue::deferred(|| Value::Number(1000.0).into())).unwrap();
        assert_eq!(Value::Uint(1000), wrapped);
        let mandatory = Field::new("condition", Type::Symbol).mandatory();
        assert!(matches!(
            wrap_field(&mandatory, FieldValue::deferred(|| FieldValue::Absent)),
            Err(FieldError::Missing("condition"))
        ));
    }

    #[test]
    fn requires() {
        let error = Arc::new(CompositeDefinition::new("error", 0x1d)
            .field(Field::new("condition", Type::Symbol).mandatory())
            .field(Field::new("description", Type::String)));
        let field = Field::new("error", FieldType::Any).requires(&error);
        let from_map = Value::Map(vec![(Value::symbol("condition"), Value::string("amqp:internal-error"))]);
        let wrapped = wrap(&field, from_map).unwrap();
        let composite = wrapped.as_composite().unwrap();
        assert_eq!(Some(Value::symbol("amqp:internal-error")), composite.get("condition"));
        assert_eq!(wrapped, wrap(&field, wrapped.clone()).unwrap());
        let described = Value::described(Value::Ulong(0x1d), Value::List(vec![Value::symbol("amqp:not-found")]));
        assert_eq!(Some(Value::symbol("amqp:not-found")), wrap(&field, described).unwrap().as_composite().unwrap().get("condition"));
        assert!(matches!(wrap(&field, Value::Uint(1)), Err(FieldError::Coercion { field: "error", target: "error", .. })));
        assert!(matches!(wrap(&field, Value::Map(Vec::new())), Err(FieldError::Missing("condition"))));
    }

}
