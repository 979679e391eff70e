use crate::error::TranslateError;
use amqp10_codec::{coerce, Array, EncodeError, Forced, Type, Value};
use log::debug;
use std::fmt;

/// The literal of a leaf, before it is tied to a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i128),
    Decimal(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Literal {

    /// The category a literal of this syntax belongs to.
    pub fn category(&self) -> Category {
        match self {
            Literal::Integer(_) | Literal::Decimal(_) => Category::Number,
            Literal::Text(_) | Literal::Bytes(_)      => Category::Variable,
            Literal::Null | Literal::Bool(_)          => Category::Fixed,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Literal::Null       => Value::Null,
            Literal::Bool(v)    => Value::Bool(*v),
            Literal::Integer(v) => u64::try_from(*v).map(Value::Ulong)
                .or_else(|_| i64::try_from(*v).map(Value::Long))
                .unwrap_or(Value::Number(*v as f64)),
            Literal::Decimal(v) => Value::Number(*v),
            Literal::Text(v)    => Value::String(v.clone()),
            Literal::Bytes(v)   => Value::Binary(v.clone()),
        }
    }

}

#[derive(Debug, Clone, PartialEq)]
pub enum Tuple {
    /// `(type literal)`, a missing literal reads as null
    Leaf { name: String, literal: Option<Literal> },
    Described(Box<Tuple>, Box<Tuple>),
    List(Vec<Tuple>),
    Map(Vec<(Tuple, Tuple)>),
    /// `(array descriptor? type element*)`, bare literals are leaves of the element type
    Array { descriptor: Option<Box<Tuple>>, name: String, elements: Vec<Tuple> },
}

/// Syntactic grouping of the leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Number,
    Fixed,
    Variable,
}

impl Category {
    /// Lists, maps and arrays are no leaves and have no category.
    pub fn of(ty: Type) -> Option<Self> {
        match ty {
            Type::List | Type::Map | Type::Array => None,
            Type::Binary | Type::String | Type::Symbol => Some(Category::Variable),
            Type::Null | Type::Boolean | Type::Char | Type::Timestamp | Type::Uuid => Some(Category::Fixed),
            _ => Some(Category::Number),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Number   => "number",
            Category::Fixed    => "fixed",
            Category::Variable => "variable",
        })
    }
}

/// Turns a tuple tree into codec values. Leaves become values forced to their named type.
pub fn translate(tuple: &Tuple) -> Result<Value, TranslateError> {
    match tuple {
        Tuple::Leaf { name, literal } => {
            let literal = literal.as_ref().unwrap_or(&Literal::Null);
            let ty = leaf_type(name, literal)?;
            Forced::coerced(ty, literal.to_value())
                .map(Value::from)
                .map_err(|source| TranslateError::Literal { ty, source })
        },
        Tuple::Described(descriptor, value) => Ok(Value::described(translate(descriptor)?, translate(value)?)),
        Tuple::List(elements) => elements.iter()
            .map(translate)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Tuple::Map(entries) => entries.iter()
            .map(|(k, v)| -> Result<_, TranslateError> { Ok((translate(k)?, translate(v)?)) })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Map),
        Tuple::Array { descriptor, name, elements } => {
            let sample = elements.iter()
                .find_map(|e| match e {
                    Tuple::Leaf { literal: Some(l), .. } => Some(l),
                    _                                   => None,
                })
                .unwrap_or(&Literal::Null);
            let ty = match name.parse::<Type>() {
                Ok(ty @ (Type::List | Type::Map | Type::Array)) => ty,
                _ => leaf_type(name, sample)?,
            };
            let elements = elements.iter()
                .map(|e| array_element(ty, e))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(match descriptor {
                Some(descriptor) => Array::described(translate(descriptor)?, ty, elements),
                None             => Array::new(ty, elements),
            }))
        },
    }
}

fn array_element(ty: Type, tuple: &Tuple) -> Result<Value, TranslateError> {
    let value = translate(tuple)?;
    match value.natural_type() {
        Some(found) if found != ty => Err(TranslateError::Literal {
            ty,
            source: EncodeError::ArrayElement { expected: ty, found: value.to_string() },
        }),
        _ => coerce(ty, &value).map_err(|source| TranslateError::Literal { ty, source }),
    }
}

/// Resolves a leaf type name. Names outside the type table get the category of their literal.
fn leaf_type(name: &str, literal: &Literal) -> Result<Type, TranslateError> {
    let unsupported = |category: Category| {
        debug!("rejecting leaf type {} ({})", name, category);
        TranslateError::UnsupportedType { name: name.to_owned(), category }
    };
    match name.parse::<Type>() {
        Ok(Type::Decimal32 | Type::Decimal64 | Type::Decimal128) => Err(unsupported(Category::Number)),
        Ok(ty) if Category::of(ty).is_some() => Ok(ty),
        _ => Err(unsupported(literal.category())),
    }
}
