use crate::composite::CompositeDefinition;
use crate::constructor::Type;
use crate::field::Field;

pub const ERROR: u64 = 0x1d;

/// Details of an error condition, attached to rejections and to closing performatives.
pub fn error() -> CompositeDefinition {
    CompositeDefinition::new("error", ERROR)
        .field(Field::new("condition", Type::Symbol).mandatory())
        .field(Field::new("description", Type::String))
        .field(Field::new("info", Type::Map))
}
