use crate::composite::CompositeDefinition;
use crate::constructor::Type;
use crate::field::{Field, FieldType};
use std::sync::Arc;

pub const HEADER: u64 = 0x70;
pub const PROPERTIES: u64 = 0x73;
pub const ACCEPTED: u64 = 0x24;
pub const REJECTED: u64 = 0x25;
pub const RELEASED: u64 = 0x26;
pub const MODIFIED: u64 = 0x27;

/// Transport headers of a message.
pub fn header() -> CompositeDefinition {
    CompositeDefinition::new("header", HEADER)
        .field(Field::new("durable", Type::Boolean).default(false))
        .field(Field::new("priority", Type::Ubyte).default(4u8))
        .field(Field::new("ttl", Type::Uint))
        .field(Field::new("first-acquirer", Type::Boolean).default(false))
        .field(Field::new("delivery-count", Type::Uint).default(0u32))
}

/// Immutable properties of a message.
pub fn properties() -> CompositeDefinition {
    CompositeDefinition::new("properties", PROPERTIES)
        .field(Field::new("message-id", FieldType::Any))
        .field(Field::new("user-id", Type::Binary))
        .field(Field::new("to", Type::String))
        .field(Field::new("subject", Type::String))
        .field(Field::new("reply-to", Type::String))
        .field(Field::new("correlation-id", FieldType::Any))
        .field(Field::new("content-type", Type::Symbol))
        .field(Field::new("content-encoding", Type::Symbol))
        .field(Field::new("absolute-expiry-time", Type::Timestamp))
        .field(Field::new("creation-time", Type::Timestamp))
        .field(Field::new("group-id", Type::String))
        .field(Field::new("group-sequence", Type::Uint))
        .field(Field::new("reply-to-group-id", Type::String))
}

pub fn accepted() -> CompositeDefinition {
    CompositeDefinition::new("accepted", ACCEPTED)
}

/// `error` is the registered definition of the error composite.
pub fn rejected(error: &Arc<CompositeDefinition>) -> CompositeDefinition {
    CompositeDefinition::new("rejected", REJECTED)
        .field(Field::new("error", FieldType::Any).requires(error))
}

pub fn released() -> CompositeDefinition {
    CompositeDefinition::new("released", RELEASED)
}

pub fn modified() -> CompositeDefinition {
    CompositeDefinition::new("modified", MODIFIED)
        .field(Field::new("delivery-failed", Type::Boolean))
        .field(Field::new("undeliverable-here", Type::Boolean))
        .field(Field::new("message-annotations", Type::Map))
}
