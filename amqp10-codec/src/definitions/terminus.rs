use crate::composite::CompositeDefinition;
use crate::constructor::Type;
use crate::field::{Field, FieldType};
use crate::value::Value;

pub const SOURCE: u64 = 0x28;
pub const TARGET: u64 = 0x29;

/// Fields shared by both termini, in wire order.
fn terminus(name: &'static str, code: u64) -> CompositeDefinition {
    CompositeDefinition::new(name, code)
        .field(Field::new("address", Type::String))
        .field(Field::new("durable", Type::Uint).default(0u32))
        .field(Field::new("expiry-policy", Type::Symbol).default(Value::symbol("session-end")))
        .field(Field::new("timeout", Type::Uint).default(0u32))
        .field(Field::new("dynamic", Type::Boolean).default(false))
        .field(Field::new("dynamic-node-properties", Type::Map))
}

pub fn source() -> CompositeDefinition {
    terminus("source", SOURCE)
        .field(Field::new("distribution-mode", Type::Symbol))
        .field(Field::new("filter", Type::Map))
        .field(Field::new("default-outcome", FieldType::Any))
        .field(Field::new("outcomes", Type::Symbol).multiple())
        .field(Field::new("capabilities", Type::Symbol).multiple())
}

pub fn target() -> CompositeDefinition {
    terminus("target", TARGET)
        .field(Field::new("capabilities", Type::Symbol).multiple())
}

#[cfg(test)]
mod test {
    use super::{SOURCE, TARGET};
    use crate::codec::{Decoder, Encoder};
    use crate::composite::Registry;
    use crate::definitions::ACCEPTED;
    use crate::field::FieldValue;
    use crate::value::Value;

    fn roundtrip(registry: &Registry, value: Value) -> Value {
        let mut buf = Vec::new();
        let c = Encoder::encode(&value, &mut buf).unwrap();
        let (decoded, d) = Decoder::decode(&buf, registry).unwrap();
        assert_eq!(c, d);
        assert_eq!(value, decoded);
        decoded
    }

    #[test]
    fn source() {
        let registry = Registry::standard().unwrap();
        let definition = registry.by_code(SOURCE).unwrap();
        assert_eq!(11, definition.fields().len());
        let accepted = registry.by_code(ACCEPTED).unwrap().empty().unwrap();
        let source = definition.create(vec![
            ("address", FieldValue::from("examples")),
            ("filter", FieldValue::from(Value::Map(vec![(
                Value::symbol("apache.org:selector-filter:string"),
                Value::described(Value::Ulong(0x0000_468c_0000_0004), Value::string("colour = 'green'")),
            )]))),
            ("default-outcome", FieldValue::from(accepted)),
            ("outcomes", FieldValue::from(Value::List(vec![Value::symbol("amqp:accepted:list")]))),
            ("capabilities", FieldValue::from(Value::List(vec![Value::string("queue"), Value::string("shared")]))),
        ]).unwrap();
        assert_eq!(Some(Value::symbol("session-end")), source.get("expiry-policy"));
        let decoded = roundtrip(&registry, source.into());
        let decoded = decoded.as_composite().unwrap();
        assert_eq!(Some(Value::symbol("amqp:accepted:list")), decoded.get("outcomes"));
        assert_eq!(
            Some(Value::List(vec![Value::symbol("queue"), Value::symbol("shared")])),
            decoded.get("capabilities"),
        );
        assert_eq!("accepted", decoded.get("default-outcome").unwrap().as_composite().unwrap().name());
    }

    #[test]
    fn target() {
        let registry = Registry::standard().unwrap();
        let definition = registry.by_code(TARGET).unwrap();
        assert_eq!(7, definition.fields().len());
        let target = definition.create(vec![
            ("address", FieldValue::from("examples")),
            ("dynamic", FieldValue::from(true)),
            ("capabilities", FieldValue::from(Value::List(Vec::new()))),
        ]).unwrap();
        let decoded = roundtrip(&registry, target.into());
        let decoded = decoded.as_composite().unwrap();
        assert_eq!(Some(Value::Bool(true)), decoded.get("dynamic"));
        assert_eq!(Some(Value::Uint(0)), decoded.get("timeout"));
        assert_eq!(None, decoded.get("capabilities"));
    }

    #[test]
    fn standard_registry() {
        let registry = Registry::standard().unwrap();
        assert_eq!(9, registry.len());
        for name in ["error", "header", "properties", "accepted", "rejected", "released", "modified", "source", "target"] {
            let qualified = format!("amqp:{}:list", name);
            assert_eq!(name, registry.by_name(&qualified).unwrap().name());
        }
    }

}
