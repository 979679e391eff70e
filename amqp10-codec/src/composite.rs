//! Composite types are described lists whose positions have names. A `CompositeDefinition` fixes the order and the
//! declaration of every field, a `Composite` stores the values, and the `Registry` maps descriptors back to
//! definitions so that decoded described values can be turned into composites again.

use crate::error::{FieldError, RegistryError};
use crate::field::{wrap_field, Field, FieldValue};
use crate::value::Value;
use crate::wrapper::Described;
use crate::constructor::Type;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Anything which can present itself as a described value. This is the only form of a composite the encoder sees.
pub trait Describe {
    fn to_described(&self) -> Described;
}

impl Describe for Described {
    fn to_described(&self) -> Described {
        self.clone()
    }
}

#[derive(Debug)]
pub struct CompositeDefinition {
    name: &'static str,
    code: u64,
    fields: Vec<Field>,
}

impl CompositeDefinition {

    pub fn new(name: &'static str, code: u64) -> Self {
        Self { name, code, fields: Vec::new() }
    }

    /// Appends a field. The order of calls is the order on wire.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// The symbolic descriptor, e.g. `amqp:header:list`
    pub fn qualified_name(&self) -> String {
        format!("amqp:{}:list", self.name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Builds a composite from named values. Fields without a value get their default, if any.
    pub fn create<K, I>(self: &Arc<Self>, input: I) -> Result<Composite, FieldError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let mut supplied: Vec<Option<FieldValue>> = self.fields.iter().map(|_| None).collect();
        for (key, value) in input {
            let key = key.as_ref();
            let i = self.position(key).ok_or_else(|| FieldError::UnknownField {
                composite: self.name,
                field: key.to_owned(),
            })?;
            supplied[i] = Some(value);
        }
        let values = self.fields.iter()
            .zip(supplied)
            .map(|(field, value)| wrap_field(field, value.unwrap_or(FieldValue::Absent)).map(stored))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Composite { definition: Arc::clone(self), values })
    }

    /// A composite with every field at its default.
    pub fn empty(self: &Arc<Self>) -> Result<Composite, FieldError> {
        self.create(std::iter::empty::<(&str, FieldValue)>())
    }

    /// Maps the positional values of a decoded list onto the fields. Missing positions read as absent, surplus
    /// positions are dropped. Nothing is validated, inbound data is taken as is.
    pub fn from_values(self: &Arc<Self>, values: Vec<Value>) -> Composite {
        if values.len() > self.fields.len() {
            debug!("dropping {} surplus values of {}", values.len() - self.fields.len(), self.qualified_name());
        }
        let mut values: Vec<_> = values.into_iter().take(self.fields.len()).map(stored).collect();
        values.resize(self.fields.len(), None);
        Composite { definition: Arc::clone(self), values }
    }

    pub fn from_described(self: &Arc<Self>, described: &Described) -> Result<Composite, FieldError> {
        match described.value.as_list() {
            Some(values) => Ok(self.from_values(values.to_vec())),
            None         => Err(FieldError::Payload(self.name)),
        }
    }

}

fn stored(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        v           => Some(v),
    }
}

/// An instance of a composite type.
#[derive(Clone)]
pub struct Composite {
    definition: Arc<CompositeDefinition>,
    values: Vec<Option<Value>>,
}

impl Composite {

    pub fn definition(&self) -> &Arc<CompositeDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    /// The bare value of a field, or its default if the field is unset or null.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_at(self.definition.position(name)?)
    }

    pub fn get_at(&self, index: usize) -> Option<Value> {
        match self.values.get(index)? {
            Some(Value::Forced(f)) if !f.value().is_null() => {
                Some(f.resolve().unwrap_or_else(|_| f.value().unwrapped().clone()))
            },
            Some(v) if !v.is_null() => Some(v.clone()),
            _                       => self.definition.fields[index].default_value().cloned(),
        }
    }

    /// The stored value of a field including its wrapper, without default fallback.
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)?.as_ref()
    }

    pub fn set<V: Into<FieldValue>>(&mut self, name: &str, value: V) -> Result<(), FieldError> {
        let i = self.definition.position(name).ok_or_else(|| FieldError::UnknownField {
            composite: self.definition.name,
            field: name.to_owned(),
        })?;
        self.values[i] = stored(wrap_field(&self.definition.fields[i], value.into())?);
        Ok(())
    }

}

impl Describe for Composite {
    fn to_described(&self) -> Described {
        let values = self.values.iter().map(|v| v.clone().unwrap_or(Value::Null)).collect();
        Described::new(Value::Ulong(self.definition.code), Value::forced(Type::List, Value::List(values)))
    }
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        self.definition.code == other.definition.code
            && (0..self.definition.fields.len()).all(|i| self.get_at(i) == other.get_at(i))
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.definition.name);
        for (field, value) in self.definition.fields.iter().zip(self.values.iter()) {
            if let Some(value) = value {
                s.field(field.name(), value);
            }
        }
        s.finish()
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_described(), f)
    }
}

/// Maps numeric and symbolic descriptors to composite definitions. Fill it once at startup and share it by reference
/// afterwards; lookups never mutate.
#[derive(Debug, Default)]
pub struct Registry {
    by_code: HashMap<u64, Arc<CompositeDefinition>>,
    by_name: HashMap<String, Arc<CompositeDefinition>>,
}

impl Registry {

    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every composite in [`crate::definitions`].
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::definitions::register(&mut registry)?;
        Ok(registry)
    }

    /// Registers a definition under its code and its qualified name. Neither may be taken already.
    pub fn define(&mut self, definition: CompositeDefinition) -> Result<Arc<CompositeDefinition>, RegistryError> {
        let name = definition.qualified_name();
        if let Some(existing) = self.by_code.get(&definition.code) {
            return Err(RegistryError::DuplicateCode { code: definition.code, existing: existing.qualified_name() });
        }
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        debug!("defining {} as {:#x}", name, definition.code);
        let definition = Arc::new(definition);
        self.by_code.insert(definition.code, Arc::clone(&definition));
        self.by_name.insert(name, Arc::clone(&definition));
        Ok(definition)
    }

    pub fn by_code(&self, code: u64) -> Option<&Arc<CompositeDefinition>> {
        self.by_code.get(&code)
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<CompositeDefinition>> {
        self.by_name.get(name)
    }

    /// Finds the definition for a decoded descriptor, which is either a symbol or an integer.
    pub fn lookup(&self, descriptor: &Value) -> Option<&Arc<CompositeDefinition>> {
        match descriptor.unwrapped() {
            Value::Symbol(name) => self.by_name(name),
            v                   => self.by_code(v.as_u64()?),
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

}

#[cfg(test)]
mod test {
    use super::{CompositeDefinition, Describe, Registry};
    use crate::constructor::Type;
    use crate::error::{FieldError, RegistryError};
    use crate::field::{Field, FieldType, FieldValue};
    use crate::value::Value;
    use std::sync::Arc;

    fn frame() -> Arc<CompositeDefinition> {
        Arc::new(CompositeDefinition::new("frame", 0x99)
            .field(Field::new("channel", Type::Ushort).mandatory())
            .field(Field::new("label", Type::String))
            .field(Field::new("credit", Type::Uint).default(100u32))
            .field(Field::new("extra", FieldType::Any)))
    }

    #[test]
    fn keyed_construction() {
        let frame = frame();
        let composite = frame.create(vec![("channel", FieldValue::from(Value::Number(3.0))), ("label", FieldValue::from("x"))]).unwrap();
        assert_eq!(Some(Value::Ushort(3)), composite.get("channel"));
        assert_eq!(Some(Value::string("x")), composite.get("label"));
        assert_eq!(Some(Value::Uint(100)), composite.get("credit"));
        assert_eq!(None, composite.get("extra"));
        assert_eq!(None, composite.get("nonexistent"));
        assert!(matches!(frame.empty(), Err(FieldError::Missing("channel"))));
        assert!(matches!(
            frame.create(vec![("channel", FieldValue::from(1u16)), ("bogus", FieldValue::Absent)]),
            Err(FieldError::UnknownField { composite: "frame", .. })
        ));
    }

    #[test]
    fn set_and_get() {
        let mut composite = frame().create(vec![("channel", FieldValue::from(1u16))]).unwrap();
        composite.set("credit", Value::Number(5.0)).unwrap();
        assert_eq!(Some(Value::Uint(5)), composite.get("credit"));
        assert!(matches!(composite.raw(2), Some(Value::Forced(_))));
        composite.set("credit", FieldValue::Absent).unwrap();
        assert_eq!(Some(Value::Uint(100)), composite.get("credit"));
        composite.set("extra", FieldValue::deferred(|| Value::symbol("late").into())).unwrap();
        assert_eq!(Some(Value::symbol("late")), composite.get("extra"));
        assert!(composite.set("channel", FieldValue::Absent).is_err());
        assert!(composite.set("label", Value::List(vec![Value::Null])).is_err());
    }

    #[test]
    fn described_form() {
        let composite = frame().create(vec![("channel", FieldValue::from(7u16))]).unwrap();
        let described = composite.to_described();
        assert_eq!(Value::Ulong(0x99), described.descriptor);
        match &described.value {
            Value::Forced(f) => assert_eq!(Type::List, f.ty()),
            v => panic!("expected forced list, got {}", v),
        }
        assert_eq!(
            Value::List(vec![Value::Ushort(7), Value::Null, Value::Uint(100), Value::Null]),
            described.value,
        );
    }

    #[test]
    fn positional_construction_is_tolerant() {
        let frame = frame();
        let short = frame.from_values(vec![Value::Ushort(1)]);
        assert_eq!(Some(Value::Uint(100)), short.get("credit"));
        let long = frame.from_values(vec![Value::Ushort(1), Value::Null, Value::Uint(2), Value::Null, Value::Bool(true)]);
        assert_eq!(Some(Value::Uint(2)), long.get("credit"));
        assert_eq!(4, long.to_described().value.as_list().unwrap().len());
        let empty = frame.from_values(Vec::new());
        assert_eq!(None, empty.get("channel"));
        let described = short.to_described();
        assert_eq!(short, frame.from_described(&described).unwrap());
        let bad = crate::wrapper::Described::new(Value::Ulong(0x99), Value::Uint(1));
        assert!(matches!(frame.from_described(&bad), Err(FieldError::Payload("frame"))));
    }

    #[test]
    fn equality_uses_defaults() {
        let frame = frame();
        let explicit = frame.create(vec![("channel", FieldValue::from(1u16)), ("credit", FieldValue::from(100u32))]).unwrap();
        let decoded = frame.from_values(vec![Value::Ushort(1)]);
        assert_eq!(explicit, decoded);
        assert_eq!(
            "(described (ulong 153) (list (ushort 1) (null) (uint 100) (null)))",
            explicit.to_string(),
        );
    }

    #[test]
    fn registry() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        let defined = registry.define(CompositeDefinition::new("frame", 0x99)).unwrap();
        assert_eq!(1, registry.len());
        assert!(Arc::ptr_eq(&defined, registry.by_code(0x99).unwrap()));
        assert!(Arc::ptr_eq(&defined, registry.by_name("amqp:frame:list").unwrap()));
        assert!(registry.lookup(&Value::Ulong(0x99)).is_some());
        assert!(registry.lookup(&Value::symbol("amqp:frame:list")).is_some());
        assert!(registry.lookup(&Value::string("amqp:frame:list")).is_none());
        assert!(registry.lookup(&Value::Ulong(0x98)).is_none());
        assert_eq!(
            Err(RegistryError::DuplicateCode { code: 0x99, existing: "amqp:frame:list".to_owned() }),
            registry.define(CompositeDefinition::new("other", 0x99)).map(|_| ()),
        );
        assert_eq!(
            Err(RegistryError::DuplicateName("amqp:frame:list".to_owned())),
            registry.define(CompositeDefinition::new("frame", 0x9a)).map(|_| ()),
        );
        assert_eq!(1, registry.len());
    }

}
