// provider/src/framework/record.rs

use std::collections::BTreeMap;

use crate::framework::diagnostics::{Diagnostic, Diagnostics};
use crate::framework::value::Value;

/// Attribute name to value, ordered so encoded payloads are deterministic.
pub type Attributes = BTreeMap<String, Value<String>>;

/// A decoded plan, state or configuration payload.
///
/// A null record means "no object": no prior state during create, no plan
/// during destroy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    attributes: Option<Attributes>,
}

/// Typed extraction of a model out of a record's attributes.
pub trait FromRecord: Sized {
    fn from_record(attributes: &Attributes) -> Result<Self, Diagnostics>;
}

/// Writes a model's attributes into a record.
pub trait IntoRecord {
    fn into_record(self, attributes: &mut Attributes);
}

impl Record {
    pub fn null() -> Self {
        Self { attributes: None }
    }

    pub fn object(attributes: Attributes) -> Self {
        Self {
            attributes: Some(attributes),
        }
    }

    pub fn from_model<T: IntoRecord>(model: T) -> Self {
        let mut record = Self::null();
        record.set(model);
        record
    }

    pub fn is_null(&self) -> bool {
        self.attributes.is_none()
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Value of a root attribute. Absent attributes and null records read as null.
    pub fn attribute(&self, name: &str) -> Value<String> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Sets a root attribute, turning a null record into an object first.
    pub fn set_attribute(&mut self, name: &str, value: Value<String>) {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(name.to_string(), value);
    }

    /// Forces the named attributes to null. No-op on a null record.
    pub fn null_attributes<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(attrs) = self.attributes.as_mut() {
            for name in names {
                attrs.insert(name.to_string(), Value::Null);
            }
        }
    }

    /// Extracts a typed model. Fails on a null record, since a model always
    /// describes an object.
    pub fn get<T: FromRecord>(&self) -> Result<T, Diagnostics> {
        match &self.attributes {
            Some(attrs) => T::from_record(attrs),
            None => Err(Diagnostic::error(
                "Value Conversion Error",
                "Received null value, however the target type cannot handle null values.",
            )
            .into()),
        }
    }

    pub fn set<T: IntoRecord>(&mut self, model: T) {
        model.into_record(self.attributes.get_or_insert_with(Attributes::new));
    }
}

/// Rejects attributes a model has no field for.
pub fn expect_attributes(attributes: &Attributes, known: &[&str]) -> Result<(), Diagnostics> {
    let mut diags = Diagnostics::new();
    for name in attributes.keys() {
        if !known.contains(&name.as_str()) {
            diags.push(
                Diagnostic::error(
                    "Value Conversion Error",
                    format!("Object defines attribute {:?}, which the target type does not declare.", name),
                )
                .with_attribute(name.clone()),
            );
        }
    }

    if diags.has_error() {
        return Err(diags);
    }
    Ok(())
}
