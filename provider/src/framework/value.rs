// provider/src/framework/value.rs

/// A single attribute value as Terraform sees it during planning.
///
/// `Unknown` is distinct from `Null`: it marks a value that will only be
/// determined at apply time, typically because it depends on another
/// resource's computed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<T> {
    Null,
    Unknown,
    Known(T),
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Null
    }
}

impl<T> Value<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Transforms a known value, leaving null and unknown untouched.
    pub fn map<U, F>(self, f: F) -> Value<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(f(v)),
        }
    }
}

impl Value<String> {
    pub fn known(value: impl Into<String>) -> Self {
        Value::Known(value.into())
    }
}
