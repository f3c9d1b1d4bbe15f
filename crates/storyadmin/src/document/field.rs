//! A document field that never loses what the file held.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One field of the configuration document.
///
/// A value is only taken as `Typed` when it parses as `T` *and* writes back
/// to exactly the same JSON. Anything else (wrong type, explicit `null`, a
/// number that would change representation) is kept verbatim in `Raw`, so an
/// unedited field always serializes to what was read. `Missing` fields are
/// skipped on output.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Missing,
    Typed(T),
    Raw(Value),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    /// The typed value, if the field holds one.
    pub fn get(&self) -> Option<&T> {
        match self {
            Field::Typed(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Field::Typed(value) => Some(value),
            _ => None,
        }
    }

    /// The verbatim value of a field that did not fit `T`.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Field::Raw(value) => Some(value),
            _ => None,
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Field::Typed(value);
    }

    /// Returns the typed value, replacing a missing or raw value with `f()`.
    pub fn get_or_insert_with(&mut self, f: impl FnOnce() -> T) -> &mut T {
        if !matches!(self, Field::Typed(_)) {
            *self = Field::Typed(f());
        }
        match self {
            Field::Typed(value) => value,
            _ => unreachable!("field was just set"),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Field<T> {
    /// Classifies a JSON value read from the document.
    pub fn from_raw(raw: Value) -> Self {
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(typed) if serde_json::to_value(&typed).ok().as_ref() == Some(&raw) => {
                Field::Typed(typed)
            }
            _ => Field::Raw(raw),
        }
    }
}

impl Field<String> {
    pub fn as_str(&self) -> Option<&str> {
        self.get().map(String::as_str)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Typed(value)
    }
}

impl From<&str> for Field<String> {
    fn from(value: &str) -> Self {
        Field::Typed(value.to_string())
    }
}

impl PartialEq<str> for Field<String> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Field<String> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Missing => serializer.serialize_none(),
            Field::Typed(value) => value.serialize(serializer),
            Field::Raw(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Serialize + DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Field::from_raw)
    }
}
