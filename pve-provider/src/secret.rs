//! Secret handling.
//!
//! Secrets are carried as [`Sensitive`] values: the wrapped value is only
//! reachable through [`Sensitive::expose`], and every formatting or
//! serialization path prints [`MASK`] instead.
//!
//! The per-resource secret marker table is derived from each schema
//! (fields declared with `.secret()`), and [`seal_secrets`] applies it to
//! untyped property maps before they are handed to the host.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::schema::{FieldSchema, FieldType, ResourceSchema};
use crate::value::{PropertyMap, PropertyValue};

/// Placeholder printed wherever a secret value would appear.
pub const MASK: &str = "[secret]";

/// A value that must never be displayed, logged or serialized in plaintext.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the plaintext value.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Unwrap into the plaintext value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(MASK)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

/// Replace plaintext values of every secret field in `props` with opaque
/// secret handles. Returns the number of values that were sealed.
pub fn seal_secrets(schema: &ResourceSchema, props: &mut PropertyMap) -> usize {
    seal_fields(schema.fields, props)
}

fn seal_fields(fields: &[FieldSchema], props: &mut PropertyMap) -> usize {
    let mut sealed = 0;
    for field in fields {
        let Some(value) = props.get_mut(field.name) else {
            continue;
        };

        if field.secret {
            if let PropertyValue::String(plain) = value {
                let plain = std::mem::take(plain);
                *value = PropertyValue::Secret(Sensitive::new(plain));
                sealed += 1;
            }
            continue;
        }

        if let (FieldType::Object(children), PropertyValue::Object(nested)) =
            (field.field_type, value)
        {
            sealed += seal_fields(children, nested);
        }
    }
    sealed
}

/// Paths of secret fields in `props` that still hold plaintext.
pub fn plaintext_secrets(schema: &ResourceSchema, props: &PropertyMap) -> Vec<String> {
    schema
        .secret_fields()
        .into_iter()
        .filter(|path| matches!(crate::value::lookup(props, path), Some(PropertyValue::String(_))))
        .collect()
}
