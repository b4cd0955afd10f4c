//! Declarative resource schemas.
//!
//! A schema lists a resource's properties with their shape, whether they
//! are required, whether they are secret, and how a change to them is
//! applied (in place, or by replacing the resource).

use tracing::warn;

use crate::error::{ProviderError, Result};
use crate::value::{PropertyMap, PropertyValue};

/// Shape of a property value.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    String,
    Number,
    Bool,
    Array(&'static FieldType),
    Object(&'static [FieldSchema]),
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Array(_) => "array",
            FieldType::Object(_) => "object",
        }
    }
}

/// Value filled in for an absent optional property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    String(&'static str),
    Number(f64),
    Bool(bool),
}

impl FieldDefault {
    pub fn to_value(&self) -> PropertyValue {
        match *self {
            FieldDefault::String(s) => PropertyValue::from(s),
            FieldDefault::Number(n) => PropertyValue::Number(n),
            FieldDefault::Bool(b) => PropertyValue::Bool(b),
        }
    }
}

/// How a change to a property is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeBehavior {
    UpdateInPlace,
    ForceReplace,
}

/// Schema for a single property.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub secret: bool,
    pub change: ChangeBehavior,
    pub default: Option<FieldDefault>,
    pub description: &'static str,
}

impl FieldSchema {
    const fn of(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            secret: false,
            change: ChangeBehavior::UpdateInPlace,
            default: None,
            description: "",
        }
    }

    /// An optional, mutable string property.
    pub const fn string(name: &'static str) -> Self {
        Self::of(name, FieldType::String)
    }

    /// An optional, mutable numeric property.
    pub const fn number(name: &'static str) -> Self {
        Self::of(name, FieldType::Number)
    }

    /// An optional, mutable boolean property.
    pub const fn bool(name: &'static str) -> Self {
        Self::of(name, FieldType::Bool)
    }

    /// An optional, mutable list whose items all have type `item`.
    pub const fn array(name: &'static str, item: &'static FieldType) -> Self {
        Self::of(name, FieldType::Array(item))
    }

    /// An optional, mutable object property with nested fields.
    pub const fn object(name: &'static str, fields: &'static [FieldSchema]) -> Self {
        Self::of(name, FieldType::Object(fields))
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn secret(self) -> Self {
        Self { secret: true, ..self }
    }

    pub const fn force_replace(self) -> Self {
        Self {
            change: ChangeBehavior::ForceReplace,
            ..self
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(FieldDefault::String(default)),
            ..self
        }
    }

    pub const fn with_default_bool(self, default: bool) -> Self {
        Self {
            default: Some(FieldDefault::Bool(default)),
            ..self
        }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self { description, ..self }
    }
}

/// Schema for a resource type.
#[derive(Debug)]
pub struct ResourceSchema {
    /// Type token registered with the host (e.g. `pve:storage:File`)
    pub type_token: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSchema],
    /// On replace, delete the old instance before creating the new one.
    /// Otherwise the replacement is created first.
    pub delete_before_replace: bool,
}

impl ResourceSchema {
    /// Find a top-level field by property name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Dotted paths of every secret field, nested ones included.
    ///
    /// This is the secret marker table the adapter forwards to the host.
    pub fn secret_fields(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_secret_paths(self.fields, "", &mut paths);
        paths
    }

    /// Fill absent optional fields that declare a default.
    pub fn apply_defaults(&self, props: &mut PropertyMap) {
        apply_defaults(self.fields, props);
    }

    /// Fill fields absent from `desired` with their `observed` values,
    /// descending into nested objects.
    pub fn fill_from_observed(&self, desired: &mut PropertyMap, observed: &PropertyMap) {
        fill_from_observed(self.fields, desired, observed);
    }

    /// Check required-ness and value shapes.
    ///
    /// Unknown properties are ignored with a warning.
    pub fn validate(&self, props: &PropertyMap) -> Result<()> {
        validate_fields(self.type_token, self.fields, props, "")?;

        for key in props.keys() {
            if self.field(key).is_none() {
                warn!(resource = self.type_token, property = %key, "Ignoring unknown property");
            }
        }

        Ok(())
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn is_absent(value: Option<&PropertyValue>) -> bool {
    matches!(value, None | Some(PropertyValue::Null))
}

fn collect_secret_paths(fields: &[FieldSchema], prefix: &str, out: &mut Vec<String>) {
    for field in fields {
        let path = join(prefix, field.name);
        if field.secret {
            out.push(path);
        } else if let FieldType::Object(children) = field.field_type {
            collect_secret_paths(children, &path, out);
        }
    }
}

fn apply_defaults(fields: &[FieldSchema], props: &mut PropertyMap) {
    for field in fields {
        if is_absent(props.get(field.name)) {
            if let Some(default) = field.default {
                props.insert(field.name.to_string(), default.to_value());
            }
            continue;
        }

        if let (FieldType::Object(children), Some(PropertyValue::Object(nested))) =
            (field.field_type, props.get_mut(field.name))
        {
            apply_defaults(children, nested);
        }
    }
}

fn fill_from_observed(fields: &[FieldSchema], desired: &mut PropertyMap, observed: &PropertyMap) {
    for field in fields {
        let Some(old) = observed.get(field.name) else {
            continue;
        };

        if is_absent(desired.get(field.name)) {
            desired.insert(field.name.to_string(), old.clone());
            continue;
        }

        if let FieldType::Object(children) = field.field_type {
            if let (Some(PropertyValue::Object(new)), PropertyValue::Object(old)) =
                (desired.get_mut(field.name), old)
            {
                fill_from_observed(children, new, old);
            }
        }
    }
}

fn check_value(
    resource: &str,
    field: &FieldSchema,
    field_type: FieldType,
    value: &PropertyValue,
    path: &str,
) -> Result<()> {
    match (field_type, value) {
        (FieldType::String, PropertyValue::String(_)) => Ok(()),
        (FieldType::String, PropertyValue::Secret(_)) if field.secret => Ok(()),
        (FieldType::Number, PropertyValue::Number(_)) => Ok(()),
        (FieldType::Bool, PropertyValue::Bool(_)) => Ok(()),
        (FieldType::Array(item), PropertyValue::Array(items)) => {
            for (i, value) in items.iter().enumerate() {
                check_value(resource, field, *item, value, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        (FieldType::Object(children), PropertyValue::Object(nested)) => {
            validate_fields(resource, children, nested, path)
        }
        (expected, found) => Err(ProviderError::mismatch(
            path,
            expected.name(),
            found.type_name(),
        )),
    }
}

fn validate_fields(
    resource: &str,
    fields: &[FieldSchema],
    props: &PropertyMap,
    prefix: &str,
) -> Result<()> {
    for field in fields {
        let path = join(prefix, field.name);

        match props.get(field.name) {
            value if is_absent(value) => {
                if field.required {
                    return Err(ProviderError::missing(resource, path));
                }
            }
            Some(value) => check_value(resource, field, field.field_type, value, &path)?,
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::Sensitive;
    use crate::value::properties_from_json;
    use serde_json::json;

    const SOURCE: &[FieldSchema] = &[
        FieldSchema::string("fileName").required(),
        FieldSchema::string("fileData").required(),
    ];

    const FIELDS: &[FieldSchema] = &[
        FieldSchema::string("name").required().force_replace(),
        FieldSchema::string("comment").with_default("none"),
        FieldSchema::string("password").secret(),
        FieldSchema::object("source", SOURCE),
        FieldSchema::array("tags", &FieldType::String),
        FieldSchema::number("size"),
        FieldSchema::bool("enabled").with_default_bool(true),
    ];

    const SCHEMA: ResourceSchema = ResourceSchema {
        type_token: "test:index:Thing",
        description: "",
        fields: FIELDS,
        delete_before_replace: false,
    };

    #[test]
    fn test_validate_ok() {
        let props = properties_from_json(json!({
            "name": "a",
            "source": { "fileName": "f", "fileData": "d" }
        }));
        assert!(SCHEMA.validate(&props).is_ok());
    }

    #[test]
    fn test_validate_missing_required() {
        let props = properties_from_json(json!({ "comment": "x" }));
        let err = SCHEMA.validate(&props).unwrap_err();
        assert_eq!(err, ProviderError::missing("test:index:Thing", "name"));

        let props = properties_from_json(json!({ "name": "a", "source": { "fileName": "f" } }));
        let err = SCHEMA.validate(&props).unwrap_err();
        assert_eq!(err, ProviderError::missing("test:index:Thing", "source.fileData"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let props = properties_from_json(json!({ "name": null }));
        assert!(matches!(
            SCHEMA.validate(&props),
            Err(ProviderError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let props = properties_from_json(json!({ "name": 42 }));
        assert_eq!(
            SCHEMA.validate(&props).unwrap_err(),
            ProviderError::mismatch("name", "string", "number")
        );

        let props = properties_from_json(json!({ "name": "a", "source": "flat" }));
        assert_eq!(
            SCHEMA.validate(&props).unwrap_err(),
            ProviderError::mismatch("source", "object", "string")
        );
    }

    #[test]
    fn test_secret_handle_only_accepted_for_secret_fields() {
        let mut props = properties_from_json(json!({ "name": "a" }));
        props.insert("password".into(), Sensitive::new("p".to_string()).into());
        assert!(SCHEMA.validate(&props).is_ok());

        props.insert("comment".into(), Sensitive::new("c".to_string()).into());
        assert!(matches!(
            SCHEMA.validate(&props),
            Err(ProviderError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_apply_defaults() {
        let mut props = properties_from_json(json!({ "name": "a" }));
        SCHEMA.apply_defaults(&mut props);
        assert_eq!(props["comment"], PropertyValue::from("none"));

        let mut props = properties_from_json(json!({ "name": "a", "comment": "kept" }));
        SCHEMA.apply_defaults(&mut props);
        assert_eq!(props["comment"], PropertyValue::from("kept"));
    }

    #[test]
    fn test_secret_fields() {
        assert_eq!(SCHEMA.secret_fields(), vec!["password".to_string()]);
    }

    #[test]
    fn test_scalar_and_array_shapes() {
        let props = properties_from_json(json!({
            "name": "a",
            "tags": ["x", "y"],
            "size": 4,
            "enabled": false
        }));
        assert!(SCHEMA.validate(&props).is_ok());

        let props = properties_from_json(json!({ "name": "a", "tags": ["x", 1] }));
        assert_eq!(
            SCHEMA.validate(&props).unwrap_err(),
            ProviderError::mismatch("tags[1]", "string", "number")
        );

        let props = properties_from_json(json!({ "name": "a", "enabled": "yes" }));
        assert_eq!(
            SCHEMA.validate(&props).unwrap_err(),
            ProviderError::mismatch("enabled", "bool", "string")
        );
    }

    #[test]
    fn test_bool_default() {
        let mut props = properties_from_json(json!({ "name": "a" }));
        SCHEMA.apply_defaults(&mut props);
        assert_eq!(props["enabled"], PropertyValue::Bool(true));
    }

    #[test]
    fn test_fill_from_observed_nested() {
        let observed = properties_from_json(json!({
            "name": "a",
            "comment": "old",
            "source": { "fileName": "f", "fileData": "d" }
        }));
        let mut desired = properties_from_json(json!({
            "comment": "new",
            "source": { "fileData": "e" }
        }));

        SCHEMA.fill_from_observed(&mut desired, &observed);

        assert_eq!(
            desired,
            properties_from_json(json!({
                "name": "a",
                "comment": "new",
                "source": { "fileName": "f", "fileData": "e" }
            }))
        );
    }
}
