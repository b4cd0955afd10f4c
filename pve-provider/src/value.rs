//! Untyped property values exchanged with the orchestration host.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::secret::Sensitive;

/// A property bag keyed by schema property name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value.
///
/// `Secret` is an opaque handle: it serializes and displays masked, and
/// the plaintext is only reachable through [`Sensitive::expose`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(PropertyMap),
    Secret(Sensitive<String>),
}

impl PropertyValue {
    /// Name of the value's shape, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Array(_) => "array",
            PropertyValue::Object(_) => "object",
            PropertyValue::Secret(_) => "secret",
        }
    }

    /// String contents, looking through secret handles.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            PropertyValue::Secret(s) => Some(s.expose()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PropertyValue::Secret(_))
    }

    /// Compare two values, treating a secret handle and a plain string with
    /// the same contents as equal.
    pub fn same_as(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Secret(_), _) | (_, PropertyValue::Secret(_)) => {
                match (self.as_str(), other.as_str()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (PropertyValue::Array(a), PropertyValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (PropertyValue::Object(a), PropertyValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).map_or(false, |w| v.same_as(w)))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::String(s) => write!(f, "{:?}", s),
            PropertyValue::Secret(s) => write!(f, "{}", s),
            PropertyValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PropertyValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(value)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        PropertyValue::Object(value)
    }
}

impl From<Sensitive<String>> for PropertyValue {
    fn from(value: Sensitive<String>) -> Self {
        PropertyValue::Secret(value)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            serde_json::Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => PropertyValue::String(s),
            serde_json::Value::Array(items) => {
                PropertyValue::Array(items.into_iter().map(PropertyValue::from).collect())
            }
            serde_json::Value::Object(map) => PropertyValue::Object(
                map.into_iter().map(|(k, v)| (k, PropertyValue::from(v))).collect(),
            ),
        }
    }
}

/// Build a property map from a JSON object. Non-object values yield an
/// empty map.
pub fn properties_from_json(value: serde_json::Value) -> PropertyMap {
    match PropertyValue::from(value) {
        PropertyValue::Object(map) => map,
        _ => PropertyMap::new(),
    }
}

/// Look up a dotted property path such as `sourceRaw.fileData`.
pub fn lookup<'a>(props: &'a PropertyMap, path: &str) -> Option<&'a PropertyValue> {
    let mut parts = path.split('.');
    let mut current = props.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_and_lookup() {
        let props = properties_from_json(json!({
            "contentType": "snippets",
            "sourceRaw": { "fileName": "a.yaml", "fileData": "x" }
        }));

        assert_eq!(lookup(&props, "contentType").and_then(|v| v.as_str()), Some("snippets"));
        assert_eq!(lookup(&props, "sourceRaw.fileName").and_then(|v| v.as_str()), Some("a.yaml"));
        assert!(lookup(&props, "sourceRaw.missing").is_none());
        assert!(lookup(&props, "contentType.nested").is_none());
    }

    #[test]
    fn test_secret_serializes_masked() {
        let mut props = PropertyMap::new();
        props.insert("pveToken".into(), Sensitive::new("abc".to_string()).into());
        props.insert("pveUser".into(), "root@pam".into());

        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"pveToken":"[secret]","pveUser":"root@pam"}"#);
        assert!(!format!("{:?}", props).contains("abc"));
    }

    #[test]
    fn test_same_as_looks_through_secrets() {
        let plain = PropertyValue::from("abc");
        let sealed = PropertyValue::Secret(Sensitive::new("abc".to_string()));
        let other = PropertyValue::Secret(Sensitive::new("xyz".to_string()));

        assert!(plain.same_as(&sealed));
        assert!(sealed.same_as(&plain));
        assert!(!sealed.same_as(&other));
        assert_ne!(plain, sealed);
    }

    #[test]
    fn test_display() {
        let value = PropertyValue::from(properties_from_json(json!({"a": "x", "b": true})));
        assert_eq!(value.to_string(), r#"{a: "x", b: true}"#);
    }
}
