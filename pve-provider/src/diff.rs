//! Property diffing and action classification.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{ChangeBehavior, FieldSchema, FieldType, ResourceSchema};
use crate::value::{PropertyMap, PropertyValue};

/// What the adapter must do to converge a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Replace,
    NoChange,
}

impl Action {
    /// Classify from a detailed diff against existing state.
    pub fn from_diff(diff: &DetailedDiff) -> Self {
        if diff.requires_replace() {
            Action::Replace
        } else if diff.has_changes() {
            Action::Update
        } else {
            Action::NoChange
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Replace => "replace",
            Action::NoChange => "no-change",
        };
        f.write_str(s)
    }
}

/// How a single property change is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Update,
    Replace,
}

/// A single changed property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDiff {
    pub kind: DiffKind,
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

/// Changed properties keyed by dotted path (e.g. `sourceRaw.fileData`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetailedDiff(BTreeMap<String, PropertyDiff>);

impl DetailedDiff {
    pub fn has_changes(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.0.values().any(|d| d.kind == DiffKind::Replace)
    }

    pub fn get(&self, path: &str) -> Option<&PropertyDiff> {
        self.0.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDiff)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DetailedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, change) in &self.0 {
            let marker = match change.kind {
                DiffKind::Update => "~",
                DiffKind::Replace => "+-",
            };
            let old = change.old.as_ref().map_or_else(|| "<none>".to_string(), |v| v.to_string());
            let new = change.new.as_ref().map_or_else(|| "<none>".to_string(), |v| v.to_string());
            writeln!(f, "  {} {}: {} => {}", marker, path, old, new)?;
        }
        Ok(())
    }
}

/// Compare desired properties against observed ones, field by field.
///
/// Only schema fields are compared. A nested change inherits replace
/// semantics from any enclosing field that forces replacement.
pub fn diff(
    schema: &ResourceSchema,
    desired: &PropertyMap,
    observed: &PropertyMap,
) -> DetailedDiff {
    let mut out = BTreeMap::new();
    diff_fields(schema.fields, desired, observed, "", false, &mut out);
    DetailedDiff(out)
}

fn diff_fields(
    fields: &[FieldSchema],
    desired: &PropertyMap,
    observed: &PropertyMap,
    prefix: &str,
    parent_replaces: bool,
    out: &mut BTreeMap<String, PropertyDiff>,
) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        let replaces = parent_replaces || field.change == ChangeBehavior::ForceReplace;
        let kind = if replaces { DiffKind::Replace } else { DiffKind::Update };

        let new = present(desired.get(field.name));
        let old = present(observed.get(field.name));

        match (field.field_type, new, old) {
            (_, None, None) => {}
            (
                FieldType::Object(children),
                Some(PropertyValue::Object(n)),
                Some(PropertyValue::Object(o)),
            ) => {
                diff_fields(children, n, o, &path, replaces, out);
            }
            (_, new, old) => {
                let changed = match (new, old) {
                    (Some(n), Some(o)) => !n.same_as(o),
                    _ => true,
                };
                if changed {
                    out.insert(path, PropertyDiff {
                        kind,
                        old: old.cloned(),
                        new: new.cloned(),
                    });
                }
            }
        }
    }
}

fn present(value: Option<&PropertyValue>) -> Option<&PropertyValue> {
    value.filter(|v| !matches!(v, PropertyValue::Null))
}
