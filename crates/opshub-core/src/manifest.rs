//! Plugin manifest schema and structural validation.
//!
//! Every module directory under the modules root carries a `manifest.json`
//! describing the module's identity, route, permissions, and dependencies.
//! Validation collects **all** offending fields into a single [`SchemaError`]
//! instead of failing on the first, so a broken manifest can be fixed in one
//! pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;

/// Declarative identity of a dashboard module.
///
/// Immutable once loaded into a process generation; the copy on disk is
/// authoritative over anything the module implementation might carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// Unique module name, used as the registry key.
    pub name: String,
    /// Human-readable display name shown in navigation.
    pub display_name: String,
    /// Module description (may be empty).
    pub description: String,
    /// Icon token for the shell to resolve.
    pub icon: String,
    /// Route path; must begin with the module's own path segment.
    pub route: String,
    /// Semantic-version-like string (not semantically enforced).
    pub version: String,
    /// Whether the module participates in loading at all.
    pub enabled: bool,
    /// Optional navigation sort order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Names of other modules this one requires.
    pub dependencies: Vec<String>,
    /// Permission strings (`module:action`) required to see this module.
    pub permissions: Vec<String>,
}

/// A single invalid or missing manifest field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The manifest field name as it appears in the JSON document.
    pub field: &'static str,
    /// Why the field was rejected.
    pub reason: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Structural validation failure listing every offending field.
#[derive(Debug, Clone, Error)]
#[error("invalid manifest: {}", self.describe())]
pub struct SchemaError {
    /// All field-level failures found in one validation pass.
    pub errors: Vec<FieldError>,
}

impl SchemaError {
    fn describe(&self) -> String {
        self.errors
            .iter()
            .map(FieldError::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Returns the names of all offending fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::with_source(crate::error::ErrorKind::Validation, err.to_string(), err)
    }
}

/// Collects validation failures while walking the raw document.
struct FieldChecker<'a> {
    value: &'a Value,
    errors: Vec<FieldError>,
}

impl<'a> FieldChecker<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            reason: reason.into(),
        });
    }

    fn string(&mut self, field: &'static str, allow_empty: bool) -> Option<String> {
        match self.value.get(field) {
            None | Some(Value::Null) => {
                self.fail(field, "required field is missing");
                None
            }
            Some(Value::String(s)) => {
                if s.is_empty() && !allow_empty {
                    self.fail(field, "must be a non-empty string");
                    None
                } else {
                    Some(s.clone())
                }
            }
            Some(other) => {
                self.fail(field, format!("expected a string, got {}", type_name(other)));
                None
            }
        }
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        match self.value.get(field) {
            None | Some(Value::Null) => {
                self.fail(field, "required field is missing");
                None
            }
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.fail(
                    field,
                    format!("expected a boolean, got {}", type_name(other)),
                );
                None
            }
        }
    }

    fn optional_integer(&mut self, field: &'static str) -> Option<i64> {
        match self.value.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Some(i),
                None => {
                    self.fail(field, "expected an integer");
                    None
                }
            },
            Some(other) => {
                self.fail(
                    field,
                    format!("expected an integer, got {}", type_name(other)),
                );
                None
            }
        }
    }

    fn string_array(&mut self, field: &'static str) -> Option<Vec<String>> {
        match self.value.get(field) {
            None | Some(Value::Null) => {
                self.fail(field, "required field is missing");
                None
            }
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        other => {
                            self.fail(
                                field,
                                format!("element {index} must be a string, got {}", type_name(other)),
                            );
                            return None;
                        }
                    }
                }
                Some(out)
            }
            Some(other) => {
                self.fail(
                    field,
                    format!("expected an array of strings, got {}", type_name(other)),
                );
                None
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PluginManifest {
    /// Validates a raw JSON document into a manifest.
    ///
    /// Returns a [`SchemaError`] enumerating every offending field when the
    /// document does not satisfy the schema.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        if !value.is_object() {
            return Err(SchemaError {
                errors: vec![FieldError {
                    field: "manifest",
                    reason: format!("expected an object, got {}", type_name(value)),
                }],
            });
        }

        let mut checker = FieldChecker::new(value);

        let name = checker.string("name", false);
        let display_name = checker.string("displayName", false);
        let description = checker.string("description", true);
        let icon = checker.string("icon", false);
        let route = checker.string("route", false);
        let version = checker.string("version", false);
        let enabled = checker.boolean("enabled");
        let order = checker.optional_integer("order");
        let dependencies = checker.string_array("dependencies");
        let permissions = checker.string_array("permissions");

        // The route must live under the module's own path segment so the
        // shell can map URLs back to the owning module.
        if let (Some(name), Some(route)) = (name.as_deref(), route.as_deref()) {
            let prefix = format!("/{name}");
            if route != prefix && !route.starts_with(&format!("{prefix}/")) {
                checker.fail("route", format!("must begin with '{prefix}'"));
            }
        }

        if !checker.errors.is_empty() {
            return Err(SchemaError {
                errors: checker.errors,
            });
        }

        // All unwraps below are guarded by the error check above.
        Ok(Self {
            name: name.unwrap(),
            display_name: display_name.unwrap(),
            description: description.unwrap(),
            icon: icon.unwrap(),
            route: route.unwrap(),
            version: version.unwrap(),
            enabled: enabled.unwrap(),
            order,
            dependencies: dependencies.unwrap(),
            permissions: permissions.unwrap(),
        })
    }

    /// Parses and validates a manifest from raw JSON text.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| SchemaError {
            errors: vec![FieldError {
                field: "manifest",
                reason: format!("invalid JSON: {e}"),
            }],
        })?;
        Self::from_value(&value)
    }
}
