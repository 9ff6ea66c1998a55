// api-probe-core/src/core/schema.rs
// ============================================================================
// Module: Value Schema Model
// Description: Normalized value schemas parsed from OpenAPI fragments.
// Purpose: Drive request synthesis from declared parameter and body shapes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Schemas are the engine's normalized view of OpenAPI value shapes:
//! primitives with constraints, objects with named fields and a required set,
//! arrays, and named references into the document's component table. Parsing
//! is best-effort: constructs the synthesizer cannot use degrade to an
//! unconstrained string rather than failing the endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Normalized value schema.
///
/// # Invariants
/// - Object `required` names must appear among the object's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schema {
    /// String value with optional constraints.
    String(StringSchema),
    /// Integer value with optional bounds.
    Integer(IntegerSchema),
    /// Floating-point value with optional bounds.
    Number(NumberSchema),
    /// Boolean value.
    Boolean,
    /// Array of homogeneous items.
    Array(ArraySchema),
    /// Object with named fields.
    Object(ObjectSchema),
    /// Reference to a named component schema.
    Ref(String),
}

impl Schema {
    /// Returns an unconstrained string schema, the best-effort fallback.
    #[must_use]
    pub fn unconstrained_string() -> Self {
        Self::String(StringSchema::default())
    }

    /// Parses a schema from an OpenAPI schema fragment.
    ///
    /// Unknown or unsupported constructs degrade to an unconstrained string.
    #[must_use]
    pub fn from_openapi(fragment: &Value) -> Self {
        let Value::Object(map) = fragment else {
            return Self::unconstrained_string();
        };

        if let Some(Value::String(reference)) = map.get("$ref") {
            return match reference.rsplit('/').next() {
                Some(name) if !name.is_empty() => Self::Ref(name.to_string()),
                _ => Self::unconstrained_string(),
            };
        }

        match map.get("type").and_then(Value::as_str) {
            Some("string") => Self::String(StringSchema::from_openapi(map)),
            Some("integer") => Self::Integer(IntegerSchema {
                minimum: map.get("minimum").and_then(Value::as_i64),
                maximum: map.get("maximum").and_then(Value::as_i64),
            }),
            Some("number") => Self::Number(NumberSchema {
                minimum: map.get("minimum").and_then(Value::as_f64),
                maximum: map.get("maximum").and_then(Value::as_f64),
            }),
            Some("boolean") => Self::Boolean,
            Some("array") => {
                let items = map.get("items").map_or_else(Self::unconstrained_string, |items| {
                    Self::from_openapi(items)
                });
                Self::Array(ArraySchema {
                    items: Box::new(items),
                })
            }
            Some("object") => Self::Object(ObjectSchema::from_openapi(map)),
            // Objects are frequently declared through `properties` alone.
            None if map.contains_key("properties") => Self::Object(ObjectSchema::from_openapi(map)),
            _ => Self::unconstrained_string(),
        }
    }
}

// ============================================================================
// SECTION: String Schemas
// ============================================================================

/// Well-known string formats the synthesizer produces directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    /// RFC 5322 mailbox.
    Email,
    /// RFC 3339 full-date.
    Date,
    /// RFC 3339 date-time.
    DateTime,
    /// RFC 4122 UUID.
    Uuid,
    /// URI reference.
    Uri,
    /// Opaque secret string.
    Password,
    /// A format the synthesizer has no special handling for.
    Other(String),
}

impl StringFormat {
    /// Parses an OpenAPI format token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "email" => Self::Email,
            "date" => Self::Date,
            "date-time" => Self::DateTime,
            "uuid" => Self::Uuid,
            "uri" => Self::Uri,
            "password" => Self::Password,
            other => Self::Other(other.to_string()),
        }
    }
}

/// String schema constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StringSchema {
    /// Enumerated values; synthesis draws uniformly when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Declared string format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
    /// Regular-expression pattern constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum length constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl StringSchema {
    fn from_openapi(map: &serde_json::Map<String, Value>) -> Self {
        let enum_values = map
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| {
                values.iter().filter_map(Value::as_str).map(str::to_string).collect()
            })
            .unwrap_or_default();
        Self {
            enum_values,
            format: map.get("format").and_then(Value::as_str).map(StringFormat::parse),
            pattern: map.get("pattern").and_then(Value::as_str).map(str::to_string),
            min_length: map
                .get("minLength")
                .and_then(Value::as_u64)
                .and_then(|v| usize::try_from(v).ok()),
            max_length: map
                .get("maxLength")
                .and_then(Value::as_u64)
                .and_then(|v| usize::try_from(v).ok()),
        }
    }
}

// ============================================================================
// SECTION: Numeric Schemas
// ============================================================================

/// Integer schema bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IntegerSchema {
    /// Inclusive minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    /// Inclusive maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

/// Floating-point schema bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NumberSchema {
    /// Inclusive minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

// ============================================================================
// SECTION: Composite Schemas
// ============================================================================

/// Array schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySchema {
    /// Schema for each element.
    pub items: Box<Schema>,
}

/// Named object field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    /// Field name.
    pub name: String,
    /// Field value schema.
    pub schema: Schema,
}

/// Object schema with declaration-ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjectSchema {
    /// Fields in declaration order.
    pub fields: Vec<ObjectField>,
    /// Names of required fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ObjectSchema {
    fn from_openapi(map: &serde_json::Map<String, Value>) -> Self {
        let fields = map
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, fragment)| ObjectField {
                        name: name.clone(),
                        schema: Schema::from_openapi(fragment),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let declared: Vec<String> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|values| {
                values.iter().filter_map(Value::as_str).map(str::to_string).collect()
            })
            .unwrap_or_default();
        // Required names without a matching field are dropped to keep the
        // invariant that `required` is a subset of `fields`.
        let field_names: Vec<&String> =
            map.get("properties").and_then(Value::as_object).map_or_else(Vec::new, |properties| {
                properties.keys().collect()
            });
        let required = declared
            .into_iter()
            .filter(|name| field_names.iter().any(|field| *field == name))
            .collect();
        Self {
            fields,
            required,
        }
    }

    /// Returns true when the named field is required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|required| required == name)
    }
}
