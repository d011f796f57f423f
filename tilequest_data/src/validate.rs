use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// A required-key declaration for a structured document.
///
/// Schemas only describe *presence*: which keys must exist at each nesting
/// level. Value types are never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum Schema {
    /// A single key that must be present.
    Key(String),
    /// Every entry must hold. Applied to an array, every element must satisfy the whole sequence.
    Seq(Vec<Schema>),
    /// Every key must be present and its value must satisfy the nested schema.
    Map(Vec<(String, Schema)>),
}

impl Schema {
    /// Convenience constructor for a flat list of required keys.
    pub fn keys<I, S>(keys: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Seq(keys.into_iter().map(|key| Schema::Key(key.into())).collect())
    }

    /// Render the schema back into the JSON shape it was declared with.
    pub fn to_value(&self) -> Value {
        match self {
            Schema::Key(key) => Value::String(key.clone()),
            Schema::Seq(entries) => Value::Array(entries.iter().map(Schema::to_value).collect()),
            Schema::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, schema)| (key.clone(), schema.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Schema {
    /// Strings become keys, arrays become sequences, objects become mappings.
    /// Other scalars are treated as keys spelled the way JSON prints them.
    fn from(value: Value) -> Self {
        match value {
            Value::String(key) => Schema::Key(key),
            Value::Array(entries) => Schema::Seq(entries.into_iter().map(Schema::from).collect()),
            Value::Object(entries) => Schema::Map(
                entries
                    .into_iter()
                    .map(|(key, nested)| (key, Schema::from(nested)))
                    .collect(),
            ),
            other => Schema::Key(other.to_string()),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Structural validation failure for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    SchemaMismatch { data: String, schema: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SchemaMismatch { data, schema } => {
                write!(
                    f,
                    "the given data was invalid for the schema: data was {data} but schema is {schema}"
                )
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that `data` contains every key path described by `schema`.
///
/// ```
/// use serde_json::json;
/// use tilequest_data::{Schema, validate};
///
/// let schema = Schema::from(json!(["start", {"popup_box": ["x", "y"]}]));
/// assert!(validate(&json!({"start": "a.json", "popup_box": {"x": 1, "y": 2}}), &schema));
/// assert!(!validate(&json!({"start": "a.json", "popup_box": {"x": 1}}), &schema));
/// ```
pub fn validate(data: &Value, schema: &Schema) -> bool {
    match schema {
        Schema::Map(entries) => match data {
            Value::Object(fields) => entries.iter().all(|(key, nested)| {
                fields
                    .get(key)
                    .is_some_and(|value| validate(value, nested))
            }),
            _ => false,
        },
        Schema::Seq(entries) => match data {
            // each member of a collection must carry the declared fields
            Value::Array(elements) => elements.iter().all(|element| validate(element, schema)),
            _ => entries.iter().all(|entry| validate(data, entry)),
        },
        Schema::Key(key) => contains_key(data, key),
    }
}

/// Like [`validate`], but reports a descriptive error on failure.
///
/// # Errors
/// - if any key path in `schema` is absent from `data`
pub fn validate_document(data: &Value, schema: &Schema) -> Result<(), ValidationError> {
    if validate(data, schema) {
        Ok(())
    } else {
        Err(ValidationError::SchemaMismatch {
            data: data.to_string(),
            schema: schema.to_string(),
        })
    }
}

fn contains_key(data: &Value, key: &str) -> bool {
    match data {
        Value::Object(fields) => fields.contains_key(key),
        Value::Array(elements) => elements.iter().any(|element| element.as_str() == Some(key)),
        _ => false,
    }
}
