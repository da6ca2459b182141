use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{kind} record has no 'type' tag")]
    MissingType { kind: &'static str },
    #[error("no {kind} builder registered for type '{type_tag}'")]
    UnregisteredBuilder {
        kind: &'static str,
        type_tag: String,
    },
    #[error("invalid '{type_tag}' record at {path}: {message}")]
    InvalidRecord {
        type_tag: String,
        path: String,
        message: String,
    },
    #[error("unsupported shape type '{shape_type}'")]
    UnsupportedShape { shape_type: String },
}

pub fn record_type_tag(record: &Value) -> Option<&str> {
    record.get("type").and_then(Value::as_str)
}

/// Deserializes a builder record, reporting the failing field by JSON path.
pub fn parse_record<T: DeserializeOwned>(type_tag: &str, record: &Value) -> Result<T, BuildError> {
    serde_path_to_error::deserialize(record).map_err(|error| BuildError::InvalidRecord {
        type_tag: type_tag.to_string(),
        path: error.path().to_string(),
        message: error.inner().to_string(),
    })
}
