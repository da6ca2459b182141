use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::math::{Transform, Vec3};

#[derive(Debug, Error)]
#[error("{message} (at {path})")]
pub struct LevelParseError {
    pub path: String,
    pub message: String,
}

/// Top-level record of a level file.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelData {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub entities: Vec<EntityRecord>,
}

impl LevelData {
    pub fn from_json_str(raw: &str) -> Result<Self, LevelParseError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| LevelParseError {
            path: error.path().to_string(),
            message: error.inner().to_string(),
        })
    }

    pub fn from_value(value: &Value) -> Result<Self, LevelParseError> {
        serde_path_to_error::deserialize(value).map_err(|error| LevelParseError {
            path: error.path().to_string(),
            message: error.inner().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transform: Option<TransformRecord>,
    /// Raw records, resolved through the component registry by their `type` tag.
    #[serde(default)]
    pub components: Vec<Value>,
    #[serde(default)]
    pub behaviors: Vec<Value>,
    #[serde(default)]
    pub children: Vec<EntityRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec3Record {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl Vec3Record {
    /// Overwrites only the components present in the record.
    pub fn apply_to(&self, base: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(base.x),
            self.y.unwrap_or(base.y),
            self.z.unwrap_or(base.z),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct TransformRecord {
    #[serde(default)]
    pub position: Option<Vec3Record>,
    #[serde(default)]
    pub rotation: Option<Vec3Record>,
    #[serde(default)]
    pub scale: Option<Vec3Record>,
}

impl TransformRecord {
    pub fn to_transform(&self) -> Transform {
        let base = Transform::default();
        Transform {
            position: apply(self.position, base.position),
            rotation: apply(self.rotation, base.rotation),
            scale: apply(self.scale, base.scale),
        }
    }
}

fn apply(record: Option<Vec3Record>, base: Vec3) -> Vec3 {
    record.map_or(base, |record| record.apply_to(base))
}
