use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Behavior;
use crate::content::{parse_record, BuildError};
use crate::math::Vec3;
use crate::world::{Owner, SceneContext};

#[derive(Debug, Deserialize)]
struct RotationRecord {
    name: String,
    #[serde(default)]
    rotation: Vec3,
}

/// Adds a fixed rotation (radians per axis) to the owner every update.
#[derive(Debug, Clone)]
pub struct RotationBehavior {
    name: String,
    rotation: Vec3,
}

impl RotationBehavior {
    pub fn new(name: impl Into<String>, rotation: Vec3) -> Self {
        Self {
            name: name.into(),
            rotation,
        }
    }
}

impl Behavior for RotationBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, _dt_seconds: f32, owner: &mut Owner<'_>, _ctx: &mut SceneContext<'_>) {
        owner.core.transform.rotation += self.rotation;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: RotationRecord = parse_record("rotation", record)?;
    Ok(Box::new(RotationBehavior::new(record.name, record.rotation)))
}
