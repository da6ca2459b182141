use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Behavior;
use crate::app::InputAction;
use crate::content::{parse_record, BuildError};
use crate::world::{Owner, SceneContext};

fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct KeyboardMovementRecord {
    name: String,
    #[serde(default = "default_speed")]
    speed: f32,
}

/// Moves the owner by `speed` units per update for each held direction.
#[derive(Debug, Clone)]
pub struct KeyboardMovementBehavior {
    name: String,
    pub speed: f32,
}

impl KeyboardMovementBehavior {
    pub fn new(name: impl Into<String>, speed: f32) -> Self {
        Self {
            name: name.into(),
            speed,
        }
    }
}

impl Behavior for KeyboardMovementBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, _dt_seconds: f32, owner: &mut Owner<'_>, ctx: &mut SceneContext<'_>) {
        let position = &mut owner.core.transform.position;
        if ctx.input.is_down(InputAction::MoveLeft) {
            position.x -= self.speed;
        }
        if ctx.input.is_down(InputAction::MoveRight) {
            position.x += self.speed;
        }
        if ctx.input.is_down(InputAction::MoveUp) {
            position.y -= self.speed;
        }
        if ctx.input.is_down(InputAction::MoveDown) {
            position.y += self.speed;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: KeyboardMovementRecord = parse_record("keyboardMovement", record)?;
    Ok(Box::new(KeyboardMovementBehavior::new(record.name, record.speed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputSnapshot;
    use crate::collision::CollisionManager;
    use crate::math::Vec3;
    use crate::message::MessageBus;
    use crate::world::{Scene, SceneId};

    #[test]
    fn held_directions_move_the_owner() {
        let mut bus = MessageBus::new();
        let mut collisions = CollisionManager::new();
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_action_down(InputAction::MoveUp, true);
        let mut scene = Scene::new(SceneId(0));
        let mut entity = scene.create_entity("mover");
        entity.add_behavior(Box::new(KeyboardMovementBehavior::new("move", 2.5)));
        scene.add_entity(entity);
        let mut ctx = SceneContext::new(&mut bus, &mut collisions, &input);

        scene.update(0.016, &mut ctx);
        scene.update(0.016, &mut ctx);

        let mover = scene.get_entity_by_name("mover").expect("mover");
        assert_eq!(mover.transform().position, Vec3::new(5.0, -5.0, 0.0));
    }
}
