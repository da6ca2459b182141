use std::any::Any;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::Behavior;
use crate::app::MOUSE_DOWN;
use crate::collision::{collision_entry_code, CollisionData};
use crate::components::AnimatedSpriteComponent;
use crate::content::{parse_record, BuildError};
use crate::math::Vec2;
use crate::message::{HandlerId, Message, MessageBus, Sender};
use crate::world::{Owner, SceneContext, SceneError};

pub const PLAYER_DIED: &str = "PLAYER_DIED";

const GRAVITY: Vec2 = Vec2::new(0.0, 920.0);
const MAX_FALL_SPEED: f32 = 400.0;
const CEILING_Y: f32 = -13.0;
const FLAP_VELOCITY: f32 = -280.0;
const FALLING_SPEED: f32 = 220.0;
const RISE_TURN_DEG_PER_SEC: f32 = 600.0;
const RISE_TILT_DEG: f32 = -20.0;
const FALL_TURN_DEG_PER_SEC: f32 = 480.0;
const FALL_TILT_DEG: f32 = 90.0;

fn default_acceleration() -> Vec2 {
    GRAVITY
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRecord {
    name: String,
    #[serde(default = "default_acceleration")]
    acceleration: Vec2,
    animated_sprite_name: String,
    player_collision_component: String,
    ground_collision_component: String,
}

/// Flappy-style player: gravity, flap on `MOUSE_DOWN`, death on touching the ground.
#[derive(Debug, Clone)]
pub struct PlayerBehavior {
    name: String,
    acceleration: Vec2,
    velocity: Vec2,
    alive: bool,
    animated_sprite_name: String,
    player_collision: String,
    ground_collision: String,
    handler: Option<HandlerId>,
}

impl PlayerBehavior {
    pub fn new(
        name: impl Into<String>,
        animated_sprite_name: impl Into<String>,
        player_collision: impl Into<String>,
        ground_collision: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            acceleration: GRAVITY,
            velocity: Vec2::ZERO,
            alive: true,
            animated_sprite_name: animated_sprite_name.into(),
            player_collision: player_collision.into(),
            ground_collision: ground_collision.into(),
            handler: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn flap(&mut self) {
        if self.alive {
            self.velocity.y = FLAP_VELOCITY;
        }
    }

    fn is_falling(&self) -> bool {
        self.velocity.y > FALLING_SPEED
    }

    fn die(&mut self) {
        self.alive = false;
        self.acceleration.y = 0.0;
        self.velocity.y = 0.0;
    }
}

impl Behavior for PlayerBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_ready(
        &mut self,
        handler: HandlerId,
        owner: &mut Owner<'_>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        if owner
            .component::<AnimatedSpriteComponent>(&self.animated_sprite_name)
            .is_none()
        {
            return Err(SceneError::MissingSiblingComponent {
                behavior: self.name.clone(),
                component: self.animated_sprite_name.clone(),
            });
        }
        self.handler = Some(handler);
        ctx.bus.subscribe(MOUSE_DOWN, handler);
        ctx.bus
            .subscribe(collision_entry_code(&self.player_collision), handler);
        Ok(())
    }

    fn update(&mut self, dt_seconds: f32, owner: &mut Owner<'_>, _ctx: &mut SceneContext<'_>) {
        if !self.alive {
            return;
        }
        self.velocity += self.acceleration * dt_seconds;
        if self.velocity.y > MAX_FALL_SPEED {
            self.velocity.y = MAX_FALL_SPEED;
        }

        let transform = &mut owner.core.transform;
        if transform.position.y < CEILING_Y {
            transform.position.y = CEILING_Y;
            self.velocity.y = 0.0;
        }
        transform.position += (self.velocity * dt_seconds).to_vec3();

        if self.velocity.y < 0.0 {
            transform.rotation.z -= RISE_TURN_DEG_PER_SEC.to_radians() * dt_seconds;
            transform.rotation.z = transform.rotation.z.max(RISE_TILT_DEG.to_radians());
        }
        if self.is_falling() {
            transform.rotation.z += FALL_TURN_DEG_PER_SEC.to_radians() * dt_seconds;
            transform.rotation.z = transform.rotation.z.min(FALL_TILT_DEG.to_radians());
        }

        let flapping = !self.is_falling();
        if let Some(sprite) = owner.component_mut::<AnimatedSpriteComponent>(&self.animated_sprite_name) {
            if !flapping {
                sprite.stop();
            } else if !sprite.is_playing() {
                sprite.play();
            }
        }
    }

    fn on_message(&mut self, message: &Message, owner: &mut Owner<'_>, bus: &mut MessageBus) {
        if message.code() == MOUSE_DOWN {
            self.flap();
            return;
        }
        if message.code() != collision_entry_code(&self.player_collision) {
            return;
        }
        let Some(data) = message.context::<CollisionData>() else {
            return;
        };
        let hit_ground = data.a.name == self.ground_collision || data.b.name == self.ground_collision;
        if hit_ground && self.alive {
            self.die();
            if let Some(sprite) = owner.component_mut::<AnimatedSpriteComponent>(&self.animated_sprite_name) {
                sprite.stop();
            }
            info!(player = %self.name, position = ?owner.core.transform.position, "player_died");
            bus.publish(Message::new(PLAYER_DIED, Sender::from(self.handler)));
        }
    }

    fn unload(&mut self, handler: HandlerId, bus: &mut MessageBus) {
        bus.unsubscribe(MOUSE_DOWN, handler);
        bus.unsubscribe(&collision_entry_code(&self.player_collision), handler);
        self.handler = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: PlayerRecord = parse_record("player", record)?;
    let mut behavior = PlayerBehavior::new(
        record.name,
        record.animated_sprite_name,
        record.player_collision_component,
        record.ground_collision_component,
    );
    behavior.acceleration = record.acceleration;
    Ok(Box::new(behavior))
}
