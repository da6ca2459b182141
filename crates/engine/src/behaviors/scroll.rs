use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Behavior;
use crate::content::{parse_record, BuildError};
use crate::math::Vec2;
use crate::message::{HandlerId, Message, MessageBus};
use crate::world::{Owner, SceneContext, SceneError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrollRecord {
    name: String,
    velocity: Vec2,
    min_position: Vec2,
    reset_position: Vec2,
    #[serde(default)]
    min_reset_y: Option<i32>,
    #[serde(default)]
    max_reset_y: Option<i32>,
    #[serde(default)]
    start_message: Option<String>,
    #[serde(default)]
    stop_message: Option<String>,
    #[serde(default)]
    reset_message: Option<String>,
}

/// Scrolls the owner at a constant velocity while started and wraps it back to
/// `reset_position` once it passes `min_position`.
#[derive(Debug, Clone)]
pub struct ScrollBehavior {
    name: String,
    velocity: Vec2,
    min_position: Vec2,
    reset_position: Vec2,
    reset_y_range: Option<(i32, i32)>,
    start_message: Option<String>,
    stop_message: Option<String>,
    reset_message: Option<String>,
    scrolling: bool,
    initial_position: Vec2,
}

impl ScrollBehavior {
    pub fn new(name: impl Into<String>, velocity: Vec2, min_position: Vec2, reset_position: Vec2) -> Self {
        Self {
            name: name.into(),
            velocity,
            min_position,
            reset_position,
            reset_y_range: None,
            start_message: None,
            stop_message: None,
            reset_message: None,
            scrolling: false,
            initial_position: Vec2::ZERO,
        }
    }

    /// Picks the reset height uniformly from `[min, max]` instead of `reset_position.y`.
    pub fn with_reset_y_range(mut self, min: i32, max: i32) -> Self {
        self.reset_y_range = Some((min.min(max), min.max(max)));
        self
    }

    pub fn with_messages(
        mut self,
        start: Option<String>,
        stop: Option<String>,
        reset: Option<String>,
    ) -> Self {
        self.start_message = start;
        self.stop_message = stop;
        self.reset_message = reset;
        self
    }

    pub fn start(&mut self) {
        self.scrolling = true;
    }

    pub fn stop(&mut self) {
        self.scrolling = false;
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    fn messages(&self) -> impl Iterator<Item = &str> {
        [&self.start_message, &self.stop_message, &self.reset_message]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    fn wrap(&self, owner: &mut Owner<'_>) {
        let position = &mut owner.core.transform.position;
        position.x = self.reset_position.x;
        position.y = match self.reset_y_range {
            Some((min, max)) => fastrand::i32(min..=max) as f32,
            None => self.reset_position.y,
        };
    }
}

impl Behavior for ScrollBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_ready(
        &mut self,
        handler: HandlerId,
        owner: &mut Owner<'_>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        for code in self.messages() {
            ctx.bus.subscribe(code, handler);
        }
        self.initial_position = owner.core.transform.position.to_vec2();
        Ok(())
    }

    fn update(&mut self, dt_seconds: f32, owner: &mut Owner<'_>, _ctx: &mut SceneContext<'_>) {
        if !self.scrolling {
            return;
        }
        owner.core.transform.position += (self.velocity * dt_seconds).to_vec3();
        let position = owner.core.transform.position;
        let past_x = position.x <= self.min_position.x;
        let past_y = self.reset_y_range.is_some() || position.y <= self.min_position.y;
        if past_x && past_y {
            self.wrap(owner);
        }
    }

    fn on_message(&mut self, message: &Message, owner: &mut Owner<'_>, _bus: &mut MessageBus) {
        let code = Some(message.code());
        if code == self.start_message.as_deref() {
            self.scrolling = true;
        } else if code == self.stop_message.as_deref() {
            self.scrolling = false;
        } else if code == self.reset_message.as_deref() {
            let position = &mut owner.core.transform.position;
            position.x = self.initial_position.x;
            position.y = self.initial_position.y;
        }
    }

    fn unload(&mut self, handler: HandlerId, bus: &mut MessageBus) {
        let codes: Vec<String> = self.messages().map(str::to_string).collect();
        for code in codes {
            bus.unsubscribe(&code, handler);
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
    let record: ScrollRecord = parse_record("scroll", record)?;
    let mut behavior = ScrollBehavior::new(
        record.name,
        record.velocity,
        record.min_position,
        record.reset_position,
    )
    .with_messages(record.start_message, record.stop_message, record.reset_message);
    if let (Some(min), Some(max)) = (record.min_reset_y, record.max_reset_y) {
        behavior = behavior.with_reset_y_range(min, max);
    }
    Ok(Box::new(behavior))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputSnapshot;
    use crate::collision::CollisionManager;
    use crate::math::{Transform, Vec3};
    use crate::message::Sender;
    use crate::world::{Scene, SceneId};

    struct Rig {
        bus: MessageBus,
        collisions: CollisionManager,
        input: InputSnapshot,
        scene: Scene,
    }

    impl Rig {
        fn new(behavior: ScrollBehavior) -> Self {
            let mut rig = Self {
                bus: MessageBus::new(),
                collisions: CollisionManager::new(),
                input: InputSnapshot::empty(),
                scene: Scene::new(SceneId(0)),
            };
            let mut pipe = rig.scene.create_entity("pipe").with_transform(Transform {
                position: Vec3::new(100.0, 40.0, 0.0),
                ..Transform::default()
            });
            pipe.add_behavior(Box::new(behavior));
            rig.scene.add_entity(pipe);
            let mut ctx = SceneContext::new(&mut rig.bus, &mut rig.collisions, &rig.input);
            rig.scene.load(&mut ctx).expect("load");
            rig.scene.update_ready(&mut ctx).expect("ready");
            rig
        }

        fn tick(&mut self, dt: f32) {
            let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.input);
            self.scene.update(dt, &mut ctx);
        }

        fn send(&mut self, code: &str) {
            self.bus
                .post(Message::high(code, Sender::Anonymous), &mut self.scene);
        }

        fn position(&self) -> Vec3 {
            self.scene
                .get_entity_by_name("pipe")
                .expect("pipe")
                .transform()
                .position
        }
    }

    fn pipe() -> ScrollBehavior {
        ScrollBehavior::new(
            "scroll",
            Vec2::new(-50.0, 0.0),
            Vec2::new(0.0, 1000.0),
            Vec2::new(200.0, 40.0),
        )
        .with_messages(
            Some("START".to_string()),
            Some("STOP".to_string()),
            Some("RESET".to_string()),
        )
    }

    #[test]
    fn scrolls_only_between_start_and_stop() {
        let mut rig = Rig::new(pipe());
        rig.tick(1.0);
        assert_eq!(rig.position().x, 100.0);

        rig.send("START");
        rig.tick(1.0);
        assert_eq!(rig.position().x, 50.0);

        rig.send("STOP");
        rig.tick(1.0);
        assert_eq!(rig.position().x, 50.0);
    }

    #[test]
    fn passing_min_position_wraps_to_reset_position() {
        let mut rig = Rig::new(pipe());
        rig.send("START");
        rig.tick(2.0);
        assert_eq!(rig.position(), Vec3::new(200.0, 40.0, 0.0));

        rig.send("RESET");
        assert_eq!(rig.position(), Vec3::new(100.0, 40.0, 0.0));
    }

    #[test]
    fn random_reset_height_stays_in_range() {
        let mut rig = Rig::new(pipe().with_reset_y_range(-30, 30));
        rig.send("START");
        for _ in 0..20 {
            rig.tick(2.0);
            let y = rig.position().y;
            assert!((-30.0..=30.0).contains(&y), "y = {y}");
            rig.send("RESET");
        }
    }
}
