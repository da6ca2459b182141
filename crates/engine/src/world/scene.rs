use super::{Entity, EntityId, EntityIdAllocator, SceneContext, SceneError};
use crate::collision::{CollidableInfo, CollisionPhase, CollisionSink};
use crate::components::Component;
use crate::message::{HandlerId, Message, MessageBus, MessageSink};
use crate::render::Renderer;

pub const ROOT_ENTITY_NAME: &str = "__ROOT__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub u32);

/// Entity tree under a synthetic root (id 0, named [`ROOT_ENTITY_NAME`]).
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    root: Entity,
    allocator: EntityIdAllocator,
}

impl Scene {
    pub fn new(id: SceneId) -> Self {
        let mut root = Entity::new(EntityId(0), ROOT_ENTITY_NAME);
        root.set_scene(Some(id));
        Self {
            id,
            root,
            allocator: EntityIdAllocator::starting_at(1),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn root(&self) -> &Entity {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Entity {
        &mut self.root
    }

    /// Creates a detached entity with an id unique within this scene.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        Entity::new(self.allocator.allocate(), name)
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.root.add_child(entity);
        id
    }

    /// Detaches the entity (at any depth) together with its subtree, unloading it if loaded.
    pub fn remove_entity(&mut self, id: EntityId, ctx: &mut SceneContext<'_>) -> Option<Entity> {
        self.root.remove_descendant(id, ctx)
    }

    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.root.get_entity_by_name(name)
    }

    pub fn get_entity_by_name_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.root.get_entity_by_name_mut(name)
    }

    pub fn get_entity_by_id(&self, id: EntityId) -> Option<&Entity> {
        self.root.get_entity_by_id(id)
    }

    pub fn get_entity_by_id_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.root.get_entity_by_id_mut(id)
    }

    pub fn get_component<T: Component>(&self, name: &str) -> Option<&T> {
        self.root.get_component::<T>(name)
    }

    pub fn get_component_mut<T: Component>(&mut self, name: &str) -> Option<&mut T> {
        self.root.get_component_mut::<T>(name)
    }

    /// Entities below the root.
    pub fn entity_count(&self) -> usize {
        self.root.subtree_len() - 1
    }

    pub fn load(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        self.root.load(None, ctx)
    }

    pub fn update_ready(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        self.root.update_ready(ctx)
    }

    pub fn update(&mut self, dt_seconds: f32, ctx: &mut SceneContext<'_>) {
        self.root.update(dt_seconds, None, ctx);
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.root.render(renderer);
    }

    pub fn unload(&mut self, ctx: &mut SceneContext<'_>) {
        self.root.unload(ctx);
    }
}

impl MessageSink for Scene {
    fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool {
        self.root.deliver(handler, message, bus)
    }
}

impl CollisionSink for Scene {
    fn on_collision(
        &mut self,
        phase: CollisionPhase,
        this: HandlerId,
        other: &CollidableInfo,
    ) -> bool {
        self.root.on_collision(phase, this, other)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::RefCell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    use super::*;
    use crate::app::InputSnapshot;
    use crate::behaviors::Behavior;
    use crate::collision::{Circle, CollisionManager, Shape};
    use crate::components::CollisionComponent;
    use crate::math::{Matrix4, Transform, Vec2, Vec3};
    use crate::message::Sender;
    use crate::render::{SpriteDraw, TextDraw};
    use crate::world::{EntityCore, Owner};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Tracker {
        name: String,
        log: Log,
        subscribe_to: Option<&'static str>,
    }

    impl Tracker {
        fn boxed(name: &str, log: &Log) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                log: Rc::clone(log),
                subscribe_to: None,
            })
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Component for Tracker {
        fn name(&self) -> &str {
            &self.name
        }

        fn load(
            &mut self,
            handler: HandlerId,
            _owner: &EntityCore,
            ctx: &mut SceneContext<'_>,
        ) -> Result<(), SceneError> {
            if let Some(code) = self.subscribe_to {
                ctx.bus.subscribe(code, handler);
            }
            self.record("load");
            Ok(())
        }

        fn update_ready(
            &mut self,
            _owner: &EntityCore,
            _ctx: &mut SceneContext<'_>,
        ) -> Result<(), SceneError> {
            self.record("ready");
            Ok(())
        }

        fn update(&mut self, _dt: f32, _owner: &EntityCore, _ctx: &mut SceneContext<'_>) {
            self.record("update");
        }

        fn render(&self, owner: &EntityCore, renderer: &mut dyn Renderer) {
            renderer.draw_sprite(
                &SpriteDraw {
                    material: &self.name,
                    width: 1.0,
                    height: 1.0,
                    origin: Vec3::ZERO,
                    uv: Default::default(),
                },
                owner.world_matrix(),
            );
        }

        fn on_message(&mut self, message: &Message, _owner: &EntityCore, _bus: &mut MessageBus) {
            self.record(&format!("message {}", message.code()));
        }

        fn unload(&mut self, handler: HandlerId, ctx: &mut SceneContext<'_>) {
            if let Some(code) = self.subscribe_to {
                ctx.bus.unsubscribe(code, handler);
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct TrackerBehavior {
        log: Log,
    }

    impl Behavior for TrackerBehavior {
        fn name(&self) -> &str {
            "tracker_behavior"
        }

        fn update_ready(
            &mut self,
            _handler: HandlerId,
            owner: &mut Owner<'_>,
            _ctx: &mut SceneContext<'_>,
        ) -> Result<(), SceneError> {
            let found = owner.component::<Tracker>("c").is_some();
            self.log
                .borrow_mut()
                .push(format!("behavior:ready sibling_found={found}"));
            Ok(())
        }

        fn update(&mut self, _dt: f32, owner: &mut Owner<'_>, _ctx: &mut SceneContext<'_>) {
            owner.core.transform.position.x += 1.0;
            self.log.borrow_mut().push("behavior:update".to_string());
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        sprites: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>, _world: &Matrix4) {
            self.sprites.push(sprite.material.to_string());
        }

        fn draw_text(&mut self, _text: &TextDraw<'_>, _world: &Matrix4) {}
    }

    struct Services {
        bus: MessageBus,
        collisions: CollisionManager,
        input: InputSnapshot,
    }

    impl Services {
        fn new() -> Self {
            Self {
                bus: MessageBus::new(),
                collisions: CollisionManager::new(),
                input: InputSnapshot::empty(),
            }
        }

        fn ctx(&mut self) -> SceneContext<'_> {
            SceneContext::new(&mut self.bus, &mut self.collisions, &self.input)
        }
    }

    fn chain(scene: &mut Scene) -> (EntityId, EntityId, EntityId) {
        let mut a = scene.create_entity("A");
        let mut b = scene.create_entity("B");
        let c = scene.create_entity("C");
        let ids = (a.id(), b.id(), c.id());
        b.add_child(c);
        a.add_child(b);
        scene.add_entity(a);
        ids
    }

    #[test]
    fn root_is_reserved_and_ids_are_unique() {
        let mut scene = Scene::new(SceneId(1));
        assert_eq!(scene.root().name(), ROOT_ENTITY_NAME);
        assert_eq!(scene.root().id(), EntityId(0));
        let (a, b, c) = chain(&mut scene);
        assert!(a < b && b < c);
        assert_eq!(scene.entity_count(), 3);
        let c_entity = scene.get_entity_by_id(c).expect("C");
        assert_eq!(c_entity.parent(), Some(b));
        assert_eq!(c_entity.scene(), Some(SceneId(1)));
    }

    #[test]
    fn removing_a_middle_node_detaches_its_subtree() {
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let (a, b, _) = chain(&mut scene);
        let a_entity = scene.get_entity_by_id_mut(a).expect("A");
        assert!(a_entity.get_entity_by_name("C").is_some());

        let detached = a_entity
            .remove_child(b, &mut services.ctx())
            .expect("B is a child of A");
        assert!(a_entity.get_entity_by_name("C").is_none());
        assert_eq!(detached.parent(), None);
        assert_eq!(detached.scene(), None);
        assert_eq!(detached.children()[0].scene(), None);
        assert!(detached.get_entity_by_name("C").is_some());
    }

    #[test]
    fn remove_entity_reaches_any_depth() {
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let (_, _, c) = chain(&mut scene);
        let removed = scene.remove_entity(c, &mut services.ctx()).expect("C");
        assert_eq!(removed.name(), "C");
        assert!(scene.get_entity_by_name("C").is_none());
        assert!(scene.remove_entity(c, &mut services.ctx()).is_none());
    }

    #[test]
    fn removing_a_loaded_subtree_unloads_it() {
        let log: Log = Rc::default();
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let mut parent = scene.create_entity("parent");
        let mut tracker = Tracker::boxed("c", &log);
        tracker.subscribe_to = Some("PING");
        parent.add_component(tracker);
        let mut child = scene.create_entity("child");
        child.add_component(Box::new(CollisionComponent::new(
            "childCollision",
            Shape::Circle(Circle::new(Vec2::ZERO, 2.0)),
        )));
        parent.add_child(child);
        let parent_id = scene.add_entity(parent);
        scene.load(&mut services.ctx()).expect("load");
        assert_eq!(services.collisions.len(), 1);
        assert_eq!(services.bus.subscriber_count("PING"), 1);

        let removed = scene
            .remove_entity(parent_id, &mut services.ctx())
            .expect("parent");

        assert!(!removed.is_loaded());
        assert!(!removed.children()[0].is_loaded());
        assert!(services.collisions.is_empty());
        assert_eq!(services.bus.subscriber_count("PING"), 0);
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn lookup_by_name_returns_first_depth_first_match() {
        let mut scene = Scene::new(SceneId(1));
        let mut first = scene.create_entity("first");
        let dup_deep = scene.create_entity("dup");
        let deep_id = dup_deep.id();
        first.add_child(dup_deep);
        scene.add_entity(first);
        let dup_shallow = scene.create_entity("dup");
        scene.add_entity(dup_shallow);

        assert_eq!(scene.get_entity_by_name("dup").map(Entity::id), Some(deep_id));
    }

    #[test]
    fn world_matrix_composes_parent_and_local() {
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let mut parent = scene.create_entity("parent").with_transform(Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, FRAC_PI_2),
            ..Transform::default()
        });
        let child = scene.create_entity("child").with_transform(Transform {
            position: Vec3::new(5.0, 0.0, 0.0),
            ..Transform::default()
        });
        parent.add_child(child);
        scene.add_entity(parent);

        scene.update(0.016, &mut services.ctx());

        let parent = scene.get_entity_by_name("parent").expect("parent");
        assert_eq!(parent.world_matrix(), parent.core().local_matrix());
        let child = scene.get_entity_by_name("child").expect("child");
        let expected = parent
            .world_matrix()
            .multiply(&child.transform().local_matrix());
        assert_eq!(child.world_matrix(), &expected);
        let position = child.world_position();
        assert!((position.x - 10.0).abs() < 1e-4, "{position:?}");
        assert!((position.y - 5.0).abs() < 1e-4, "{position:?}");
    }

    #[test]
    fn lifecycle_hooks_run_in_tree_order() {
        let log: Log = Rc::default();
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let mut parent = scene.create_entity("parent");
        parent.add_component(Tracker::boxed("c", &log));
        parent.add_behavior(Box::new(TrackerBehavior {
            log: Rc::clone(&log),
        }));
        let mut child = scene.create_entity("child");
        child.add_component(Tracker::boxed("child_c", &log));
        parent.add_child(child);
        scene.add_entity(parent);

        scene.load(&mut services.ctx()).expect("load");
        scene.load(&mut services.ctx()).expect("second load is a no-op");
        scene.update_ready(&mut services.ctx()).expect("ready");
        scene.update(0.016, &mut services.ctx());

        assert_eq!(
            *log.borrow(),
            vec![
                "c:load",
                "child_c:load",
                "c:ready",
                "behavior:ready sibling_found=true",
                "child_c:ready",
                "c:update",
                "behavior:update",
                "child_c:update",
            ]
        );
        let parent = scene.get_entity_by_name("parent").expect("parent");
        assert_eq!(parent.transform().position.x, 1.0);
        assert!(parent.components()[0].handler().is_some());
        assert!(parent.behaviors()[0].handler().is_some());
    }

    #[test]
    fn messages_reach_components_through_the_scene_sink() {
        let log: Log = Rc::default();
        let mut services = Services::new();
        let mut scene = Scene::new(SceneId(1));
        let mut entity = scene.create_entity("listener");
        let mut tracker = Tracker::boxed("c", &log);
        tracker.subscribe_to = Some("PING");
        entity.add_component(tracker);
        scene.add_entity(entity);
        scene.load(&mut services.ctx()).expect("load");

        services
            .bus
            .post(Message::high("PING", Sender::Anonymous), &mut scene);

        assert_eq!(log.borrow().last().map(String::as_str), Some("c:message PING"));
    }

    #[test]
    fn invisible_entities_skip_their_subtree_when_rendering() {
        let log: Log = Rc::default();
        let mut scene = Scene::new(SceneId(1));
        let mut parent = scene.create_entity("parent");
        parent.add_component(Tracker::boxed("parent_sprite", &log));
        let mut hidden = scene.create_entity("hidden");
        hidden.add_component(Tracker::boxed("hidden_sprite", &log));
        let mut below_hidden = scene.create_entity("below");
        below_hidden.add_component(Tracker::boxed("below_sprite", &log));
        hidden.add_child(below_hidden);
        hidden.set_visible(false);
        parent.add_child(hidden);
        scene.add_entity(parent);

        let mut renderer = RecordingRenderer::default();
        scene.render(&mut renderer);
        assert_eq!(renderer.sprites, vec!["parent_sprite"]);
    }

    #[test]
    fn typed_component_lookup_checks_name_and_type() {
        let log: Log = Rc::default();
        let mut scene = Scene::new(SceneId(1));
        let mut entity = scene.create_entity("e");
        entity.add_component(Tracker::boxed("tracker", &log));
        scene.add_entity(entity);

        assert!(scene.get_component::<Tracker>("tracker").is_some());
        assert!(scene.get_component::<Tracker>("missing").is_none());
        assert!(scene
            .get_component::<crate::components::SpriteComponent>("tracker")
            .is_none());
        assert!(scene.root().get_component_by_name("tracker").is_some());
    }
}
