use tracing::warn;

use super::{SceneContext, SceneError, SceneId};
use crate::behaviors::{Behavior, BehaviorSlot};
use crate::collision::{CollidableInfo, CollisionPhase};
use crate::components::{Component, ComponentSlot};
use crate::math::{Matrix4, Transform, Vec3};
use crate::message::{HandlerId, Message, MessageBus};
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Per-entity state that components and behaviors may observe.
#[derive(Debug, Clone)]
pub struct EntityCore {
    id: EntityId,
    name: String,
    parent: Option<EntityId>,
    scene: Option<SceneId>,
    pub transform: Transform,
    local_matrix: Matrix4,
    world_matrix: Matrix4,
    loaded: bool,
    ready: bool,
    visible: bool,
}

impl EntityCore {
    fn new(id: EntityId, name: String) -> Self {
        Self {
            id,
            name,
            parent: None,
            scene: None,
            transform: Transform::default(),
            local_matrix: Matrix4::identity(),
            world_matrix: Matrix4::identity(),
            loaded: false,
            ready: false,
            visible: true,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn local_matrix(&self) -> &Matrix4 {
        &self.local_matrix
    }

    pub fn world_matrix(&self) -> &Matrix4 {
        &self.world_matrix
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.translation_part()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn recompute_matrices(&mut self, parent_world: Option<&Matrix4>) {
        self.local_matrix = self.transform.local_matrix();
        self.world_matrix = match parent_world {
            Some(parent) => parent.multiply(&self.local_matrix),
            None => self.local_matrix,
        };
    }
}

/// A behavior's view of its owning entity: the entity state plus its components.
pub struct Owner<'a> {
    pub core: &'a mut EntityCore,
    components: &'a mut [ComponentSlot],
}

impl<'a> Owner<'a> {
    pub fn new(core: &'a mut EntityCore, components: &'a mut [ComponentSlot]) -> Self {
        Self { core, components }
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|slot| slot.name() == name)
    }

    pub fn component<T: Component>(&self, name: &str) -> Option<&T> {
        self.components
            .iter()
            .filter(|slot| slot.name() == name)
            .find_map(ComponentSlot::downcast_ref::<T>)
    }

    pub fn component_mut<T: Component>(&mut self, name: &str) -> Option<&mut T> {
        self.components
            .iter_mut()
            .filter(|slot| slot.name() == name)
            .find_map(ComponentSlot::downcast_mut::<T>)
    }
}

/// A scene-tree node. Owns its children, components and behaviors exclusively;
/// the parent is known only by id.
#[derive(Debug)]
pub struct Entity {
    core: EntityCore,
    components: Vec<ComponentSlot>,
    behaviors: Vec<BehaviorSlot>,
    children: Vec<Entity>,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            core: EntityCore::new(id, name.into()),
            components: Vec::new(),
            behaviors: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.core.transform = transform;
        self
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    pub fn transform(&self) -> &Transform {
        &self.core.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.core.transform
    }

    pub fn world_matrix(&self) -> &Matrix4 {
        &self.core.world_matrix
    }

    pub fn world_position(&self) -> Vec3 {
        self.core.world_position()
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.core.parent
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.core.scene
    }

    pub fn is_loaded(&self) -> bool {
        self.core.loaded
    }

    pub fn is_visible(&self) -> bool {
        self.core.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.core.visible = visible;
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    pub fn behaviors(&self) -> &[BehaviorSlot] {
        &self.behaviors
    }

    pub fn add_child(&mut self, mut child: Entity) {
        child.core.parent = Some(self.core.id);
        child.set_scene(self.core.scene);
        self.children.push(child);
    }

    /// Detaches a direct child. A loaded subtree is unloaded first, so its
    /// subscriptions and collidables go with it; the result has no parent or scene.
    pub fn remove_child(&mut self, id: EntityId, ctx: &mut SceneContext<'_>) -> Option<Entity> {
        let index = self.children.iter().position(|child| child.id() == id)?;
        let mut child = self.children.remove(index);
        if child.core.loaded {
            child.unload(ctx);
        }
        child.core.parent = None;
        child.set_scene(None);
        Some(child)
    }

    /// Detaches an entity anywhere below this one.
    pub fn remove_descendant(&mut self, id: EntityId, ctx: &mut SceneContext<'_>) -> Option<Entity> {
        if let Some(child) = self.remove_child(id, ctx) {
            return Some(child);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_descendant(id, ctx))
    }

    pub(crate) fn set_scene(&mut self, scene: Option<SceneId>) {
        self.core.scene = scene;
        for child in &mut self.children {
            child.set_scene(scene);
        }
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        if self.core.loaded {
            warn!(entity = %self.core.name, component = component.name(), "component_added_after_load");
        }
        self.components.push(ComponentSlot::new(component));
    }

    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
        if self.core.loaded {
            warn!(entity = %self.core.name, behavior = behavior.name(), "behavior_added_after_load");
        }
        self.behaviors.push(BehaviorSlot::new(behavior));
    }

    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        if self.core.name == name {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.get_entity_by_name(name))
    }

    pub fn get_entity_by_name_mut(&mut self, name: &str) -> Option<&mut Entity> {
        if self.core.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.get_entity_by_name_mut(name))
    }

    pub fn get_entity_by_id(&self, id: EntityId) -> Option<&Entity> {
        if self.core.id == id {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.get_entity_by_id(id))
    }

    pub fn get_entity_by_id_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if self.core.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.get_entity_by_id_mut(id))
    }

    pub fn get_component_by_name(&self, name: &str) -> Option<&dyn Component> {
        if let Some(slot) = self.components.iter().find(|slot| slot.name() == name) {
            return Some(slot.component());
        }
        self.children
            .iter()
            .find_map(|child| child.get_component_by_name(name))
    }

    pub fn get_behavior_by_name(&self, name: &str) -> Option<&dyn Behavior> {
        if let Some(slot) = self.behaviors.iter().find(|slot| slot.name() == name) {
            return Some(slot.behavior());
        }
        self.children
            .iter()
            .find_map(|child| child.get_behavior_by_name(name))
    }

    /// First component named `name` of type `T`, searched depth-first.
    pub fn get_component<T: Component>(&self, name: &str) -> Option<&T> {
        self.components
            .iter()
            .filter(|slot| slot.name() == name)
            .find_map(ComponentSlot::downcast_ref::<T>)
            .or_else(|| {
                self.children
                    .iter()
                    .find_map(|child| child.get_component::<T>(name))
            })
    }

    pub fn get_component_mut<T: Component>(&mut self, name: &str) -> Option<&mut T> {
        let Entity {
            components,
            children,
            ..
        } = self;
        if let Some(found) = components
            .iter_mut()
            .filter(|slot| slot.name() == name)
            .find_map(ComponentSlot::downcast_mut::<T>)
        {
            return Some(found);
        }
        children
            .iter_mut()
            .find_map(|child| child.get_component_mut::<T>(name))
    }

    pub fn get_behavior<T: Behavior>(&self, name: &str) -> Option<&T> {
        self.behaviors
            .iter()
            .filter(|slot| slot.name() == name)
            .find_map(BehaviorSlot::downcast_ref::<T>)
            .or_else(|| {
                self.children
                    .iter()
                    .find_map(|child| child.get_behavior::<T>(name))
            })
    }

    /// Assigns handler ids and loads components, then children. Runs once.
    pub fn load(
        &mut self,
        parent_world: Option<&Matrix4>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        if self.core.loaded {
            return Ok(());
        }
        self.core.loaded = true;
        self.core.recompute_matrices(parent_world);

        for slot in &mut self.components {
            let handler = ctx.bus.allocate_handler();
            slot.set_handler(handler);
            slot.component_mut().load(handler, &self.core, ctx)?;
        }
        for slot in &mut self.behaviors {
            slot.set_handler(ctx.bus.allocate_handler());
        }

        let world = self.core.world_matrix;
        for child in &mut self.children {
            child.load(Some(&world), ctx)?;
        }
        Ok(())
    }

    /// Components, then behaviors, then children. Runs once, after the whole tree loaded.
    pub fn update_ready(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        if self.core.ready {
            return Ok(());
        }
        self.core.ready = true;

        for slot in &mut self.components {
            slot.component_mut().update_ready(&self.core, ctx)?;
        }
        let Entity {
            core,
            components,
            behaviors,
            children,
        } = self;
        for slot in behaviors.iter_mut() {
            let Some(handler) = slot.handler() else {
                continue;
            };
            let mut owner = Owner::new(core, components);
            slot.behavior_mut()
                .update_ready(handler, &mut owner, ctx)?;
        }
        for child in children.iter_mut() {
            child.update_ready(ctx)?;
        }
        Ok(())
    }

    /// Recomputes matrices, then updates components, behaviors and children in that order.
    pub fn update(
        &mut self,
        dt_seconds: f32,
        parent_world: Option<&Matrix4>,
        ctx: &mut SceneContext<'_>,
    ) {
        let Entity {
            core,
            components,
            behaviors,
            children,
        } = self;
        core.recompute_matrices(parent_world);

        for slot in components.iter_mut() {
            slot.component_mut().update(dt_seconds, core, ctx);
        }
        for slot in behaviors.iter_mut() {
            let mut owner = Owner::new(core, components);
            slot.behavior_mut().update(dt_seconds, &mut owner, ctx);
        }

        let world = core.world_matrix;
        for child in children.iter_mut() {
            child.update(dt_seconds, Some(&world), ctx);
        }
    }

    /// Skips invisible entities together with their subtree.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if !self.core.visible {
            return;
        }
        for slot in &self.components {
            slot.component().render(&self.core, renderer);
        }
        for child in &self.children {
            child.render(renderer);
        }
    }

    pub fn unload(&mut self, ctx: &mut SceneContext<'_>) {
        for slot in &mut self.components {
            if let Some(handler) = slot.handler() {
                slot.component_mut().unload(handler, ctx);
            }
        }
        for slot in &mut self.behaviors {
            if let Some(handler) = slot.handler() {
                slot.behavior_mut().unload(handler, ctx.bus);
            }
        }
        for child in &mut self.children {
            child.unload(ctx);
        }
        self.core.loaded = false;
        self.core.ready = false;
    }

    /// Routes a message to the component or behavior registered under `handler`.
    pub fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool {
        let Entity {
            core,
            components,
            behaviors,
            children,
        } = self;
        if let Some(slot) = components
            .iter_mut()
            .find(|slot| slot.handler() == Some(handler))
        {
            slot.component_mut().on_message(message, core, bus);
            return true;
        }
        if let Some(slot) = behaviors
            .iter_mut()
            .find(|slot| slot.handler() == Some(handler))
        {
            let mut owner = Owner::new(core, components);
            slot.behavior_mut().on_message(message, &mut owner, bus);
            return true;
        }
        children
            .iter_mut()
            .any(|child| child.deliver(handler, message, bus))
    }

    pub fn on_collision(
        &mut self,
        phase: CollisionPhase,
        this: HandlerId,
        other: &CollidableInfo,
    ) -> bool {
        if let Some(slot) = self
            .components
            .iter_mut()
            .find(|slot| slot.handler() == Some(this))
        {
            slot.component_mut().on_collision(phase, other);
            return true;
        }
        self.children
            .iter_mut()
            .any(|child| child.on_collision(phase, this, other))
    }

    /// Number of entities in this subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Entity::subtree_len).sum::<usize>()
    }
}
