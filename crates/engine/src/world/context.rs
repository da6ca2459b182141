use crate::app::InputSnapshot;
use crate::collision::CollisionManager;
use crate::message::MessageBus;

/// Shared services handed to every lifecycle hook of the tree.
pub struct SceneContext<'a> {
    pub bus: &'a mut MessageBus,
    pub collisions: &'a mut CollisionManager,
    pub input: &'a InputSnapshot,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        bus: &'a mut MessageBus,
        collisions: &'a mut CollisionManager,
        input: &'a InputSnapshot,
    ) -> Self {
        Self {
            bus,
            collisions,
            input,
        }
    }
}
