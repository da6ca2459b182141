mod manager;
mod shape;

pub use manager::{
    collision_entry_code, collision_exit_code, Collidable, CollidableInfo, CollisionData,
    CollisionManager, CollisionPhase, CollisionSink, COLLISION_ENTRY_PREFIX, COLLISION_EXIT_PREFIX,
};
pub use shape::{Circle, Rectangle, Shape, ShapeRecord};
