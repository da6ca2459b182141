mod context;
mod entity;
mod error;
mod level;
mod level_manager;
mod scene;

pub use context::SceneContext;
pub use entity::{Entity, EntityCore, EntityId, EntityIdAllocator, Owner};
pub use error::{LevelError, SceneError};
pub use level::{Level, LevelState};
pub use level_manager::{LevelManager, GAME_READY};
pub use scene::{Scene, SceneId, ROOT_ENTITY_NAME};
