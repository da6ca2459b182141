pub mod app;
pub mod assets;
pub mod behaviors;
pub mod collision;
pub mod components;
pub mod content;
pub mod math;
pub mod message;
mod paths;
pub mod render;
pub mod world;

pub use app::{
    run_headless, run_headless_with_metrics, AppError, InputAction, InputSnapshot, InputSource,
    LoopConfig, LoopMetricsSnapshot, LoopSummary, MetricsHandle, Runtime, RuntimeGauges,
    SLOW_FRAME_ENV_VAR,
};
pub use content::{BuildError, Builders, LevelData};
pub use message::{HandlerId, Message, MessageBus, MessagePriority, Sender};
pub use paths::{resolve_app_paths, AppPaths, StartupError, ROOT_ENV_VAR};
pub use world::{Entity, EntityId, Level, LevelError, LevelManager, LevelState, Scene, SceneError};
