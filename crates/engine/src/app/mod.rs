mod input;
mod loop_runner;
mod metrics;
mod runtime;

pub use input::{
    InputAction, InputSnapshot, InputSource, MouseButton, MouseContext, MOUSE_DOWN, MOUSE_UP,
};
pub use loop_runner::{
    run_headless, run_headless_with_metrics, AppError, LoopConfig, LoopSummary, SLOW_FRAME_ENV_VAR,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle, RuntimeGauges};
pub use runtime::Runtime;
