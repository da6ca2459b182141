use std::env;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::message::DEFAULT_NORMAL_MESSAGES_PER_UPDATE;
use crate::render::Renderer;
use crate::world::LevelError;
use crate::StartupError;

use super::metrics::{MetricsAccumulator, RuntimeGauges};
use super::{InputSnapshot, InputSource, MetricsHandle, Runtime};

pub const SLOW_FRAME_ENV_VAR: &str = "SKYHOP_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    /// Budget for the runtime's bus; see `MessageBus::with_budget`.
    pub normal_messages_per_update: usize,
    /// `None` runs until the input source requests quit.
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            normal_messages_per_update: DEFAULT_NORMAL_MESSAGES_PER_UPDATE,
            max_frames: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("no level is active; load one before starting the loop")]
    NoActiveLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub dropped_backlog: Duration,
    pub quit_requested: bool,
}

/// Time source of the frame loop. `now` is measured from an arbitrary fixed origin.
pub(crate) trait FrameClock {
    fn now(&mut self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

struct SystemClock {
    origin: Instant,
}

impl FrameClock for SystemClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Drives `runtime` until quit or `max_frames`. The runtime is left loaded; call
/// `Runtime::shutdown` when done with it.
pub fn run_headless(
    config: &LoopConfig,
    runtime: &mut Runtime,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
) -> Result<LoopSummary, AppError> {
    run_headless_with_metrics(config, runtime, input, renderer, &MetricsHandle::default())
}

pub fn run_headless_with_metrics(
    config: &LoopConfig,
    runtime: &mut Runtime,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
    metrics_handle: &MetricsHandle,
) -> Result<LoopSummary, AppError> {
    let mut clock = SystemClock {
        origin: Instant::now(),
    };
    run_loop(config, runtime, input, renderer, metrics_handle, &mut clock)
}

pub(crate) fn run_loop(
    config: &LoopConfig,
    runtime: &mut Runtime,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
    metrics_handle: &MetricsHandle,
    clock: &mut dyn FrameClock,
) -> Result<LoopSummary, AppError> {
    if runtime.levels().active_level().is_none() {
        return Err(AppError::NoActiveLevel);
    }

    let timing = LoopTiming::from_config(config, slow_frame_override());
    let tick_seconds = timing.fixed_dt.as_secs_f32();
    info!(
        tick_ms = timing.fixed_dt.as_secs_f64() * 1000.0,
        max_frame_delta_ms = timing.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = timing.max_ticks_per_frame,
        metrics_interval_ms = timing.metrics_interval.as_millis() as u64,
        slow_frame_delay_ms = timing.slow_frame_delay.as_millis() as u64,
        render_fps_cap = ?timing.render_fps_cap,
        max_frames = ?config.max_frames,
        "loop_config"
    );

    let mut summary = LoopSummary::default();
    let mut backlog = Duration::ZERO;
    let mut last_frame_at = clock.now();
    let mut last_present_at = last_frame_at;
    let mut metrics = MetricsAccumulator::new(timing.metrics_interval, last_frame_at);
    let mut carried_input: Option<InputSnapshot> = None;

    while config.max_frames.map_or(true, |max| summary.frames < max) {
        let frame_input = input
            .poll(summary.frames)
            .with_carried_edges(carried_input.take());
        if frame_input.quit_requested() {
            info!(reason = "input", frame = summary.frames, "shutdown_requested");
            summary.quit_requested = true;
            break;
        }

        if !timing.slow_frame_delay.is_zero() {
            // Debug perturbation only; render pacing happens below.
            clock.sleep(timing.slow_frame_delay);
        }

        let now = clock.now();
        let frame_dt = now.saturating_sub(last_frame_at);
        last_frame_at = now;

        let plan = timing.plan(backlog.saturating_add(frame_dt.min(timing.max_frame_delta)));
        backlog = plan.carry;
        if plan.ticks == 0 {
            carried_input = Some(frame_input);
        }
        let mut tick_input = frame_input;
        for _ in 0..plan.ticks {
            runtime.tick(tick_seconds, &tick_input);
            tick_input = tick_input.without_edges();
            metrics.record_tick();
        }
        summary.ticks = summary.ticks.saturating_add(u64::from(plan.ticks));

        if !plan.dropped.is_zero() {
            summary.dropped_backlog = summary.dropped_backlog.saturating_add(plan.dropped);
            warn!(
                dropped_backlog_ms = plan.dropped.as_millis() as u64,
                max_ticks_per_frame = timing.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        if timing.render_frame_target.is_some() {
            let pause = timing.pacing_sleep(clock.now().saturating_sub(last_present_at));
            if !pause.is_zero() {
                clock.sleep(pause);
            }
            last_present_at = clock.now();
        }

        runtime.render(renderer);
        metrics.record_frame(frame_dt, RuntimeGauges::sample(runtime));
        summary.frames = summary.frames.saturating_add(1);

        if let Some(snapshot) = metrics.take_if_due(now) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_ms = snapshot.worst_frame_ms,
                peak_queued_messages = snapshot.peak_queued_messages,
                active_collisions = snapshot.runtime.active_collisions,
                entity_count = snapshot.runtime.entity_count,
                "loop_metrics"
            );
        }
    }

    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        quit_requested = summary.quit_requested,
        "loop_finished"
    );
    Ok(summary)
}

/// Ticks to run this frame; `carry` stays in the accumulator, `dropped` is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks: u32,
    carry: Duration,
    dropped: Duration,
}

/// `LoopConfig` with zero or out-of-range values replaced by working ones.
#[derive(Debug, Clone, Copy)]
struct LoopTiming {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    metrics_interval: Duration,
    slow_frame_delay: Duration,
    render_fps_cap: Option<u32>,
    render_frame_target: Option<Duration>,
}

impl LoopTiming {
    fn from_config(config: &LoopConfig, slow_frame_override_ms: Option<u64>) -> Self {
        let non_zero = |value: Duration, fallback: Duration| {
            if value.is_zero() {
                fallback
            } else {
                value
            }
        };
        let render_fps_cap = config.max_render_fps.filter(|fps| *fps > 0);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1))),
            max_frame_delta: non_zero(config.max_frame_delta, Duration::from_millis(250)),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            metrics_interval: non_zero(config.metrics_log_interval, Duration::from_secs(1)),
            slow_frame_delay: Duration::from_millis(
                slow_frame_override_ms.unwrap_or(config.simulated_slow_frame_ms),
            ),
            render_fps_cap,
            render_frame_target: render_fps_cap
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
        }
    }

    /// A backlog still holding a whole tick after the cap is dropped entirely.
    fn plan(&self, backlog: Duration) -> StepPlan {
        let whole_ticks = backlog.as_nanos() / self.fixed_dt.as_nanos().max(1);
        if whole_ticks > u128::from(self.max_ticks_per_frame) {
            return StepPlan {
                ticks: self.max_ticks_per_frame,
                carry: Duration::ZERO,
                dropped: backlog.saturating_sub(self.fixed_dt * self.max_ticks_per_frame),
            };
        }
        // Bounded by max_ticks_per_frame above.
        let ticks = whole_ticks as u32;
        StepPlan {
            ticks,
            carry: backlog.saturating_sub(self.fixed_dt * ticks),
            dropped: Duration::ZERO,
        }
    }

    fn pacing_sleep(&self, since_last_present: Duration) -> Duration {
        self.render_frame_target
            .map_or(Duration::ZERO, |target| target.saturating_sub(since_last_present))
    }
}

/// Milliseconds from [`SLOW_FRAME_ENV_VAR`]; unset or unparsable values fall back to the config.
fn slow_frame_override() -> Option<u64> {
    let raw = env::var(SLOW_FRAME_ENV_VAR).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(err) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, value = %raw, error = %err, "invalid_env_override");
            None
        }
    }
}
