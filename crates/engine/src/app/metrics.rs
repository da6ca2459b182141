use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LockResult, RwLock};
use std::time::Duration;

use tracing::warn;

use super::Runtime;

/// Runtime state sampled at the end of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeGauges {
    /// Normal-priority deliveries still waiting on the bus.
    pub queued_messages: usize,
    pub active_collisions: usize,
    pub entity_count: usize,
}

impl RuntimeGauges {
    pub fn sample(runtime: &Runtime) -> Self {
        Self {
            queued_messages: runtime.bus().queued_len(),
            active_collisions: runtime.collisions().active_pair_count(),
            entity_count: runtime
                .levels()
                .active_level()
                .map_or(0, |level| level.scene().entity_count()),
        }
    }
}

/// Rates over one metrics interval plus the gauges of its last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Largest bus backlog seen during the interval.
    pub peak_queued_messages: usize,
    pub runtime: RuntimeGauges,
}

#[derive(Debug, Default)]
struct SharedMetrics {
    latest: RwLock<LoopMetricsSnapshot>,
    publications: AtomicU64,
    poison_reported: AtomicBool,
}

impl SharedMetrics {
    fn recover<T>(&self, result: LockResult<T>, operation: &'static str) -> T {
        result.unwrap_or_else(|poisoned| {
            if !self.poison_reported.swap(true, Ordering::Relaxed) {
                warn!(operation, "metrics_lock_poisoned");
            }
            poisoned.into_inner()
        })
    }
}

/// Cloneable reader of the latest loop metrics; the loop publishes into it once per interval.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    shared: Arc<SharedMetrics>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.shared.recover(self.shared.latest.read(), "read")
    }

    /// Number of intervals published so far.
    pub fn publications(&self) -> u64 {
        self.shared.publications.load(Ordering::Relaxed)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.shared.recover(self.shared.latest.write(), "write") = snapshot;
        self.shared.publications.fetch_add(1, Ordering::Relaxed);
    }
}

/// Intervals are measured on the loop clock, as time since the loop started.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    interval_start: Duration,
    frames: u32,
    ticks: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
    peak_queued: usize,
    last_gauges: RuntimeGauges,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, start: Duration) -> Self {
        Self {
            interval,
            interval_start: start,
            frames: 0,
            ticks: 0,
            frame_time_total: Duration::ZERO,
            worst_frame: Duration::ZERO,
            peak_queued: 0,
            last_gauges: RuntimeGauges::default(),
        }
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, gauges: RuntimeGauges) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_total = self.frame_time_total.saturating_add(frame_dt);
        self.worst_frame = self.worst_frame.max(frame_dt);
        self.peak_queued = self.peak_queued.max(gauges.queued_messages);
        self.last_gauges = gauges;
    }

    /// Closes the interval once it has lasted `interval`, starting the next one at `now`.
    pub(crate) fn take_if_due(&mut self, now: Duration) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_sub(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            peak_queued_messages: self.peak_queued,
            runtime: self.last_gauges,
        };
        *self = Self::new(self.interval, now);
        Some(snapshot)
    }
}
