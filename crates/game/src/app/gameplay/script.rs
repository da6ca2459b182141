use engine::app::InputSource;
use engine::math::Vec2;
use engine::InputSnapshot;

/// Centre of the demo level's start button.
const START_BUTTON_CENTER: Vec2 = Vec2::new(144.0, 328.0);

/// Scripted player: clicks start, flaps on a fixed rhythm for a while, then lets
/// the bird fall and finally asks the loop to quit.
#[derive(Debug, Clone)]
pub(crate) struct FlapScript {
    start_frame: u64,
    flap_interval: u64,
    stop_flapping_at: u64,
    quit_at: Option<u64>,
}

impl FlapScript {
    pub(crate) fn new(start_frame: u64, flap_interval: u64, stop_flapping_at: u64) -> Self {
        Self {
            start_frame,
            flap_interval: flap_interval.max(2),
            stop_flapping_at,
            quit_at: None,
        }
    }

    pub(crate) fn demo() -> Self {
        Self::new(5, 30, 300).with_quit_at(480)
    }

    pub(crate) fn with_quit_at(mut self, frame: u64) -> Self {
        self.quit_at = Some(frame);
        self
    }

    /// Frame offset inside the current flap cycle, once the script has started.
    fn phase(&self, frame: u64) -> Option<u64> {
        if frame < self.start_frame || frame >= self.stop_flapping_at {
            return None;
        }
        Some((frame - self.start_frame) % self.flap_interval)
    }
}

impl InputSource for FlapScript {
    fn poll(&mut self, frame_index: u64) -> InputSnapshot {
        let phase = self.phase(frame_index);
        InputSnapshot::empty()
            .with_quit_requested(self.quit_at.is_some_and(|quit| frame_index >= quit))
            .with_cursor_position(Some(START_BUTTON_CENTER))
            .with_left_pressed(phase == Some(0))
            .with_left_released(phase == Some(1))
    }
}
