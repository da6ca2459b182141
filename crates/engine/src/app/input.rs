use crate::math::Vec2;
use crate::message::{Message, Sender};

pub const MOUSE_DOWN: &str = "MOUSE_DOWN";
pub const MOUSE_UP: &str = "MOUSE_UP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Quit => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
}

/// Payload of `MOUSE_DOWN`/`MOUSE_UP` messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseContext {
    pub position: Vec2,
    pub button: MouseButton,
}

/// Input state for one frame; edges are true only on the frame they happen.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position: Option<Vec2>,
    left_pressed: bool,
    left_released: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.actions.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }

    pub fn left_pressed(&self) -> bool {
        self.left_pressed
    }

    pub fn left_released(&self) -> bool {
        self.left_released
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position(mut self, cursor_position: Option<Vec2>) -> Self {
        self.cursor_position = cursor_position;
        self
    }

    pub fn with_left_pressed(mut self, left_pressed: bool) -> Self {
        self.left_pressed = left_pressed;
        self
    }

    pub fn with_left_released(mut self, left_released: bool) -> Self {
        self.left_released = left_released;
        self
    }

    pub fn without_edges(mut self) -> Self {
        self.left_pressed = false;
        self.left_released = false;
        self
    }

    /// Keeps edges from a frame that ran no tick so they are not lost.
    pub(crate) fn with_carried_edges(mut self, carried: Option<InputSnapshot>) -> Self {
        if let Some(carried) = carried {
            self.left_pressed |= carried.left_pressed;
            self.left_released |= carried.left_released;
            self.quit_requested |= carried.quit_requested;
        }
        self
    }

    /// Normal-priority mouse messages for this frame's button edges.
    pub fn mouse_messages(&self) -> Vec<Message> {
        let position = self.cursor_position.unwrap_or(Vec2::ZERO);
        let context = MouseContext {
            position,
            button: MouseButton::Left,
        };
        let mut messages = Vec::new();
        if self.left_pressed {
            messages.push(Message::new(MOUSE_DOWN, Sender::System("input")).with_context(context));
        }
        if self.left_released {
            messages.push(Message::new(MOUSE_UP, Sender::System("input")).with_context(context));
        }
        messages
    }
}

/// Device polling boundary; called once per frame by the loop.
pub trait InputSource {
    fn poll(&mut self, frame_index: u64) -> InputSnapshot;
}
