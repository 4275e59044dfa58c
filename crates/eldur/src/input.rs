//! Keyboard and mouse input state.
//!
//! The engine does not poll devices. A windowing or test harness feeds
//! presses and releases through [`App::input_mut`](crate::app::App::input_mut);
//! systems query the result through [`Context::input`](crate::context::Context).
//!
//! "Just" states last for one frame: they are cleared after the frame's
//! systems have run.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub fn any_pressed(&self, inputs: impl IntoIterator<Item = T>) -> bool {
        inputs.into_iter().any(|input| self.pressed(input))
    }

    /// Everything currently held.
    pub fn get_pressed(&self) -> impl Iterator<Item = &T> {
        self.pressed.iter()
    }

    /// Record a press. Holding an already-pressed input is not a new press.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Record a release.
    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Release everything (e.g. on focus loss).
    pub fn release_all(&mut self) {
        self.just_released.extend(self.pressed.drain());
    }

    /// Clear per-frame state. Called after each frame's systems.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical key identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
    KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Mouse cursor position in window coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_pressed_and_just_pressed() {
        let mut keys = Input::new();
        keys.press(KeyCode::Space);
        assert!(keys.pressed(KeyCode::Space));
        assert!(keys.just_pressed(KeyCode::Space));

        keys.clear_just();
        assert!(keys.pressed(KeyCode::Space));
        assert!(!keys.just_pressed(KeyCode::Space));
    }

    #[test]
    fn holding_is_not_a_new_press() {
        let mut keys = Input::new();
        keys.press(KeyCode::KeyW);
        keys.clear_just();
        keys.press(KeyCode::KeyW);
        assert!(!keys.just_pressed(KeyCode::KeyW));
    }

    #[test]
    fn release_only_counts_held_inputs() {
        let mut buttons = Input::new();
        buttons.release(MouseButton::Left);
        assert!(!buttons.just_released(MouseButton::Left));

        buttons.press(MouseButton::Left);
        buttons.release(MouseButton::Left);
        assert!(buttons.just_released(MouseButton::Left));
        assert!(!buttons.pressed(MouseButton::Left));
    }

    #[test]
    fn release_all_marks_everything_released() {
        let mut keys = Input::new();
        keys.press(KeyCode::ArrowLeft);
        keys.press(KeyCode::ShiftLeft);
        keys.release_all();
        assert!(keys.just_released(KeyCode::ArrowLeft));
        assert!(keys.just_released(KeyCode::ShiftLeft));
        assert_eq!(keys.get_pressed().count(), 0);
        assert!(!keys.any_pressed([KeyCode::ArrowLeft, KeyCode::ShiftLeft]));
    }
}
