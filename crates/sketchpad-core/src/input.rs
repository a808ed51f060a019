//! Pointer and keyboard events forwarded by the host.
//!
//! Positions are in screen coordinates; the container converts them through
//! its camera before touching shapes.

use crate::graphic::ShapeId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    DoubleClick {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn left_down(x: f64, y: f64) -> Self {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    pub fn left_up(x: f64, y: f64) -> Self {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    pub fn right_down(x: f64, y: f64) -> Self {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Right,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    pub fn double_click(x: f64, y: f64) -> Self {
        PointerEvent::DoubleClick {
            position: Point::new(x, y),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::DoubleClick { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Keyboard event, keyed by `KeyboardEvent.key`-style names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed { key: String, modifiers: Modifiers },
    Released { key: String },
}

impl KeyEvent {
    pub fn pressed(key: &str) -> Self {
        KeyEvent::Pressed {
            key: key.to_string(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn pressed_with(key: &str, modifiers: Modifiers) -> Self {
        KeyEvent::Pressed {
            key: key.to_string(),
            modifiers,
        }
    }
}

/// In-progress pointer interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum Gesture {
    #[default]
    Idle,
    /// Dragging empty surface in read-only mode.
    Panning { last_screen: Point },
    /// Dragging a vertex handle of the active shape.
    DraggingVertex {
        id: ShapeId,
        index: usize,
        last_world: Point,
    },
    /// Dragging the path body of the active shape.
    DraggingPath { id: ShapeId, last_world: Point },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_position() {
        assert_eq!(PointerEvent::left_down(1.0, 2.0).position(), Point::new(1.0, 2.0));
        assert_eq!(
            PointerEvent::Scroll {
                position: Point::new(3.0, 4.0),
                delta: Vec2::new(0.0, 10.0)
            }
            .position(),
            Point::new(3.0, 4.0)
        );
    }

    #[test]
    fn test_command_modifier() {
        assert!(Modifiers::CTRL.command());
        assert!(
            Modifiers {
                meta: true,
                ..Default::default()
            }
            .command()
        );
        assert!(!Modifiers::default().command());
    }
}
