//! Pointer and keyboard events.

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
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Whether a press starts a pan gesture rather than a selection.
pub fn is_pan_gesture(button: MouseButton, modifiers: Modifiers) -> bool {
    match button {
        MouseButton::Middle | MouseButton::Right => true,
        MouseButton::Left => modifiers.command(),
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Wheel {
        position: Point,
        delta: Vec2,
    },
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Character(char),
}

/// Key press with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Editor command bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DeleteSelection,
    Undo,
    Redo,
    ResetView,
    ClearSelection,
}

impl KeyEvent {
    /// Map the key press to a command, if bound.
    pub fn command(&self) -> Option<Command> {
        let m = self.modifiers;
        match self.key {
            Key::Delete | Key::Backspace => Some(Command::DeleteSelection),
            Key::Escape => Some(Command::ClearSelection),
            Key::Character(c) => match c.to_ascii_lowercase() {
                'z' if m.command() && m.shift => Some(Command::Redo),
                'z' if m.command() => Some(Command::Undo),
                'y' if m.command() => Some(Command::Redo),
                '0' if !m.command() && !m.alt => Some(Command::ResetView),
                _ => None,
            },
        }
    }
}
