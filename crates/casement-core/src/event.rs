//! Input events forwarded to windows
//!
//! The host converts its platform events into [`InputEvent`] once per frame.
//! Key and mouse button types come straight from winit so a winit-driven host
//! can forward them without translation.

use winit::event::{ElementState, MouseButton};
use winit::keyboard::{Key, NamedKey};

/// Keyboard modifiers state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub command: bool,
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ModifierState {
    /// Create from winit Modifiers
    pub fn from_winit(mods: &winit::event::Modifiers) -> Self {
        let state = mods.state();
        Self {
            command: state.super_key(),
            control: state.control_key(),
            shift: state.shift_key(),
            alt: state.alt_key(),
        }
    }

    /// Check if no modifiers are pressed
    pub fn is_empty(&self) -> bool {
        !self.command && !self.control && !self.shift && !self.alt
    }
}

/// A raw input event delivered to the window manager
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key was pressed or released
    Key {
        key: Key,
        state: ElementState,
        modifiers: ModifierState,
    },
    /// A mouse button was pressed or released at a position
    MouseButton {
        button: MouseButton,
        state: ElementState,
        position: (f32, f32),
    },
    /// The pointer moved
    CursorMoved { position: (f32, f32) },
    /// Scroll wheel delta in lines
    Scroll { delta: (f32, f32) },
    /// Committed text input
    Text(String),
    /// Host-defined event that the core does not interpret
    Custom(String),
}

impl InputEvent {
    /// A key press without modifiers
    pub fn key_press(key: Key) -> Self {
        Self::Key {
            key,
            state: ElementState::Pressed,
            modifiers: ModifierState::default(),
        }
    }

    /// A named key press without modifiers
    pub fn named_press(key: NamedKey) -> Self {
        Self::key_press(Key::Named(key))
    }

    /// A single character key press without modifiers
    pub fn char_press(c: char) -> Self {
        Self::key_press(Key::Character(c.to_string().into()))
    }

    /// Escape key press
    pub fn escape() -> Self {
        Self::named_press(NamedKey::Escape)
    }

    /// Left mouse button press at a position
    pub fn click(x: f32, y: f32) -> Self {
        Self::MouseButton {
            button: MouseButton::Left,
            state: ElementState::Pressed,
            position: (x, y),
        }
    }

    /// Whether this is the Escape key going down
    pub fn is_escape_press(&self) -> bool {
        matches!(
            self,
            Self::Key {
                key: Key::Named(NamedKey::Escape),
                state: ElementState::Pressed,
                ..
            }
        )
    }

    /// Whether this event comes from a pointer device
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Self::MouseButton { .. } | Self::CursorMoved { .. } | Self::Scroll { .. }
        )
    }
}
