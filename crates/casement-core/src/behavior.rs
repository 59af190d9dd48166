//! Capability interfaces implemented by concrete windows
//!
//! The core never inspects what a window contains. A concrete window type
//! implements [`WindowBehavior`] for its visual hooks and event handling,
//! [`WindowClass`] so the manager and pool can construct it, and optionally
//! exposes [`Poolable`] / [`MessageReceiver`] through the `as_*` accessors.

use std::any::{Any, TypeId};

use crate::event::InputEvent;
use crate::surface::Surface;

/// Free-form key/value data carried by messages and creation arguments
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Arguments used when constructing or reusing a window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowArgs {
    /// Whether the window is modal (fixed for the lifetime of the instance)
    pub modal: bool,
    /// Subtype-specific parameters
    pub params: Payload,
}

impl WindowArgs {
    /// Non-modal window with no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Modal window with no parameters
    pub fn modal() -> Self {
        Self {
            modal: true,
            params: Payload::new(),
        }
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a string parameter
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

/// Concrete window type identity, used to key pool free lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKind {
    type_id: TypeId,
    name: &'static str,
}

impl WindowKind {
    /// Kind of the concrete window type `W`
    pub fn of<W: WindowClass>() -> Self {
        Self {
            type_id: TypeId::of::<W>(),
            name: W::class_name(),
        }
    }

    /// Human-readable class name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Lifecycle and input hooks of a concrete window
///
/// Visual hooks are called by [`crate::Window`] as it moves through its
/// state machine; they must not change the lifecycle state themselves.
pub trait WindowBehavior: Any {
    /// Build the window's visuals. Called the first time the window is shown.
    fn create(&mut self);

    /// Whether visuals exist and are still alive
    fn has_visuals(&self) -> bool;

    /// Make previously hidden visuals visible again
    fn show_visuals(&mut self) {}

    /// Hide visuals while keeping them allocated
    fn hide_visuals(&mut self) {}

    /// Release all visuals
    fn destroy_visuals(&mut self) {}

    /// Handle a raw input event. Returns `true` when consumed.
    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        false
    }

    /// "Back" request from the Escape key. Returns `true` when handled.
    fn handle_escape(&mut self) -> bool {
        false
    }

    fn on_show(&mut self) {}

    fn on_hide(&mut self) {}

    fn on_destroy(&mut self) {}

    /// Per-frame update while shown
    fn update(&mut self, _dt: f32) {}

    /// Draw while shown
    fn draw(&self, _surface: &mut dyn Surface) {}

    /// Pool hooks, if this window type supports them
    fn as_poolable(&mut self) -> Option<&mut dyn Poolable> {
        None
    }

    /// Message hook, if this window type receives inter-window messages
    fn as_receiver(&mut self) -> Option<&mut dyn MessageReceiver> {
        None
    }
}

/// Construction contract for a concrete window type
pub trait WindowClass: WindowBehavior + Sized {
    /// Build a fresh instance
    fn construct(args: &WindowArgs) -> Self;

    /// Class name used for generated ids and logging
    fn class_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Optional hooks for windows that are recycled through the pool
pub trait Poolable {
    /// Re-initialize subtype state for a new identity
    fn reset_for_reuse(&mut self, _args: &WindowArgs) -> anyhow::Result<()> {
        Ok(())
    }

    /// Drop subtype state that must not leak into the next user
    fn cleanup_for_pool(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Optional hook for windows that accept inter-window messages
pub trait MessageReceiver {
    fn receive_message(
        &mut self,
        sender: &str,
        message_type: &str,
        payload: &Payload,
    ) -> anyhow::Result<()>;
}
