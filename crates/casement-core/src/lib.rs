//! Casement Core - the window entity and its contracts
//!
//! This crate provides:
//! - The [`Window`] lifecycle state machine (`Created -> Shown <-> Hidden -> Destroyed`)
//! - Capability traits concrete windows implement ([`WindowBehavior`], [`WindowClass`],
//!   optional [`Poolable`] and [`MessageReceiver`])
//! - [`WindowRegistry`], a generational arena of live windows
//! - Input event and drawing surface types shared with the host

pub mod behavior;
pub mod error;
pub mod event;
pub mod mock;
pub mod registry;
pub mod surface;
pub mod window;

pub use behavior::{MessageReceiver, Payload, Poolable, WindowArgs, WindowBehavior, WindowClass, WindowKind};
pub use error::WindowError;
pub use event::{InputEvent, ModifierState};
pub use registry::{WindowHandle, WindowRegistry};
pub use surface::{Color, Rect, Surface};
pub use window::{EventListener, Window, WindowState};

// Re-exported so hosts can build events without depending on winit directly
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::{Key, NamedKey};
