//! Manager modules for window coordination
//!
//! `WindowManager` is the entry point; it composes the focus manager and
//! event router with the stack and pool.

pub mod event_router;
pub mod focus_manager;
mod window_manager;

pub use event_router::{EventRouter, GlobalListener, MessagePriority, RouterStats, WindowMessage};
pub use focus_manager::{FocusChange, FocusListener, FocusManager};
pub use window_manager::{EscapeHandler, ToolkitHook, WindowManager};
