//! Casement - window management core
//!
//! Lifecycle, navigation, focus, messaging and pooling for the windows of a
//! frame-driven application. The window entity and its contracts live in
//! `casement-core`; configuration lives in `casement-config`. This crate
//! composes them:
//! - [`WindowManager`] - the orchestrator the host loop calls every frame
//! - [`WindowStack`] - back navigation and modal occlusion
//! - [`FocusManager`] - input focus with a modal lock
//! - [`EventRouter`] - input routing and prioritized inter-window messages
//! - [`WindowPool`] - per-class recycling of destroyed windows

pub mod managers;
pub mod pool;
pub mod state;

pub use managers::{
    EscapeHandler, EventRouter, FocusChange, FocusManager, MessagePriority, RouterStats,
    ToolkitHook, WindowManager, WindowMessage,
};
pub use pool::{PoolReturn, PoolStats, RejectReason, WindowPool};
pub use state::{StackHost, StackIssue, WindowStack};

pub use casement_config::Config;
pub use casement_core::{
    Color, InputEvent, MessageReceiver, Payload, Poolable, Rect, Surface, Window, WindowArgs,
    WindowBehavior, WindowClass, WindowError, WindowHandle, WindowKind, WindowRegistry, WindowState,
};
