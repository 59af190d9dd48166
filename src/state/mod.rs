//! Navigation state
//!
//! The window stack is pure bookkeeping over the registry: it decides what
//! is shown and what accepts input, and hands destruction back to its host.

mod window_stack;

pub use window_stack::{StackHost, StackIssue, WindowStack};
