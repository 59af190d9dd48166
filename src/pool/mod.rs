//! Window instance recycling

pub mod window_pool;

pub use window_pool::{PoolReturn, PoolStats, RejectReason, WindowPool};
