//! Shared utilities

pub mod cancel;
pub mod config;
pub mod context;
pub mod process;

pub use cancel::{CancelToken, Cancelled};
pub use config::Config;
pub use context::GlobalContext;
