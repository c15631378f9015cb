//! Utility functions module
//!
//! Shutdown signal handling plus the small pure helpers used by the funnel
//! (input validation and countdown formatting).

pub mod format;
pub mod signals;
pub mod validation;

// Re-export main functions
pub use format::format_remaining;
pub use signals::shutdown_signal;
