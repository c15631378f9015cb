//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod discount_ticker;

// Re-export main functions
pub use discount_ticker::discount_ticker_task;
