//! Momentum Funnel - a session-managed HTTP server for a sign-up funnel
//!
//! This library tracks one funnel session (email, name, product, checkout,
//! thank-you) and the time-limited promotional discount offered on the
//! product screen. The discount window is measured in wall-clock time and
//! persisted, so it keeps running across restarts.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod pricing;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{FunnelError, StorageError};
pub use pricing::{PricingPlan, PricingSnapshot};
pub use state::{AppState, TimerState};
pub use utils::signals::shutdown_signal;
