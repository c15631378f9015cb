//! State management module
//!
//! This module contains the funnel session state and its management logic.

pub mod app_state;
pub mod checkout_state;
pub mod funnel_step;
pub mod timer_state;
pub mod user_state;

// Re-export main types
pub use app_state::AppState;
pub use checkout_state::{CheckoutState, PaymentInfo, PurchaseDetails};
pub use funnel_step::FunnelStep;
pub use timer_state::{TimerPhase, TimerState, DEFAULT_DISCOUNT_DURATION_MS};
pub use user_state::UserProfile;
