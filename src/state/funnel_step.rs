//! Which screen of the funnel a session belongs on

use serde::{Deserialize, Serialize};

use super::{CheckoutState, TimerState, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelStep {
    Email,
    Name,
    Product,
    Checkout,
    ThankYou,
}

impl FunnelStep {
    /// Derive the step from session state
    pub fn of(user: &UserProfile, timer: &TimerState, checkout: &CheckoutState) -> Self {
        if user.email.is_empty() {
            FunnelStep::Email
        } else if user.name.is_empty() {
            FunnelStep::Name
        } else if checkout.is_complete() {
            FunnelStep::ThankYou
        } else if timer.start_time().is_some() {
            FunnelStep::Checkout
        } else {
            FunnelStep::Product
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PurchaseDetails;

    #[test]
    fn steps_follow_the_session() {
        let mut user = UserProfile::new();
        let mut timer = TimerState::default();
        let mut checkout = CheckoutState::new();
        assert_eq!(FunnelStep::of(&user, &timer, &checkout), FunnelStep::Email);

        user.email = "alex@example.com".into();
        assert_eq!(FunnelStep::of(&user, &timer, &checkout), FunnelStep::Name);

        user.name = "Alex".into();
        assert_eq!(FunnelStep::of(&user, &timer, &checkout), FunnelStep::Product);

        timer.start(0);
        assert_eq!(FunnelStep::of(&user, &timer, &checkout), FunnelStep::Checkout);

        checkout.purchase_details = Some(PurchaseDetails {
            name: user.name.clone(),
            email: user.email.clone(),
            amount: 25.0,
            promo_code: String::new(),
            timestamp: 0,
        });
        assert_eq!(FunnelStep::of(&user, &timer, &checkout), FunnelStep::ThankYou);
    }
}
