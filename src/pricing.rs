//! Plan pricing and the figures derived from the discount state

use serde::{Deserialize, Serialize};

/// Fixed pricing of the single plan on offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub full_price: f64,
    pub discounted_price: f64,
    pub currency: String,
    pub duration_days: u32,
    pub duration_label: String,
}

impl PricingPlan {
    pub const FULL_PRICE: f64 = 50.0;
    pub const DISCOUNTED_PRICE: f64 = 25.0;
    pub const DURATION_DAYS: u32 = 28;

    /// Derive the price figures for the given discount state.
    ///
    /// Pure; safe to call on every tick.
    pub fn snapshot(&self, discount_active: bool) -> PricingSnapshot {
        let current_price = if discount_active { self.discounted_price } else { self.full_price };
        let savings = self.full_price - current_price;
        let savings_percentage = if self.full_price > 0.0 {
            (savings / self.full_price * 100.0).round() as u32
        } else {
            0
        };

        PricingSnapshot {
            full_price: self.full_price,
            discounted_price: self.discounted_price,
            currency: self.currency.clone(),
            duration_days: self.duration_days,
            is_discount_active: discount_active,
            current_price,
            per_day_price: round_cents(current_price / self.duration_days.max(1) as f64),
            savings: round_cents(savings),
            savings_percentage,
        }
    }
}

impl Default for PricingPlan {
    fn default() -> Self {
        Self {
            full_price: Self::FULL_PRICE,
            discounted_price: Self::DISCOUNTED_PRICE,
            currency: "USD".to_string(),
            duration_days: Self::DURATION_DAYS,
            duration_label: "4 WEEK PLAN".to_string(),
        }
    }
}

/// Price figures derived from the plan and the discount state, never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub full_price: f64,
    pub discounted_price: f64,
    pub currency: String,
    pub duration_days: u32,
    pub is_discount_active: bool,
    pub current_price: f64,
    pub per_day_price: f64,
    pub savings: f64,
    pub savings_percentage: u32,
}

/// Round a currency amount to the nearest cent
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
