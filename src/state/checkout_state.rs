//! Checkout form data and the completed purchase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::validation;

/// Card details entered on the checkout screen.
///
/// Kept in memory only; never persisted and never echoed back in full.
#[derive(Clone, Default, Deserialize)]
pub struct PaymentInfo {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub name_on_card: String,
}

impl PaymentInfo {
    /// Validate every field, returning the first failure. Cards expiring
    /// before the month of `now` are rejected.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), &'static str> {
        validation::validate_card_number(&self.card_number)?;
        validation::validate_expiry_date(&self.expiry_date, now)?;
        validation::validate_cvv(&self.cvv)?;
        validation::validate_name_on_card(&self.name_on_card)?;
        Ok(())
    }

    /// Copy with the card number stripped of separators
    pub fn normalized(&self) -> Self {
        Self {
            card_number: validation::normalize_card_number(&self.card_number),
            expiry_date: self.expiry_date.trim().to_string(),
            cvv: self.cvv.clone(),
            name_on_card: self.name_on_card.trim().to_string(),
        }
    }

    pub fn card_last_four(&self) -> Option<String> {
        let digits = validation::normalize_card_number(&self.card_number);
        let count = digits.chars().count();
        if count < 4 {
            return None;
        }
        Some(digits.chars().skip(count - 4).collect())
    }
}

impl std::fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("card_last_four", &self.card_last_four())
            .field("expiry_date", &self.expiry_date)
            .finish_non_exhaustive()
    }
}

/// Record of a completed purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetails {
    pub name: String,
    pub email: String,
    pub amount: f64,
    pub promo_code: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutState {
    pub payment_info: Option<PaymentInfo>,
    pub purchase_details: Option<PurchaseDetails>,
}

impl CheckoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.purchase_details.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
