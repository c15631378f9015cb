//! User profile collected by the first funnel screens

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Email, name and the promo code shown back to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub promo_code: String,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the display promo code from the current name.
    ///
    /// Does nothing while the name is empty.
    pub fn generate_promo_code(&mut self, now: DateTime<Utc>) -> Option<&str> {
        if self.name.is_empty() {
            return None;
        }
        self.promo_code = promo_code_for(&self.name, now);
        Some(&self.promo_code)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// `name_monYY`, e.g. `alex_nov25`
pub fn promo_code_for(name: &str, now: DateTime<Utc>) -> String {
    let month = MONTHS[now.month0() as usize];
    format!("{}_{}{:02}", name.to_lowercase(), month, now.year().rem_euclid(100))
}
