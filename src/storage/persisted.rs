//! Session fields saved to the store and restored at boot

use tracing::{info, warn};

use super::KeyValueStore;
use crate::{error::StorageError, state::PurchaseDetails};

/// Storage keys
pub mod keys {
    pub const USER_EMAIL: &str = "@momentum/user_email";
    pub const USER_NAME: &str = "@momentum/user_name";
    pub const PROMO_CODE: &str = "@momentum/promo_code";
    pub const TIMER_START: &str = "@momentum/timer_start";
    /// Written on first observed expiry; never read back into timer state.
    pub const TIMER_EXPIRED: &str = "@momentum/timer_expired";
    pub const PURCHASE_DETAILS: &str = "@momentum/purchase_details";

    pub const ALL: [&str; 6] = [
        USER_EMAIL,
        USER_NAME,
        PROMO_CODE,
        TIMER_START,
        TIMER_EXPIRED,
        PURCHASE_DETAILS,
    ];
}

/// Everything restored at boot. Missing or unreadable fields are defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedData {
    pub email: String,
    pub name: String,
    pub promo_code: String,
    pub timer_start: Option<i64>,
    pub purchase_details: Option<PurchaseDetails>,
}

/// Load the persisted session.
///
/// A store failure yields all defaults; an unparsable field yields the default
/// for that field only.
pub fn load_persisted(store: &dyn KeyValueStore) -> PersistedData {
    match read_all(store) {
        Ok(data) => data,
        Err(e) => {
            warn!("Error loading persisted data, starting fresh: {}", e);
            PersistedData::default()
        }
    }
}

fn read_all(store: &dyn KeyValueStore) -> Result<PersistedData, StorageError> {
    let email = store.get(keys::USER_EMAIL)?.unwrap_or_default();
    let name = store.get(keys::USER_NAME)?.unwrap_or_default();
    let promo_code = store.get(keys::PROMO_CODE)?.unwrap_or_default();

    let timer_start = store
        .get(keys::TIMER_START)?
        .and_then(|raw| match raw.trim().parse::<i64>() {
            Ok(start) => Some(start),
            Err(e) => {
                warn!("Ignoring unparsable timer start {:?}: {}", raw, e);
                None
            }
        });

    let purchase_details = store
        .get(keys::PURCHASE_DETAILS)?
        .and_then(|raw| match serde_json::from_str::<PurchaseDetails>(&raw) {
            Ok(details) => Some(details),
            Err(e) => {
                warn!("Ignoring unparsable purchase details: {}", e);
                None
            }
        });

    Ok(PersistedData {
        email,
        name,
        promo_code,
        timer_start,
        purchase_details,
    })
}

/// Remove every persisted key. Failure is logged and otherwise ignored.
pub fn clear_persisted(store: &dyn KeyValueStore) {
    match store.remove_many(&keys::ALL) {
        Ok(()) => info!("All persisted data cleared"),
        Err(e) => warn!("Error clearing persisted data: {}", e),
    }
}
