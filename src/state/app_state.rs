//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{CheckoutState, FunnelStep, PaymentInfo, PurchaseDetails, TimerState, UserProfile};
use crate::{
    clock::Clock,
    error::{FunnelError, Result},
    pricing::{PricingPlan, PricingSnapshot},
    storage::{clear_persisted, keys, load_persisted, KeyValueStore},
    utils::validation,
};

/// Owner of the single funnel session: user profile, discount timer and
/// checkout, plus the collaborators they need (clock and store).
pub struct AppState {
    /// Discount countdown
    pub timer_state: Arc<Mutex<TimerState>>,
    /// Email, name, promo code
    pub user: Arc<Mutex<UserProfile>>,
    pub checkout: Arc<Mutex<CheckoutState>>,
    pub plan: PricingPlan,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Latest derived pricing, for subscribers
    pub pricing_tx: watch::Sender<PricingSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _pricing_rx: watch::Receiver<PricingSnapshot>,
}

impl AppState {
    /// Create a new AppState with an unstarted timer and empty session
    pub fn new(
        port: u16,
        host: String,
        discount_duration_ms: i64,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let plan = PricingPlan::default();
        let timer = TimerState::new(discount_duration_ms);
        let (pricing_tx, pricing_rx) = watch::channel(timer.price_snapshot(&plan));

        Self {
            timer_state: Arc::new(Mutex::new(timer)),
            user: Arc::new(Mutex::new(UserProfile::new())),
            checkout: Arc::new(Mutex::new(CheckoutState::new())),
            plan,
            clock,
            store,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            pricing_tx,
            _pricing_rx: pricing_rx,
        }
    }

    /// Rehydrate the session from storage.
    ///
    /// Timer expiry is recomputed from the stored start and the current time.
    pub fn restore_from_storage(&self) -> Result<()> {
        let data = load_persisted(self.store.as_ref());
        let now = self.clock.now_millis();

        {
            let mut user = lock(&self.user, "user profile")?;
            if !data.email.is_empty() {
                user.email = data.email;
            }
            if !data.name.is_empty() {
                user.name = data.name;
            }
            if !data.promo_code.is_empty() {
                user.promo_code = data.promo_code;
            }
        }

        let timer = {
            let mut timer = lock(&self.timer_state, "timer state")?;
            if let Some(start) = data.timer_start {
                timer.load_from_persisted_start(start, now);
                info!(
                    "Restored discount window started at {}: {:?}, {}ms remaining",
                    start,
                    timer.phase(),
                    timer.remaining_ms()
                );
            }
            timer.clone()
        };

        if let Some(details) = data.purchase_details {
            info!("Restored completed purchase for {}", details.email);
            lock(&self.checkout, "checkout state")?.purchase_details = Some(details);
        }

        self.publish(&timer);
        Ok(())
    }

    /// Set the user's email after validating it
    pub fn set_email(&self, email: &str) -> Result<UserProfile> {
        let email = email.trim();
        validation::validate_email(email).map_err(|m| FunnelError::Validation(m.to_string()))?;

        let user = {
            let mut user = lock(&self.user, "user profile")?;
            user.email = email.to_string();
            user.clone()
        };
        info!("Email set");

        self.persist(keys::USER_EMAIL, email);
        self.record_action("set-email");
        Ok(user)
    }

    /// Set the user's name and derive the promo code from it
    pub fn set_name(&self, name: &str) -> Result<UserProfile> {
        let name = name.trim();
        validation::validate_name(name).map_err(|m| FunnelError::Validation(m.to_string()))?;

        let now = self.clock.now_utc();
        let user = {
            let mut user = lock(&self.user, "user profile")?;
            user.name = name.to_string();
            user.generate_promo_code(now);
            user.clone()
        };
        info!("Name set, promo code {}", user.promo_code);

        self.persist(keys::USER_NAME, &user.name);
        self.persist(keys::PROMO_CODE, &user.promo_code);
        self.record_action("set-name");
        Ok(user)
    }

    /// Open the discount window. Calling again keeps the original start.
    pub fn start_timer(&self) -> Result<TimerState> {
        let now = self.clock.now_millis();
        let started = lock(&self.timer_state, "timer state")?.start(now);

        if started {
            info!("Discount window started at {}", now);
            self.persist(keys::TIMER_START, &now.to_string());
            self.record_action("start-timer");
        }

        let timer = self.tick_timer()?;
        if !started {
            debug!("Discount window already started at {:?}", timer.start_time());
        }
        Ok(timer)
    }

    /// Recompute the countdown at the current time
    pub fn tick_timer(&self) -> Result<TimerState> {
        let now = self.clock.now_millis();
        let (newly_expired, timer) = {
            let mut timer = lock(&self.timer_state, "timer state")?;
            let newly_expired = timer.tick(now);
            (newly_expired, timer.clone())
        };

        if newly_expired {
            info!("Discount window expired");
            self.persist(keys::TIMER_EXPIRED, "true");
        }

        self.publish(&timer);
        Ok(timer)
    }

    /// Current price figures, evaluated at the current time
    pub fn pricing_snapshot(&self) -> Result<PricingSnapshot> {
        let timer = self.tick_timer()?;
        Ok(timer.price_snapshot(&self.plan))
    }

    /// Record a purchase at the price in effect right now
    pub fn complete_purchase(&self, payment: PaymentInfo) -> Result<PurchaseDetails> {
        payment
            .validate(self.clock.now_utc())
            .map_err(|m| FunnelError::Validation(m.to_string()))?;

        let user = self.get_user()?;
        if user.email.is_empty() || user.name.is_empty() {
            return Err(FunnelError::MissingPrerequisite(
                "Email and name are required before checkout".to_string(),
            ));
        }

        let pricing = self.pricing_snapshot()?;
        let details = PurchaseDetails {
            name: user.name,
            email: user.email,
            amount: pricing.current_price,
            promo_code: user.promo_code,
            timestamp: self.clock.now_millis(),
        };

        {
            let mut checkout = lock(&self.checkout, "checkout state")?;
            checkout.payment_info = Some(payment.normalized());
            checkout.purchase_details = Some(details.clone());
        }
        info!(
            "Purchase completed: {:.2} {} (discount active: {})",
            details.amount, pricing.currency, pricing.is_discount_active
        );

        match serde_json::to_string(&details) {
            Ok(json) => self.persist(keys::PURCHASE_DETAILS, &json),
            Err(e) => warn!("Failed to serialize purchase details: {}", e),
        }
        self.record_action("complete-purchase");
        Ok(details)
    }

    /// Clear the whole session and its persisted copy.
    ///
    /// Development aid; not part of the normal funnel.
    pub fn reset_session(&self) -> Result<()> {
        let timer = {
            let mut timer = lock(&self.timer_state, "timer state")?;
            timer.reset();
            timer.clone()
        };
        lock(&self.user, "user profile")?.reset();
        lock(&self.checkout, "checkout state")?.reset();

        clear_persisted(self.store.as_ref());
        info!("Session reset");
        self.record_action("reset");
        self.publish(&timer);
        Ok(())
    }

    /// Get current timer state without re-evaluating it
    pub fn get_timer_state(&self) -> Result<TimerState> {
        lock(&self.timer_state, "timer state").map(|t| t.clone())
    }

    pub fn get_user(&self) -> Result<UserProfile> {
        lock(&self.user, "user profile").map(|u| u.clone())
    }

    pub fn get_checkout(&self) -> Result<CheckoutState> {
        lock(&self.checkout, "checkout state").map(|c| c.clone())
    }

    pub fn current_step(&self) -> Result<FunnelStep> {
        let user = self.get_user()?;
        let timer = self.get_timer_state()?;
        let checkout = self.get_checkout()?;
        Ok(FunnelStep::of(&user, &timer, &checkout))
    }

    /// Watch the derived pricing; fires only when the figures change
    pub fn subscribe_pricing(&self) -> watch::Receiver<PricingSnapshot> {
        self.pricing_tx.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(self.clock.now_utc());
        }
    }

    // Storage writes never fail the caller.
    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Error saving {}: {}", key, e);
        }
    }

    fn publish(&self, timer: &TimerState) {
        let snapshot = timer.price_snapshot(&self.plan);
        self.pricing_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| FunnelError::StatePoisoned(format!("{}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::StorageError,
        state::{TimerPhase, DEFAULT_DISCOUNT_DURATION_MS},
        storage::{FileStore, MemoryStore},
    };
    use chrono::Datelike;

    const DURATION: i64 = DEFAULT_DISCOUNT_DURATION_MS;
    const T0: i64 = 1_700_000_000_000;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("read failed")))
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("write failed")))
        }

        fn remove_many(&self, _keys: &[&str]) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("write failed")))
        }
    }

    fn app(clock: &Arc<ManualClock>, store: &Arc<MemoryStore>) -> AppState {
        AppState::new(
            20554,
            "127.0.0.1".to_string(),
            DURATION,
            clock.clone(),
            store.clone(),
        )
    }

    fn payment(clock: &ManualClock) -> PaymentInfo {
        let now = clock.now_utc();
        PaymentInfo {
            card_number: "4242 4242 4242 4242".into(),
            expiry_date: format!("{:02}/{:02}", now.month(), (now.year() + 3).rem_euclid(100)),
            cvv: "123".into(),
            name_on_card: "Alex Smith".into(),
        }
    }

    #[test]
    fn start_persists_the_start_time_once() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);

        state.start_timer().unwrap();
        clock.advance(10_000);
        let timer = state.start_timer().unwrap();

        assert_eq!(timer.start_time(), Some(T0));
        assert_eq!(timer.remaining_ms(), DURATION - 10_000);
        assert_eq!(
            store.get(keys::TIMER_START).unwrap(),
            Some(T0.to_string())
        );
    }

    #[test]
    fn expiry_is_written_as_advisory_flag() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);

        state.start_timer().unwrap();
        assert!(state.pricing_snapshot().unwrap().is_discount_active);
        assert_eq!(store.get(keys::TIMER_EXPIRED).unwrap(), None);

        clock.advance(DURATION);
        let pricing = state.pricing_snapshot().unwrap();
        assert!(!pricing.is_discount_active);
        assert_eq!(pricing.current_price, 50.0);
        assert_eq!(store.get(keys::TIMER_EXPIRED).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn restart_after_window_restores_expired() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        app(&clock, &store).start_timer().unwrap();

        clock.advance(DURATION + 5_000);
        let restarted = app(&clock, &store);
        restarted.restore_from_storage().unwrap();

        let timer = restarted.get_timer_state().unwrap();
        assert_eq!(timer.phase(), TimerPhase::Expired);
        assert_eq!(timer.remaining_ms(), 0);
        assert_eq!(restarted._pricing_rx.borrow().current_price, 50.0);
    }

    #[test]
    fn stored_expired_flag_is_not_trusted() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        store.set(keys::TIMER_START, &(T0 - 1_000).to_string()).unwrap();
        store.set(keys::TIMER_EXPIRED, "true").unwrap();

        let state = app(&clock, &store);
        state.restore_from_storage().unwrap();

        let timer = state.get_timer_state().unwrap();
        assert!(timer.is_discount_active());
        assert_eq!(timer.remaining_ms(), DURATION - 1_000);
    }

    #[test]
    fn restore_brings_back_the_user_and_purchase() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let first = app(&clock, &store);
        first.set_email("alex@example.com").unwrap();
        first.set_name("Alex").unwrap();
        first.start_timer().unwrap();
        first.complete_purchase(payment(&clock)).unwrap();

        let second = app(&clock, &store);
        second.restore_from_storage().unwrap();
        let user = second.get_user().unwrap();
        assert_eq!(user.email, "alex@example.com");
        assert_eq!(user.promo_code, first.get_user().unwrap().promo_code);
        assert_eq!(second.current_step().unwrap(), FunnelStep::ThankYou);
        assert!(second.get_checkout().unwrap().payment_info.is_none());
    }

    #[test]
    fn storage_failures_do_not_block_the_funnel() {
        let clock = Arc::new(ManualClock::new(T0));
        let state = AppState::new(
            20554,
            "127.0.0.1".to_string(),
            DURATION,
            clock.clone(),
            Arc::new(FailingStore),
        );

        state.restore_from_storage().unwrap();
        assert_eq!(state.get_timer_state().unwrap().phase(), TimerPhase::NotStarted);

        state.set_email("alex@example.com").unwrap();
        state.set_name("Alex").unwrap();
        state.start_timer().unwrap();
        assert_eq!(state.pricing_snapshot().unwrap().current_price, 25.0);
        state.reset_session().unwrap();
    }

    #[test]
    fn corrupt_store_file_is_repaired_by_the_next_start() {
        let dir = std::env::temp_dir().join(format!(
            "momentum-funnel-app-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        let path = dir.join("store.json");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let clock = Arc::new(ManualClock::new(T0));
        let first = AppState::new(
            20554,
            "127.0.0.1".to_string(),
            DURATION,
            clock.clone(),
            Arc::new(FileStore::new(&path)),
        );
        first.restore_from_storage().unwrap();
        first.start_timer().unwrap();

        clock.advance(60_000);
        let second = AppState::new(
            20554,
            "127.0.0.1".to_string(),
            DURATION,
            clock.clone(),
            Arc::new(FileStore::new(&path)),
        );
        second.restore_from_storage().unwrap();
        let timer = second.get_timer_state().unwrap();
        assert_eq!(timer.start_time(), Some(T0));
        assert_eq!(timer.remaining_ms(), DURATION - 60_000);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_input_leaves_state_untouched() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);

        assert!(matches!(state.set_email("nope"), Err(FunnelError::Validation(_))));
        assert!(matches!(state.set_name("A1"), Err(FunnelError::Validation(_))));
        assert_eq!(state.get_user().unwrap(), UserProfile::default());
        assert_eq!(store.get(keys::USER_EMAIL).unwrap(), None);
    }

    #[test]
    fn purchase_needs_email_and_name() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);

        assert!(matches!(
            state.complete_purchase(payment(&clock)),
            Err(FunnelError::MissingPrerequisite(_))
        ));
    }

    #[test]
    fn expired_card_is_rejected_against_the_clock() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);
        state.set_email("alex@example.com").unwrap();
        state.set_name("Alex").unwrap();

        let card = payment(&clock);
        clock.advance(4 * 366 * 24 * 60 * 60 * 1000);
        match state.complete_purchase(card) {
            Err(FunnelError::Validation(message)) => {
                assert_eq!(message, validation::CARD_EXPIRED)
            }
            other => panic!("expected expired card, got {:?}", other),
        }
        assert!(state.get_checkout().unwrap().purchase_details.is_none());
    }

    #[test]
    fn purchase_charges_the_price_in_effect() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);
        state.set_email("alex@example.com").unwrap();
        state.set_name("Alex").unwrap();
        state.start_timer().unwrap();

        clock.advance(DURATION - 1);
        assert_eq!(state.complete_purchase(payment(&clock)).unwrap().amount, 25.0);

        clock.advance(1);
        let details = state.complete_purchase(payment(&clock)).unwrap();
        assert_eq!(details.amount, 50.0);
        assert_eq!(details.timestamp, T0 + DURATION);

        let stored = store.get(keys::PURCHASE_DETAILS).unwrap().unwrap();
        let parsed: PurchaseDetails = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, details);
    }

    #[test]
    fn reset_then_start_is_a_fresh_window() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);
        state.set_email("alex@example.com").unwrap();
        state.start_timer().unwrap();
        clock.advance(DURATION * 3);
        state.tick_timer().unwrap();

        state.reset_session().unwrap();
        for key in keys::ALL {
            assert_eq!(store.get(key).unwrap(), None);
        }
        assert_eq!(state.current_step().unwrap(), FunnelStep::Email);

        let timer = state.start_timer().unwrap();
        assert_eq!(timer.start_time(), Some(T0 + DURATION * 3));
        assert!(timer.is_discount_active());
        assert_eq!(state.get_last_action().0.as_deref(), Some("start-timer"));
    }

    #[test]
    fn pricing_subscribers_see_expiry() {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let state = app(&clock, &store);
        let mut rx = state.subscribe_pricing();
        assert!(!rx.borrow_and_update().is_discount_active);

        state.start_timer().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_discount_active);

        clock.advance(1_000);
        state.tick_timer().unwrap();
        assert!(!rx.has_changed().unwrap());

        clock.advance(DURATION);
        state.tick_timer().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().current_price, 50.0);
    }
}
