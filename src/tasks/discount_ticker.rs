//! Periodic re-evaluation of the discount countdown

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, TimerPhase};

/// Re-evaluate the discount timer every `period` until `shutdown` flips to
/// `true` or its sender is dropped.
///
/// Each tick recomputes remaining time from the absolute start, so a late or
/// skipped tick never skews the countdown.
pub async fn discount_ticker_task(
    state: Arc<AppState>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Starting discount ticker task ({:?} period)", period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_phase = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.tick_timer() {
                    Ok(timer) => {
                        let phase = timer.phase();
                        if last_phase != Some(phase) {
                            debug!("Discount timer phase: {:?}", phase);
                            last_phase = Some(phase);
                        }
                        if phase == TimerPhase::Active {
                            debug!("Discount remaining: {}ms", timer.remaining_ms());
                        }
                    }
                    Err(e) => {
                        error!("Failed to tick discount timer: {}", e);
                    }
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Stopping discount ticker task");
                    break;
                }
            }
        }
    }
}
