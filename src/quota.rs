//! Provider quota estimate over a rolling window.
//!
//! The count is a heuristic used to prefer fallback sources early; it never
//! blocks a call. The `exhausted` flag is only set from an actual rate-limit
//! failure and is cleared when the window rolls over.

use crate::clock::Clock;
use crate::config::QuotaConfig;
use crate::error::ProviderError;
use crate::types::QuotaStatus;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct QuotaState {
    request_count: u32,
    reset_at: DateTime<Utc>,
    exhausted: bool,
}

pub struct QuotaTracker {
    state: Mutex<QuotaState>,
    free_tier_limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new(config: &QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        let window = Duration::hours(i64::from(config.window_hours));
        let now = clock.now();
        Self {
            state: Mutex::new(QuotaState {
                request_count: 0,
                reset_at: now + window,
                exhausted: false,
            }),
            free_tier_limit: config.free_tier_limit,
            window,
            clock,
        }
    }

    /// Roll the window if it has elapsed, fold in `error` if given, and report exhaustion.
    pub fn check_status(&self, error: Option<&ProviderError>) -> bool {
        let mut state = self.state.lock();
        self.roll_window(&mut state);

        if let Some(err) = error {
            if err.is_rate_limited() {
                if !state.exhausted {
                    warn!(
                        request_count = state.request_count,
                        reset_at = %state.reset_at,
                        error = %err,
                        "Provider quota exhausted"
                    );
                }
                state.exhausted = true;
                return true;
            }
        }

        state.exhausted
    }

    /// Count one outbound provider call. Called before the call is issued.
    pub fn increment(&self) {
        let mut state = self.state.lock();
        self.roll_window(&mut state);
        state.request_count = state.request_count.saturating_add(1);
    }

    pub fn remaining_estimate(&self) -> u32 {
        let mut state = self.state.lock();
        self.roll_window(&mut state);
        self.free_tier_limit.saturating_sub(state.request_count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.check_status(None)
    }

    pub fn status(&self) -> QuotaStatus {
        let mut state = self.state.lock();
        self.roll_window(&mut state);
        QuotaStatus {
            request_count: state.request_count,
            remaining_estimate: self.free_tier_limit.saturating_sub(state.request_count),
            exhausted: state.exhausted,
            reset_at: state.reset_at,
        }
    }

    fn roll_window(&self, state: &mut QuotaState) {
        let now = self.clock.now();
        if now > state.reset_at {
            if state.exhausted || state.request_count > 0 {
                info!(
                    previous_count = state.request_count,
                    was_exhausted = state.exhausted,
                    "Quota window reset"
                );
            }
            state.request_count = 0;
            state.exhausted = false;
            state.reset_at = now + self.window;
        }
    }
}
