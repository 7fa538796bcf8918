//! Free-trial countdown and promotional offer window.
//!
//! `TrialTimer` is the per-installation state machine behind the paywall
//! gate. Every mutation is written through to `LocalStorage` on a
//! best-effort basis: storage failures are logged and the timer keeps
//! working from memory for the rest of the process.
//!
//! `TrialTicker` drives `tick()` once per second on the tokio runtime.

mod clock;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ticker::{SharedTimer, TrialTicker};

use chrono::{DateTime, Duration, Utc};

use crate::config::{
  FIRST_DAY_WINDOW_SECS, KEY_FIRST_DAY_STARTED_AT, KEY_OFFER_STARTED_AT, KEY_TRIAL_REMAINING,
  KEY_TRIAL_STARTED, OFFER_WINDOW_SECS,
};
use crate::db::LogOnError;
use crate::error::{CoreError, Result};
use crate::store::LocalStorage;

#[cfg(feature = "profiling")]
use crate::profiling::EventType;

/// Snapshot of the gate as the presentation layer sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialState {
  pub remaining_seconds: i64,
  pub is_time_up: bool,
  pub is_first_day: bool,
  pub is_offer_active: bool,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  /// Countdown continues with this many seconds left
  Running(i64),
  /// This tick reached zero
  Expired,
  /// Nothing to do: premium or already out of time
  Halted,
}

pub struct TrialTimer<S, C = SystemClock> {
  storage: S,
  clock: C,
  duration_secs: i64,
  remaining_seconds: i64,
  is_time_up: bool,
  is_premium: bool,
  first_day_started_at: Option<DateTime<Utc>>,
  offer_started_at: Option<DateTime<Utc>>,
}

impl<S: LocalStorage, C: Clock> TrialTimer<S, C> {
  pub fn new(storage: S, clock: C, duration_secs: i64) -> Self {
    Self {
      storage,
      clock,
      duration_secs,
      remaining_seconds: duration_secs,
      is_time_up: false,
      is_premium: false,
      first_day_started_at: None,
      offer_started_at: None,
    }
  }

  /// Load persisted state and decide where the countdown stands.
  pub fn initialize(&mut self, is_premium: bool) {
    let stored_remaining = self
      .storage
      .get(KEY_TRIAL_REMAINING)
      .log_warn("Failed to read trial remaining")
      .flatten()
      .and_then(|v| v.trim().parse::<i64>().ok());
    let trial_started = self
      .storage
      .get(KEY_TRIAL_STARTED)
      .log_warn("Failed to read trial started flag")
      .flatten()
      .is_some_and(|v| v == "true");

    self.initialize_from(is_premium, stored_remaining, trial_started);
  }

  /// Transition from already-read persisted values.
  pub fn initialize_from(&mut self, is_premium: bool, stored_remaining: Option<i64>, trial_started: bool) {
    if is_premium {
      self.apply_premium(true);
      return;
    }
    self.is_premium = false;

    self.first_day_started_at = self.read_timestamp(KEY_FIRST_DAY_STARTED_AT);
    self.offer_started_at = self.read_timestamp(KEY_OFFER_STARTED_AT);

    match stored_remaining {
      Some(stored) => {
        self.remaining_seconds = stored.max(0);
        self.is_time_up = self.remaining_seconds == 0;
        if self.is_time_up {
          self.open_offer();
        }
        tracing::debug!(
          "Resuming trial: {}s remaining, time up: {}",
          self.remaining_seconds,
          self.is_time_up
        );
      }
      None if !trial_started => {
        self.remaining_seconds = self.duration_secs;
        self.is_time_up = false;
        self.persist(KEY_TRIAL_REMAINING, &self.duration_secs.to_string());
        self.persist(KEY_TRIAL_STARTED, "true");
        tracing::info!("Started trial: {}s", self.duration_secs);
      }
      None => {
        tracing::warn!("Trial marked started but no remaining time stored, resuming at full duration");
        self.remaining_seconds = self.duration_secs;
        self.is_time_up = false;
        self.persist(KEY_TRIAL_REMAINING, &self.duration_secs.to_string());
      }
    }
  }

  /// Whether the ticker should keep running
  pub fn should_tick(&self) -> bool {
    !self.is_premium && !self.is_time_up
  }

  pub fn tick(&mut self) -> TickOutcome {
    if !self.should_tick() {
      return TickOutcome::Halted;
    }

    self.remaining_seconds = (self.remaining_seconds - 1).max(0);
    self.persist(KEY_TRIAL_REMAINING, &self.remaining_seconds.to_string());

    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::TrialTick {
      remaining_seconds: self.remaining_seconds,
    });

    if self.remaining_seconds == 0 {
      self.is_time_up = true;
      self.open_offer();
      tracing::info!("Trial time is up");
      TickOutcome::Expired
    } else {
      TickOutcome::Running(self.remaining_seconds)
    }
  }

  /// First-day check: stamps the start on first observation, then compares
  /// wall-clock time against the 24h window.
  pub fn is_first_day(&mut self) -> bool {
    let now = self.clock.now();
    let started = match self.first_day_started_at.or_else(|| self.read_timestamp(KEY_FIRST_DAY_STARTED_AT)) {
      Some(started) => started,
      None => {
        self.persist(KEY_FIRST_DAY_STARTED_AT, &now.to_rfc3339());
        now
      }
    };
    self.first_day_started_at = Some(started);
    now - started < Duration::seconds(FIRST_DAY_WINDOW_SECS)
  }

  pub fn is_offer_active(&self) -> bool {
    if self.is_premium {
      return false;
    }
    self
      .offer_started_at
      .is_some_and(|started| self.clock.now() - started < Duration::seconds(OFFER_WINDOW_SECS))
  }

  pub fn remaining_seconds(&self) -> i64 {
    self.remaining_seconds
  }

  pub fn is_time_up(&self) -> bool {
    self.is_time_up
  }

  pub fn is_premium(&self) -> bool {
    self.is_premium
  }

  pub fn state(&mut self) -> TrialState {
    TrialState {
      remaining_seconds: self.remaining_seconds,
      is_time_up: self.is_time_up,
      is_first_day: self.is_first_day(),
      is_offer_active: self.is_offer_active(),
    }
  }

  /// Lift the gate during the first day. Remaining time is re-derived from
  /// the first-day window, not reset to a full trial.
  pub fn skip_payment(&mut self) -> Result<()> {
    if !self.is_first_day() {
      return Err(CoreError::InvalidState(
        "payment can only be skipped on the first day".into(),
      ));
    }

    let elapsed = self
      .first_day_started_at
      .map(|started| (self.clock.now() - started).num_seconds())
      .unwrap_or(0);
    self.remaining_seconds = (self.duration_secs - elapsed).max(0);
    self.is_time_up = false;
    self.persist(KEY_TRIAL_REMAINING, &self.remaining_seconds.to_string());
    tracing::info!("Payment skipped, {}s of trial left", self.remaining_seconds);
    Ok(())
  }

  /// Administrative reset: full trial, fresh first-day window.
  pub fn reset_timer(&mut self) {
    let now = self.clock.now();
    self.remaining_seconds = self.duration_secs;
    self.is_time_up = false;
    self.first_day_started_at = Some(now);
    self.offer_started_at = None;

    self.persist(KEY_TRIAL_REMAINING, &self.duration_secs.to_string());
    self.persist(KEY_TRIAL_STARTED, "true");
    self.persist(KEY_FIRST_DAY_STARTED_AT, &now.to_rfc3339());
    self.remove(KEY_OFFER_STARTED_AT);
    tracing::info!("Trial timer reset");
  }

  /// React to an entitlement change. Premium clears the gate and its keys.
  pub fn apply_premium(&mut self, is_premium: bool) {
    self.is_premium = is_premium;
    if !is_premium {
      return;
    }

    self.remaining_seconds = self.duration_secs;
    self.is_time_up = false;
    self.offer_started_at = None;
    self.remove(KEY_TRIAL_REMAINING);
    self.remove(KEY_TRIAL_STARTED);
    self.remove(KEY_OFFER_STARTED_AT);
    tracing::debug!("Premium active, trial gate cleared");
  }

  fn open_offer(&mut self) {
    if self.offer_started_at.is_some() {
      return;
    }
    let now = self.clock.now();
    self.offer_started_at = Some(now);
    self.persist(KEY_OFFER_STARTED_AT, &now.to_rfc3339());
  }

  fn read_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
    self
      .storage
      .get(key)
      .log_warn("Failed to read trial timestamp")
      .flatten()
      .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
      .map(|dt| dt.with_timezone(&Utc))
  }

  fn persist(&self, key: &str, value: &str) {
    let _ = self.storage.set(key, value).log_warn("Failed to persist trial state");
  }

  fn remove(&self, key: &str) {
    let _ = self.storage.remove(key).log_warn("Failed to clear trial state");
  }
}
