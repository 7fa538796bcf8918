//! One-second driver for `TrialTimer::tick`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{Clock, TickOutcome, TrialTimer};
use crate::store::LocalStorage;

pub type SharedTimer<S, C> = Arc<Mutex<TrialTimer<S, C>>>;

const TICK_PERIOD: Duration = Duration::from_secs(1);

struct TickerTask {
  handle: JoinHandle<()>,
  stop: watch::Sender<bool>,
}

/// Owns at most one running tick loop
#[derive(Default)]
pub struct TrialTicker {
  task: Mutex<Option<TickerTask>>,
}

impl TrialTicker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start ticking if the gate is enforced and no loop is already alive.
  ///
  /// Returns true when a new loop was spawned. Must be called from within a
  /// tokio runtime.
  pub fn start<S, C>(&self, timer: SharedTimer<S, C>, premium: watch::Receiver<bool>) -> bool
  where
    S: LocalStorage + Send + 'static,
    C: Clock + 'static,
  {
    let Ok(mut guard) = self.task.lock() else {
      tracing::error!("Trial ticker lock poisoned");
      return false;
    };

    if let Some(task) = guard.as_ref() {
      if !task.handle.is_finished() {
        tracing::debug!("Trial ticker already running");
        return false;
      }
    }

    let enforced = match timer.lock() {
      Ok(mut t) => {
        if *premium.borrow() {
          t.apply_premium(true);
        }
        t.should_tick()
      }
      Err(_) => false,
    };
    if !enforced {
      *guard = None;
      return false;
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(run(timer, premium, stop_rx));
    *guard = Some(TickerTask {
      handle,
      stop: stop_tx,
    });
    tracing::debug!("Trial ticker started");
    true
  }

  pub fn is_running(&self) -> bool {
    self
      .task
      .lock()
      .map(|guard| guard.as_ref().is_some_and(|t| !t.handle.is_finished()))
      .unwrap_or(false)
  }

  /// Stop the loop and wait until it has exited. No tick fires afterwards.
  pub async fn stop(&self) {
    let task = match self.task.lock() {
      Ok(mut guard) => guard.take(),
      Err(_) => None,
    };
    if let Some(task) = task {
      let _ = task.stop.send(true);
      if let Err(e) = task.handle.await {
        tracing::warn!("Trial ticker exited abnormally: {}", e);
      }
    }
  }
}

async fn run<S, C>(timer: SharedTimer<S, C>, mut premium: watch::Receiver<bool>, mut stop: watch::Receiver<bool>)
where
  S: LocalStorage + Send + 'static,
  C: Clock + 'static,
{
  let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
  let mut premium_open = true;

  loop {
    tokio::select! {
      biased;

      _ = stop.changed() => {
        tracing::debug!("Trial ticker stopped");
        break;
      }

      changed = premium.changed(), if premium_open => {
        if changed.is_err() {
          // Entitlement source went away; keep the last known value
          premium_open = false;
          continue;
        }
        if *premium.borrow_and_update() {
          if let Ok(mut t) = timer.lock() {
            t.apply_premium(true);
          }
          tracing::info!("Premium detected, trial ticker stopped");
          break;
        }
      }

      _ = interval.tick() => {
        if *premium.borrow() {
          if let Ok(mut t) = timer.lock() {
            t.apply_premium(true);
          }
          break;
        }
        let outcome = match timer.lock() {
          Ok(mut t) => t.tick(),
          Err(_) => {
            tracing::error!("Trial timer lock poisoned, stopping ticker");
            break;
          }
        };
        if !matches!(outcome, TickOutcome::Running(_)) {
          break;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{EntitlementHandle, EntitlementSignal};
  use crate::store::MemoryStorage;
  use crate::trial::ManualClock;

  fn shared_timer(remaining: i64) -> SharedTimer<MemoryStorage, ManualClock> {
    let mut timer = TrialTimer::new(MemoryStorage::new(), ManualClock::new(chrono::Utc::now()), 86_400);
    timer.initialize_from(false, Some(remaining), true);
    Arc::new(Mutex::new(timer))
  }

  fn remaining(timer: &SharedTimer<MemoryStorage, ManualClock>) -> i64 {
    timer.lock().unwrap().remaining_seconds()
  }

  #[tokio::test(start_paused = true)]
  async fn test_ticks_once_per_second() {
    let timer = shared_timer(10);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(remaining(&timer), 7);
    assert!(ticker.is_running());
    ticker.stop().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_start_is_idempotent() {
    let timer = shared_timer(10);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    assert!(!ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // A duplicate loop would have taken four seconds off
    assert_eq!(remaining(&timer), 8);
    ticker.stop().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_stops_at_zero() {
    let timer = shared_timer(2);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(remaining(&timer), 0);
    assert!(timer.lock().unwrap().is_time_up());
    assert!(!ticker.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_premium_stops_ticking() {
    let timer = shared_timer(10);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_millis(2500)).await;
    entitlement.set_premium(true);
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(!ticker.is_running());
    let t = timer.lock().unwrap();
    assert!(t.is_premium());
    assert!(!t.is_time_up());
  }

  #[tokio::test(start_paused = true)]
  async fn test_no_start_when_time_up_or_premium() {
    let ticker = TrialTicker::new();

    let expired = shared_timer(0);
    assert!(!ticker.start(expired, EntitlementHandle::new(false).subscribe()));

    let premium = shared_timer(10);
    assert!(!ticker.start(Arc::clone(&premium), EntitlementHandle::new(true).subscribe()));
    assert!(premium.lock().unwrap().is_premium());
    assert!(!ticker.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_stop_halts_countdown() {
    let timer = shared_timer(10);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    ticker.stop().await;
    let after_stop = remaining(&timer);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(remaining(&timer), after_stop);
    assert!(!ticker.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_restart_after_stop() {
    let timer = shared_timer(10);
    let entitlement = EntitlementHandle::new(false);
    let ticker = TrialTicker::new();

    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    ticker.stop().await;
    assert!(ticker.start(Arc::clone(&timer), entitlement.subscribe()));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(remaining(&timer), 9);
    ticker.stop().await;
  }
}
