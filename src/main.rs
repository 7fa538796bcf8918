use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lingo_core::config;
use lingo_core::db::SqliteStore;
use lingo_core::platform::{EntitlementHandle, EntitlementSignal, PlatformContext};
use lingo_core::profiling;
use lingo_core::trial::{SystemClock, TrialTicker, TrialTimer};

const STATUS_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lingo_core=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  // Initialize profiling (no-op if feature disabled)
  profiling::init();

  let cfg = config::load_config();
  let store = lingo_core::profile_scope!("open_store", { SqliteStore::open(&cfg.database_path) })
    .expect("Failed to initialize database");
  tracing::info!("Using database {}", cfg.database_path.display());

  let platform = PlatformContext::new(EntitlementHandle::new(false));

  let mut timer = TrialTimer::new(store, SystemClock, cfg.trial_duration_secs);
  timer.initialize(platform.entitlement.is_premium());
  let state = timer.state();
  tracing::info!(
    "Trial: {}s remaining, time up: {}, first day: {}, offer active: {}",
    state.remaining_seconds,
    state.is_time_up,
    state.is_first_day,
    state.is_offer_active
  );

  let timer = Arc::new(Mutex::new(timer));
  let ticker = TrialTicker::new();
  if !ticker.start(Arc::clone(&timer), platform.entitlement.subscribe()) {
    tracing::info!("Trial gate not enforced, nothing to run");
    profiling::shutdown();
    return;
  }

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => {
        tracing::info!("Shutting down");
        break;
      }
      _ = tokio::time::sleep(STATUS_INTERVAL) => {
        if let Ok(t) = timer.lock() {
          tracing::info!("Trial: {}s remaining", t.remaining_seconds());
        }
        if !ticker.is_running() {
          tracing::info!("Trial ticker finished");
          break;
        }
      }
    }
  }

  ticker.stop().await;
  profiling::shutdown();
}
