//! Entitlement and native platform signals.
//!
//! Premium status is passed around explicitly as an `EntitlementHandle`
//! whose changes are observed through a `tokio::sync::watch` channel.
//! Optional native bridge operations are exposed as a `Capability`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Result;

/// Source of the premium entitlement
pub trait EntitlementSignal: Send + Sync {
  fn is_premium(&self) -> bool;
  /// Receiver that observes every later change
  fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Premium flag owned by the host, broadcast to subscribers
#[derive(Debug, Clone)]
pub struct EntitlementHandle {
  tx: Arc<watch::Sender<bool>>,
}

impl EntitlementHandle {
  pub fn new(is_premium: bool) -> Self {
    let (tx, _rx) = watch::channel(is_premium);
    Self { tx: Arc::new(tx) }
  }

  /// Update the premium flag; subscribers are only woken on a real change
  pub fn set_premium(&self, is_premium: bool) {
    let changed = self.tx.send_if_modified(|current| {
      if *current == is_premium {
        false
      } else {
        *current = is_premium;
        true
      }
    });
    if changed {
      tracing::info!("Premium status changed: {}", is_premium);
    }
  }
}

impl EntitlementSignal for EntitlementHandle {
  fn is_premium(&self) -> bool {
    *self.tx.borrow()
  }

  fn subscribe(&self) -> watch::Receiver<bool> {
    self.tx.subscribe()
  }
}

/// Presence of an optional platform feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
  Available(T),
  Unavailable,
}

impl<T> Capability<T> {
  pub fn is_available(&self) -> bool {
    matches!(self, Self::Available(_))
  }
}

/// Purchase operations offered by some native shells
pub trait PurchaseBridge: Send + Sync {
  /// Ask the store to re-deliver past purchases; returns whether premium was restored
  fn restore_purchases(&self) -> Result<bool>;
}

/// Explicit bundle of platform signals handed to components that need them
#[derive(Clone)]
pub struct PlatformContext {
  pub entitlement: EntitlementHandle,
  purchase_bridge: Option<Arc<dyn PurchaseBridge>>,
}

impl PlatformContext {
  pub fn new(entitlement: EntitlementHandle) -> Self {
    Self {
      entitlement,
      purchase_bridge: None,
    }
  }

  pub fn with_purchase_bridge(mut self, bridge: Arc<dyn PurchaseBridge>) -> Self {
    self.purchase_bridge = Some(bridge);
    self
  }

  pub fn purchase_bridge(&self) -> Capability<Arc<dyn PurchaseBridge>> {
    match &self.purchase_bridge {
      Some(bridge) => Capability::Available(Arc::clone(bridge)),
      None => Capability::Unavailable,
    }
  }

  /// Restore purchases through the native bridge and publish the result.
  ///
  /// Returns `Capability::Unavailable` when the shell has no bridge.
  pub fn restore_purchases(&self) -> Capability<Result<bool>> {
    match self.purchase_bridge() {
      Capability::Available(bridge) => {
        let result = bridge.restore_purchases();
        match &result {
          Ok(true) => self.entitlement.set_premium(true),
          Ok(false) => tracing::debug!("Restore purchases found no entitlement"),
          Err(e) => tracing::warn!("Restore purchases failed: {}", e),
        }
        Capability::Available(result)
      }
      Capability::Unavailable => Capability::Unavailable,
    }
  }
}
