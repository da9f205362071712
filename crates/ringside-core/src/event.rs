//! Domain events published after successful operations.
//!
//! Events are produced by the planners in [`crate::lifecycle`] and handed to
//! an [`EventSink`] by the [`crate::service::Roster`] façade once the store
//! has committed. Failed operations publish nothing.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  Employed,
  Released,
  Injured,
  Healed,
  Suspended,
  Reinstated,
  Retired,
  Unretired,
  Activated,
  Deactivated,
  ChampionshipChanged,
  TitleVacated,
  Deleted,
  Restored,
}

impl EventKind {
  pub fn tag(self) -> &'static str {
    match self {
      Self::Employed => "EntityEmployed",
      Self::Released => "EntityReleased",
      Self::Injured => "EntityInjured",
      Self::Healed => "EntityHealed",
      Self::Suspended => "EntitySuspended",
      Self::Reinstated => "EntityReinstated",
      Self::Retired => "EntityRetired",
      Self::Unretired => "EntityUnretired",
      Self::Activated => "EntityActivated",
      Self::Deactivated => "EntityDeactivated",
      Self::ChampionshipChanged => "ChampionshipChanged",
      Self::TitleVacated => "TitleVacated",
      Self::Deleted => "EntityDeleted",
      Self::Restored => "EntityRestored",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
  pub kind:      EventKind,
  pub entity_id: Uuid,
  pub at:        DateTime<Utc>,
}

impl DomainEvent {
  pub fn new(kind: EventKind, entity_id: Uuid, at: DateTime<Utc>) -> Self {
    Self { kind, entity_id, at }
  }

  pub fn tag(&self) -> &'static str { self.kind.tag() }
}

/// Receives committed domain events. Transport is up to the implementor.
pub trait EventSink: Send + Sync {
  fn publish(&self, event: &DomainEvent);
}

/// Writes every event to the `tracing` log at `INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
  fn publish(&self, event: &DomainEvent) {
    tracing::info!(
      event = event.tag(),
      entity_id = %event.entity_id,
      at = %event.at,
      "domain event"
    );
  }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
  events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
  pub fn new() -> Self { Self::default() }

  pub fn events(&self) -> Vec<DomainEvent> {
    self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Drain everything collected so far.
  pub fn take(&self) -> Vec<DomainEvent> {
    std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
  }
}

impl EventSink for MemorySink {
  fn publish(&self, event: &DomainEvent) {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(event.clone());
  }
}
