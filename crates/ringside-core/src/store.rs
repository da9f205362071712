//! The `RosterStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `ringside-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.
//!
//! Every mutating method is atomic per entity: the backend loads the
//! entity's history, plans the operation with [`crate::lifecycle`], and
//! persists the resulting changes in one transaction, or nothing at all.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  championship::{ChampionRef, Championship},
  entity::{Entity, EntityType, NewEntity},
  event::DomainEvent,
  history::EntityHistory,
  lifecycle::{Plan, Transition},
  period::{Period, PeriodKind},
  query::EntityQuery,
};

/// Abstraction over a roster backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RosterStore: Send + Sync {
  /// Backend error. Lifecycle failures from `ringside-core` must convert
  /// into it losslessly so callers can still match on them.
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  fn add_entity(
    &self,
    input: NewEntity,
    created_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Entity, Self::Error>> + Send + '_;

  /// Retrieve an entity by id, deleted or not. Returns `None` if unknown.
  fn get_entity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Entity>, Self::Error>> + Send + '_;

  fn list_entities(
    &self,
    entity_type: Option<EntityType>,
  ) -> impl Future<Output = Result<Vec<Entity>, Self::Error>> + Send + '_;

  fn soft_delete(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(Entity, DomainEvent), Self::Error>> + Send + '_;

  fn restore(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(Entity, DomainEvent), Self::Error>> + Send + '_;

  // ── Period store ──────────────────────────────────────────────────────

  /// Open a period directly, bypassing lifecycle preconditions but not the
  /// period invariants.
  fn add_period(
    &self,
    entity_id: Uuid,
    kind: PeriodKind,
    started_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Period, Self::Error>> + Send + '_;

  fn close_period(
    &self,
    entity_id: Uuid,
    kind: PeriodKind,
    ended_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Period, Self::Error>> + Send + '_;

  /// All periods of `kind` for the entity, oldest first.
  fn periods_for(
    &self,
    entity_id: Uuid,
    kind: PeriodKind,
  ) -> impl Future<Output = Result<Vec<Period>, Self::Error>> + Send + '_;

  /// The entity with every period and reign. Returns `None` if unknown.
  fn load_history(
    &self,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Option<EntityHistory>, Self::Error>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  fn apply_transition(
    &self,
    entity_id: Uuid,
    transition: Transition,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Plan, Self::Error>> + Send + '_;

  // ── Championship ledger ───────────────────────────────────────────────

  fn record_championship_change(
    &self,
    title_id: Uuid,
    champion: ChampionRef,
    at: DateTime<Utc>,
    won_event_match_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Plan, Self::Error>> + Send + '_;

  fn vacate_title(
    &self,
    title_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Plan, Self::Error>> + Send + '_;

  /// Every reign of the title, most recent first.
  fn championships(
    &self,
    title_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Championship>, Self::Error>> + Send + '_;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Ids of every entity matching `query` as of `as_of`.
  fn query<'a>(
    &'a self,
    query: &'a EntityQuery,
    as_of: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;
}
