//! [`Roster`]: the façade the presentation layer talks to.
//!
//! Wraps a [`RosterStore`] with a [`Clock`] for default timestamps and an
//! [`EventSink`] that receives the domain events of every committed
//! operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error,
  championship::{ChampionRef, Championship, ChampionshipChange},
  clock::{Clock, SystemClock},
  entity::{Entity, EntityType, NewEntity},
  event::{DomainEvent, EventSink, TracingSink},
  history::EntityHistory,
  lifecycle::{Change, Plan, Transition},
  period::PeriodKind,
  query::EntityQuery,
  status::{CompositeStatus, TitleStatus, resolve, resolve_title},
  store::RosterStore,
};

/// The result of a committed lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
  pub entity:     Entity,
  pub transition: Transition,
  pub at:         DateTime<Utc>,
  /// Status as of `at`, after the transition.
  pub status:     CompositeStatus,
  pub changes:    Vec<Change>,
  pub events:     Vec<DomainEvent>,
}

pub struct Roster<S> {
  store:  Arc<S>,
  clock:  Arc<dyn Clock>,
  events: Arc<dyn EventSink>,
}

impl<S> Clone for Roster<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      clock:  Arc::clone(&self.clock),
      events: Arc::clone(&self.events),
    }
  }
}

impl<S: RosterStore> Roster<S> {
  /// A roster using the system clock and logging events through `tracing`.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      clock: Arc::new(SystemClock),
      events: Arc::new(TracingSink),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
    self.events = events;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  fn publish(&self, events: &[DomainEvent]) {
    for event in events {
      self.events.publish(event);
    }
  }

  async fn history(&self, id: Uuid) -> Result<EntityHistory, S::Error> {
    self
      .store
      .load_history(id)
      .await?
      .ok_or_else(|| Error::EntityNotFound(id).into())
  }

  // ── Entities ──────────────────────────────────────────────────────────

  pub async fn add_entity(
    &self,
    entity_type: EntityType,
    name: impl Into<String>,
  ) -> Result<Entity, S::Error> {
    let entity = self
      .store
      .add_entity(NewEntity::new(entity_type, name), self.now())
      .await?;
    info!(entity_id = %entity.entity_id, entity_type = %entity_type, "entity added");
    Ok(entity)
  }

  pub async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>, S::Error> {
    self.store.get_entity(id).await
  }

  pub async fn delete(&self, id: Uuid) -> Result<Entity, S::Error> {
    let (entity, event) = self.store.soft_delete(id, self.now()).await?;
    self.publish(std::slice::from_ref(&event));
    Ok(entity)
  }

  pub async fn restore(&self, id: Uuid) -> Result<Entity, S::Error> {
    let (entity, event) = self.store.restore(id, self.now()).await?;
    self.publish(std::slice::from_ref(&event));
    Ok(entity)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Apply `transition` at `at`, or now when `at` is `None`.
  pub async fn apply(
    &self,
    id: Uuid,
    transition: Transition,
    at: Option<DateTime<Utc>>,
  ) -> Result<Outcome, S::Error> {
    let at = at.unwrap_or_else(|| self.now());
    let plan = match self.store.apply_transition(id, transition, at).await {
      Ok(plan) => plan,
      Err(e) => {
        warn!(entity_id = %id, operation = %transition, error = %e, "transition rejected");
        return Err(e);
      }
    };
    debug!(entity_id = %id, changes = ?plan.changes, "transition committed");

    let status = resolve(&plan.after, at);
    info!(
      entity_id = %id,
      operation = %transition,
      status = %status.status,
      "transition applied"
    );
    self.publish(&plan.events);

    Ok(Outcome {
      entity: plan.after.entity,
      transition,
      at,
      status,
      changes: plan.changes,
      events: plan.events,
    })
  }

  pub async fn employ(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Employ, at).await
  }

  pub async fn release(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Release, at).await
  }

  pub async fn injure(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Injure, at).await
  }

  pub async fn heal(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Heal, at).await
  }

  pub async fn suspend(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Suspend, at).await
  }

  pub async fn reinstate(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Reinstate, at).await
  }

  pub async fn retire(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Retire, at).await
  }

  pub async fn unretire(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Unretire, at).await
  }

  pub async fn activate(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Activate, at).await
  }

  pub async fn deactivate(
    &self,
    id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<Outcome, S::Error> {
    self.apply(id, Transition::Deactivate, at).await
  }

  // ── Status ────────────────────────────────────────────────────────────

  pub async fn status(
    &self,
    id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<CompositeStatus, S::Error> {
    let history = self.history(id).await?;
    Ok(resolve(&history, as_of.unwrap_or_else(|| self.now())))
  }

  pub async fn is_bookable(&self, id: Uuid) -> Result<bool, S::Error> {
    Ok(self.status(id, None).await?.bookable)
  }

  // ── Championship ledger ───────────────────────────────────────────────

  pub async fn record_championship_change(
    &self,
    title_id: Uuid,
    champion: ChampionRef,
    at: Option<DateTime<Utc>>,
    won_event_match_id: Option<Uuid>,
  ) -> Result<ChampionshipChange, S::Error> {
    let at = at.unwrap_or_else(|| self.now());
    let plan = match self
      .store
      .record_championship_change(title_id, champion, at, won_event_match_id)
      .await
    {
      Ok(plan) => plan,
      Err(e) => {
        warn!(title_id = %title_id, error = %e, "championship change rejected");
        return Err(e);
      }
    };

    let (previous, current) = reigns_touched(&plan);
    let current = current.ok_or_else(|| Error::NoOpenPeriod {
      entity_id: title_id,
      kind:      PeriodKind::Reign,
    })?;
    info!(
      title_id = %title_id,
      champion_id = %champion.champion_id,
      "championship changed hands"
    );
    self.publish(&plan.events);
    Ok(ChampionshipChange { previous, current })
  }

  /// Vacate the title. Returns the reign that ended, or `None` if the title
  /// was already vacant.
  pub async fn vacate_title(
    &self,
    title_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> Result<Option<Championship>, S::Error> {
    let at = at.unwrap_or_else(|| self.now());
    let plan = match self.store.vacate_title(title_id, at).await {
      Ok(plan) => plan,
      Err(e) => {
        warn!(title_id = %title_id, error = %e, "vacate rejected");
        return Err(e);
      }
    };
    let (previous, _) = reigns_touched(&plan);
    if previous.is_some() {
      info!(title_id = %title_id, "title vacated");
    }
    self.publish(&plan.events);
    Ok(previous)
  }

  pub async fn current_champion(&self, title_id: Uuid) -> Result<Option<ChampionRef>, S::Error> {
    Ok(self.title_status(title_id, None).await?.champion)
  }

  pub async fn title_status(
    &self,
    title_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<TitleStatus, S::Error> {
    let history = self.history(title_id).await?;
    if history.entity.entity_type != EntityType::Title {
      return Err(Error::NotATitle(title_id).into());
    }
    Ok(resolve_title(&history, as_of.unwrap_or_else(|| self.now())))
  }

  /// Length in days of `championship`, counting to now while it is open.
  pub fn reign_length(&self, championship: &Championship, as_of: Option<DateTime<Utc>>) -> i64 {
    championship.reign_length(as_of.unwrap_or_else(|| self.now()))
  }

  /// Every reign of the title, most recent first.
  pub async fn title_history(&self, title_id: Uuid) -> Result<Vec<Championship>, S::Error> {
    self.store.championships(title_id).await
  }

  // ── Queries ───────────────────────────────────────────────────────────

  pub async fn list(
    &self,
    query: &EntityQuery,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<Uuid>, S::Error> {
    self
      .store
      .query(query, as_of.unwrap_or_else(|| self.now()))
      .await
  }
}

/// The reign closed and the reign opened by `plan`, if any.
fn reigns_touched(plan: &Plan) -> (Option<Championship>, Option<Championship>) {
  let find = |id: Uuid| {
    plan
      .after
      .reigns()
      .iter()
      .find(|r| r.championship_id == id)
      .cloned()
  };

  let mut closed = None;
  let mut opened = None;
  for change in &plan.changes {
    match *change {
      Change::CloseReign { championship_id, .. } => closed = find(championship_id),
      Change::OpenReign { championship_id, .. } => opened = find(championship_id),
      _ => {}
    }
  }
  (closed, opened)
}
