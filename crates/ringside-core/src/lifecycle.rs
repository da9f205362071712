//! Lifecycle transitions and championship changes.
//!
//! Every operation is planned here, purely, against a loaded
//! [`EntityHistory`]: the timestamp must not fall before anything already
//! recorded, the precondition is checked against the status as of that
//! timestamp, the resulting [`Change`]s are applied to a copy
//! of the history (which enforces the period invariants), and the caller gets
//! back the changes to persist, the events to publish, and the history as it
//! will look afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  championship::ChampionRef,
  entity::{Entity, EntityType},
  event::{DomainEvent, EventKind},
  history::EntityHistory,
  period::PeriodKind,
  status::{Status, resolve},
};

// ─── Transitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
  Employ,
  Release,
  Injure,
  Heal,
  Suspend,
  Reinstate,
  Retire,
  Unretire,
  Activate,
  Deactivate,
}

impl Transition {
  pub const ALL: [Transition; 10] = [
    Self::Employ,
    Self::Release,
    Self::Injure,
    Self::Heal,
    Self::Suspend,
    Self::Reinstate,
    Self::Retire,
    Self::Unretire,
    Self::Activate,
    Self::Deactivate,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Employ => "employ",
      Self::Release => "release",
      Self::Injure => "injure",
      Self::Heal => "heal",
      Self::Suspend => "suspend",
      Self::Reinstate => "reinstate",
      Self::Retire => "retire",
      Self::Unretire => "unretire",
      Self::Activate => "activate",
      Self::Deactivate => "deactivate",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }

  /// The period kind the entity must support for this transition.
  pub fn kind(self) -> PeriodKind {
    match self {
      Self::Employ | Self::Release => PeriodKind::Employment,
      Self::Activate | Self::Deactivate => PeriodKind::Activation,
      Self::Injure | Self::Heal => PeriodKind::Injury,
      Self::Suspend | Self::Reinstate => PeriodKind::Suspension,
      Self::Retire | Self::Unretire => PeriodKind::Retirement,
    }
  }

  pub fn event_kind(self) -> EventKind {
    match self {
      Self::Employ => EventKind::Employed,
      Self::Release => EventKind::Released,
      Self::Injure => EventKind::Injured,
      Self::Heal => EventKind::Healed,
      Self::Suspend => EventKind::Suspended,
      Self::Reinstate => EventKind::Reinstated,
      Self::Retire => EventKind::Retired,
      Self::Unretire => EventKind::Unretired,
      Self::Activate => EventKind::Activated,
      Self::Deactivate => EventKind::Deactivated,
    }
  }
}

impl fmt::Display for Transition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Changes ─────────────────────────────────────────────────────────────────

/// One row-level mutation a store must persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
  OpenPeriod {
    period_id: Uuid,
    kind:      PeriodKind,
    at:        DateTime<Utc>,
  },
  ClosePeriod {
    kind: PeriodKind,
    at:   DateTime<Utc>,
  },
  /// Move the start of a pending (not yet begun) open period.
  RestartPeriod {
    kind: PeriodKind,
    at:   DateTime<Utc>,
  },
  OpenReign {
    championship_id:    Uuid,
    champion:           ChampionRef,
    at:                 DateTime<Utc>,
    won_event_match_id: Option<Uuid>,
  },
  CloseReign {
    championship_id: Uuid,
    at:              DateTime<Utc>,
  },
}

/// A validated operation, ready to be persisted.
#[derive(Debug, Clone)]
pub struct Plan {
  pub changes: Vec<Change>,
  pub events:  Vec<DomainEvent>,
  /// The entity's history with `changes` applied.
  pub after:   EntityHistory,
}

impl Plan {
  fn build(
    before: &EntityHistory,
    changes: Vec<Change>,
    events: Vec<DomainEvent>,
  ) -> Result<Self> {
    let mut after = before.clone();
    after.apply_all(&changes)?;
    Ok(Self { changes, events, after })
  }

  pub fn is_empty(&self) -> bool { self.changes.is_empty() }
}

// ─── Transition planning ─────────────────────────────────────────────────────

/// Plan `transition` for the entity in `history` at `at`.
pub fn plan(
  history: &EntityHistory,
  transition: Transition,
  at: DateTime<Utc>,
) -> Result<Plan> {
  let entity = &history.entity;
  let entity_id = entity.entity_id;
  if entity.is_deleted() {
    return Err(Error::EntityDeleted(entity_id));
  }

  let entity_type = entity.entity_type;
  if !entity_type.supports(transition.kind()) {
    return Err(Error::UnsupportedKind { entity_type, kind: transition.kind() });
  }

  let tenure = entity_type.tenure_kind();
  let status = resolve(history, at).status;
  let restarting = matches!(transition, Transition::Employ | Transition::Activate)
    && status == Status::FutureEmployment;
  check_in_order(history, transition.as_str(), at, restarting.then_some(tenure))?;

  let reject = || Error::InvalidTransition {
    entity_id,
    operation: transition.as_str(),
    status,
  };
  let has_open = |kind: PeriodKind| history.open_period(kind).is_some();

  let mut changes = Vec::new();
  let mut events = vec![DomainEvent::new(transition.event_kind(), entity_id, at)];

  match transition {
    Transition::Employ | Transition::Activate => match status {
      Status::Unemployed | Status::Released => {
        changes.push(open(tenure, at));
      }
      Status::FutureEmployment => {
        changes.push(Change::RestartPeriod { kind: tenure, at });
      }
      _ => return Err(reject()),
    },

    Transition::Release | Transition::Deactivate => {
      if !status.is_employed() || has_open(PeriodKind::Retirement) {
        return Err(reject());
      }
      close_side_periods(history, at, &mut changes);
      changes.push(Change::ClosePeriod { kind: tenure, at });
      vacate_on_exit(history, at, &mut changes, &mut events);
    }

    Transition::Injure | Transition::Suspend => {
      if status != Status::Active {
        return Err(reject());
      }
      changes.push(open(transition.kind(), at));
    }

    Transition::Heal | Transition::Reinstate => {
      if !has_open(transition.kind()) {
        return Err(reject());
      }
      changes.push(Change::ClosePeriod { kind: transition.kind(), at });
    }

    Transition::Retire => {
      if !status.is_employed() {
        return Err(reject());
      }
      close_side_periods(history, at, &mut changes);
      changes.push(Change::ClosePeriod { kind: tenure, at });
      changes.push(open(PeriodKind::Retirement, at));
      vacate_on_exit(history, at, &mut changes, &mut events);
    }

    Transition::Unretire => {
      if !has_open(PeriodKind::Retirement) {
        return Err(reject());
      }
      changes.push(Change::ClosePeriod { kind: PeriodKind::Retirement, at });
      changes.push(open(tenure, at));
    }
  }

  Plan::build(history, changes, events)
}

/// Histories only grow forwards: `at` may not precede any recorded boundary,
/// except the start of a pending `restart` period.
fn check_in_order(
  history: &EntityHistory,
  operation: &'static str,
  at: DateTime<Utc>,
  restart: Option<PeriodKind>,
) -> Result<()> {
  match history.latest_boundary(restart) {
    Some(latest) if at < latest => Err(Error::OutOfOrder {
      entity_id: history.entity_id(),
      operation,
      at,
      latest,
    }),
    _ => Ok(()),
  }
}

fn open(kind: PeriodKind, at: DateTime<Utc>) -> Change {
  Change::OpenPeriod { period_id: Uuid::new_v4(), kind, at }
}

/// Injuries and suspensions end when the tenure they belong to ends.
fn close_side_periods(
  history: &EntityHistory,
  at: DateTime<Utc>,
  changes: &mut Vec<Change>,
) {
  for kind in [PeriodKind::Injury, PeriodKind::Suspension] {
    if history.open_period(kind).is_some() {
      changes.push(Change::ClosePeriod { kind, at });
    }
  }
}

/// A title leaving active competition loses its champion.
fn vacate_on_exit(
  history: &EntityHistory,
  at: DateTime<Utc>,
  changes: &mut Vec<Change>,
  events: &mut Vec<DomainEvent>,
) {
  if let Some(reign) = history.open_reign() {
    changes.push(Change::CloseReign { championship_id: reign.championship_id, at });
    events.push(DomainEvent::new(EventKind::TitleVacated, history.entity_id(), at));
  }
}

// ─── Championship planning ───────────────────────────────────────────────────

fn check_title(title: &EntityHistory) -> Result<()> {
  let entity = &title.entity;
  if entity.entity_type != EntityType::Title {
    return Err(Error::NotATitle(entity.entity_id));
  }
  if entity.is_deleted() {
    return Err(Error::EntityDeleted(entity.entity_id));
  }
  Ok(())
}

/// Plan a title changing hands to `champion` at `at`.
///
/// `holder` is the entity `champion` refers to, as loaded by the store.
pub fn plan_championship_change(
  title: &EntityHistory,
  holder: &Entity,
  champion: ChampionRef,
  at: DateTime<Utc>,
  won_event_match_id: Option<Uuid>,
) -> Result<Plan> {
  check_title(title)?;
  check_in_order(title, "record_championship_change", at, None)?;
  let title_id = title.entity_id();

  if holder.entity_id != champion.champion_id
    || holder.entity_type != champion.champion_type.entity_type()
  {
    return Err(Error::InvalidChampion(champion.champion_id));
  }
  if holder.is_deleted() {
    return Err(Error::EntityDeleted(holder.entity_id));
  }

  let status = resolve(title, at).status;
  if status != Status::Active {
    return Err(Error::InvalidTransition {
      entity_id: title_id,
      operation: "record_championship_change",
      status,
    });
  }

  let mut changes = Vec::new();
  if let Some(reign) = title.open_reign() {
    if reign.champion == champion {
      return Err(Error::ChampionUnchanged(champion.champion_id));
    }
    changes.push(Change::CloseReign { championship_id: reign.championship_id, at });
  }
  changes.push(Change::OpenReign {
    championship_id: Uuid::new_v4(),
    champion,
    at,
    won_event_match_id,
  });

  let events = vec![DomainEvent::new(EventKind::ChampionshipChanged, title_id, at)];
  Plan::build(title, changes, events)
}

/// Plan vacating a title at `at`. An already vacant title yields an empty
/// plan.
pub fn plan_vacate(title: &EntityHistory, at: DateTime<Utc>) -> Result<Plan> {
  check_title(title)?;
  check_in_order(title, "vacate", at, None)?;

  let mut changes = Vec::new();
  let mut events = Vec::new();
  vacate_on_exit(title, at, &mut changes, &mut events);
  Plan::build(title, changes, events)
}

// ─── Soft deletion ───────────────────────────────────────────────────────────

/// Check that `entity` can be soft-deleted and return the event to publish.
pub fn check_delete(history: &EntityHistory, at: DateTime<Utc>) -> Result<DomainEvent> {
  let entity = &history.entity;
  if entity.is_deleted() {
    return Err(Error::InvalidTransition {
      entity_id: entity.entity_id,
      operation: "delete",
      status:    resolve(history, at).status,
    });
  }
  Ok(DomainEvent::new(EventKind::Deleted, entity.entity_id, at))
}

/// Check that `entity` can be restored and return the event to publish.
pub fn check_restore(history: &EntityHistory, at: DateTime<Utc>) -> Result<DomainEvent> {
  let entity = &history.entity;
  if !entity.is_deleted() {
    return Err(Error::InvalidTransition {
      entity_id: entity.entity_id,
      operation: "restore",
      status:    resolve(history, at).status,
    });
  }
  Ok(DomainEvent::new(EventKind::Restored, entity.entity_id, at))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::status::resolve_title;

  fn at(month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap()
  }

  fn entity(entity_type: EntityType) -> Entity {
    Entity {
      entity_id: Uuid::new_v4(),
      entity_type,
      name: "Test".into(),
      created_at: at(1),
      deleted_at: None,
    }
  }

  fn history(entity_type: EntityType) -> EntityHistory {
    EntityHistory::new(entity(entity_type))
  }

  fn run(h: &mut EntityHistory, transition: Transition, month: u32) -> Result<Plan> {
    let plan = plan(h, transition, at(month))?;
    *h = plan.after.clone();
    Ok(plan)
  }

  fn status(h: &EntityHistory, month: u32) -> Status { resolve(h, at(month)).status }

  #[test]
  fn employ_injure_heal_retire_scenario() {
    let mut w = history(EntityType::Wrestler);
    assert_eq!(status(&w, 1), Status::Unemployed);

    run(&mut w, Transition::Employ, 1).unwrap();
    assert!(resolve(&w, at(1)).bookable);

    run(&mut w, Transition::Injure, 2).unwrap();
    assert_eq!(status(&w, 2), Status::Injured);
    assert!(!resolve(&w, at(2)).bookable);

    run(&mut w, Transition::Heal, 3).unwrap();
    assert_eq!(status(&w, 3), Status::Active);
    assert!(resolve(&w, at(3)).bookable);

    run(&mut w, Transition::Retire, 4).unwrap();
    let s = resolve(&w, at(4));
    assert_eq!(s.status, Status::Retired);
    assert!(!s.bookable);

    let employment: Vec<_> = w.periods_for(PeriodKind::Employment).collect();
    assert_eq!(employment.len(), 1);
    assert_eq!(employment[0].ended_at, Some(at(4)));
  }

  #[test]
  fn employ_release_employ_yields_two_periods() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Release, 2).unwrap();
    run(&mut w, Transition::Employ, 3).unwrap();

    let employment: Vec<_> = w.periods_for(PeriodKind::Employment).collect();
    assert_eq!(employment.len(), 2);
    assert_eq!(employment[0].ended_at, Some(at(2)));
    assert!(employment[1].is_open());
    assert!(employment[1].started_at >= at(2));
  }

  #[test]
  fn retire_while_injured_closes_both_periods() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Injure, 2).unwrap();
    let plan = run(&mut w, Transition::Retire, 3).unwrap();

    assert!(plan.changes.contains(&Change::ClosePeriod { kind: PeriodKind::Injury, at: at(3) }));
    assert!(plan.changes.contains(&Change::ClosePeriod { kind: PeriodKind::Employment, at: at(3) }));
    assert!(w.open_period(PeriodKind::Injury).is_none());
    assert!(w.open_period(PeriodKind::Employment).is_none());

    let s = resolve(&w, at(3));
    assert_eq!(s.status, Status::Retired);
    assert!(!s.bookable);
  }

  #[test]
  fn unretire_returns_to_active() {
    let mut w = history(EntityType::Referee);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Retire, 2).unwrap();
    run(&mut w, Transition::Unretire, 3).unwrap();

    let s = resolve(&w, at(3));
    assert_eq!(s.status, Status::Active);
    assert!(s.bookable);
  }

  #[test]
  fn suspending_twice_fails() {
    let mut w = history(EntityType::Manager);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Suspend, 2).unwrap();

    let err = run(&mut w, Transition::Suspend, 3).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { operation: "suspend", status: Status::Suspended, .. }
    ));
  }

  #[test]
  fn release_closes_open_suspension() {
    let mut t = history(EntityType::TagTeam);
    run(&mut t, Transition::Employ, 1).unwrap();
    run(&mut t, Transition::Suspend, 2).unwrap();
    run(&mut t, Transition::Release, 3).unwrap();

    assert!(t.open_period(PeriodKind::Suspension).is_none());
    assert_eq!(status(&t, 4), Status::Released);
  }

  #[test]
  fn cannot_release_retired_or_unemployed() {
    let mut w = history(EntityType::Wrestler);
    let err = run(&mut w, Transition::Release, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { status: Status::Unemployed, .. }));

    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Retire, 2).unwrap();
    let err = run(&mut w, Transition::Release, 3).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { status: Status::Retired, .. }));
  }

  #[test]
  fn injured_entity_cannot_be_suspended() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Injure, 2).unwrap();
    assert!(run(&mut w, Transition::Suspend, 3).is_err());
    assert!(run(&mut w, Transition::Injure, 3).is_err());
  }

  #[test]
  fn heal_requires_open_injury() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    let err = run(&mut w, Transition::Heal, 2).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { operation: "heal", .. }));
  }

  #[test]
  fn employing_future_employment_moves_the_start() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 9).unwrap();
    assert_eq!(status(&w, 3), Status::FutureEmployment);

    let plan = run(&mut w, Transition::Employ, 3).unwrap();
    assert!(matches!(plan.changes[..], [Change::RestartPeriod { .. }]));
    assert_eq!(w.periods_for(PeriodKind::Employment).count(), 1);
    assert_eq!(status(&w, 3), Status::Active);
  }

  #[test]
  fn unsupported_transitions_are_rejected() {
    let mut stable = history(EntityType::Stable);
    let err = run(&mut stable, Transition::Injure, 1).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKind { kind: PeriodKind::Injury, .. }));

    let err = run(&mut stable, Transition::Employ, 1).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKind { kind: PeriodKind::Employment, .. }));

    let mut wrestler = history(EntityType::Wrestler);
    let err = run(&mut wrestler, Transition::Activate, 1).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKind { kind: PeriodKind::Activation, .. }));
  }

  #[test]
  fn deleted_entities_reject_transitions() {
    let mut w = history(EntityType::Wrestler);
    w.entity.deleted_at = Some(at(1));
    let err = run(&mut w, Transition::Employ, 2).unwrap_err();
    assert!(matches!(err, Error::EntityDeleted(_)));
  }

  #[test]
  fn retire_before_a_pending_injury_is_rejected() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Injure, 5).unwrap();

    // Active as of month 3, but the injury recorded for month 5 is already
    // on file.
    let before = w.periods().to_vec();
    let err = run(&mut w, Transition::Retire, 3).unwrap_err();
    assert_eq!(err, Error::OutOfOrder {
      entity_id: w.entity_id(),
      operation: "retire",
      at:        at(3),
      latest:    at(5),
    });
    assert_eq!(w.periods(), &before[..]);
  }

  #[test]
  fn suspension_cannot_be_backdated_into_a_finished_career() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Retire, 6).unwrap();

    let err = run(&mut w, Transition::Suspend, 3).unwrap_err();
    assert!(matches!(err, Error::OutOfOrder { operation: "suspend", .. }));
    assert!(w.open_period(PeriodKind::Suspension).is_none());

    run(&mut w, Transition::Unretire, 8).unwrap();
    let s = resolve(&w, at(8));
    assert_eq!(s.status, Status::Active);
    assert!(s.bookable);
  }

  #[test]
  fn suspension_cannot_be_backdated_under_an_injury() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Injure, 5).unwrap();

    let err = run(&mut w, Transition::Suspend, 3).unwrap_err();
    assert!(matches!(err, Error::OutOfOrder { .. }));
    assert!(w.open_period(PeriodKind::Injury).is_some());
    assert!(w.open_period(PeriodKind::Suspension).is_none());
  }

  #[test]
  fn same_instant_follow_ups_are_in_order() {
    let mut w = history(EntityType::Wrestler);
    run(&mut w, Transition::Employ, 1).unwrap();
    run(&mut w, Transition::Release, 2).unwrap();
    run(&mut w, Transition::Employ, 2).unwrap();
    assert_eq!(status(&w, 2), Status::Active);
  }

  #[test]
  fn emits_one_event_per_transition() {
    let mut w = history(EntityType::Wrestler);
    let plan = run(&mut w, Transition::Employ, 1).unwrap();
    assert_eq!(plan.events.len(), 1);
    assert_eq!(plan.events[0].tag(), "EntityEmployed");
    assert_eq!(plan.events[0].entity_id, w.entity_id());
  }

  // ── Titles ──────────────────────────────────────────────────────────────

  fn active_title() -> EntityHistory {
    let mut t = history(EntityType::Title);
    run(&mut t, Transition::Activate, 1).unwrap();
    t
  }

  fn crown(
    title: &mut EntityHistory,
    holder: &Entity,
    champion: ChampionRef,
    month: u32,
  ) -> Result<Plan> {
    let plan = plan_championship_change(title, holder, champion, at(month), None)?;
    *title = plan.after.clone();
    Ok(plan)
  }

  #[test]
  fn title_changes_hands() {
    let mut t = active_title();
    let w1 = entity(EntityType::Wrestler);
    let tt1 = entity(EntityType::TagTeam);

    crown(&mut t, &w1, ChampionRef::wrestler(w1.entity_id), 2).unwrap();
    assert_eq!(t.open_reign().unwrap().champion.champion_id, w1.entity_id);

    let plan = crown(&mut t, &tt1, ChampionRef::tag_team(tt1.entity_id), 6).unwrap();
    assert_eq!(plan.events[0].tag(), "ChampionshipChanged");

    let reigns = t.reigns();
    assert_eq!(reigns.len(), 2);
    assert_eq!(reigns[0].lost_at, Some(at(6)));
    assert_eq!(reigns[1].won_at, at(6));
    assert_eq!(reigns[1].champion, ChampionRef::tag_team(tt1.entity_id));
  }

  #[test]
  fn championship_change_on_inactive_title_fails() {
    let mut t = history(EntityType::Title);
    let w = entity(EntityType::Wrestler);
    let err = crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 2).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { status: Status::Unemployed, .. }));
  }

  #[test]
  fn championship_change_validates_champion() {
    let mut t = active_title();
    let w = entity(EntityType::Wrestler);

    let err = crown(&mut t, &w, ChampionRef::tag_team(w.entity_id), 2).unwrap_err();
    assert!(matches!(err, Error::InvalidChampion(_)));

    crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 2).unwrap();
    let err = crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 3).unwrap_err();
    assert!(matches!(err, Error::ChampionUnchanged(_)));
  }

  #[test]
  fn championship_change_must_follow_current_reign() {
    let mut t = active_title();
    let w1 = entity(EntityType::Wrestler);
    let w2 = entity(EntityType::Wrestler);
    crown(&mut t, &w1, ChampionRef::wrestler(w1.entity_id), 5).unwrap();

    let err = crown(&mut t, &w2, ChampionRef::wrestler(w2.entity_id), 5).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { kind: PeriodKind::Reign, .. }));
    assert_eq!(t.reigns().len(), 1);
  }

  #[test]
  fn title_cannot_change_hands_before_its_deactivation() {
    let mut t = active_title();
    run(&mut t, Transition::Deactivate, 6).unwrap();
    let w = entity(EntityType::Wrestler);

    let err = crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 3).unwrap_err();
    assert!(matches!(
      err,
      Error::OutOfOrder { operation: "record_championship_change", .. }
    ));
    assert!(t.reigns().is_empty());
    assert_eq!(resolve_title(&t, at(7)).champion, None);
  }

  #[test]
  fn vacate_cannot_precede_the_current_reign() {
    let mut t = active_title();
    let w = entity(EntityType::Wrestler);
    crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 4).unwrap();

    let err = plan_vacate(&t, at(2)).unwrap_err();
    assert!(matches!(err, Error::OutOfOrder { operation: "vacate", .. }));
    assert!(t.open_reign().is_some());
  }

  #[test]
  fn retiring_a_title_vacates_it() {
    let mut t = active_title();
    let w = entity(EntityType::Wrestler);
    crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 2).unwrap();

    let plan = run(&mut t, Transition::Retire, 4).unwrap();
    let tags: Vec<_> = plan.events.iter().map(|e| e.tag()).collect();
    assert_eq!(tags, ["EntityRetired", "TitleVacated"]);
    assert!(t.open_reign().is_none());
    assert_eq!(status(&t, 4), Status::Retired);
  }

  #[test]
  fn vacate_closes_reign_but_keeps_title_active() {
    let mut t = active_title();
    let w = entity(EntityType::Wrestler);
    crown(&mut t, &w, ChampionRef::wrestler(w.entity_id), 2).unwrap();

    let plan = plan_vacate(&t, at(3)).unwrap();
    assert_eq!(plan.changes.len(), 1);
    t = plan.after;
    assert!(t.open_reign().is_none());
    assert_eq!(status(&t, 3), Status::Active);

    assert!(plan_vacate(&t, at(4)).unwrap().is_empty());
  }

  #[test]
  fn non_titles_cannot_hold_reigns() {
    let w = history(EntityType::Wrestler);
    let err = plan_vacate(&w, at(1)).unwrap_err();
    assert!(matches!(err, Error::NotATitle(_)));
  }

  #[test]
  fn delete_and_restore_checks() {
    let mut w = history(EntityType::Wrestler);
    assert!(check_restore(&w, at(1)).is_err());
    assert_eq!(check_delete(&w, at(1)).unwrap().tag(), "EntityDeleted");

    w.entity.deleted_at = Some(at(1));
    assert!(check_delete(&w, at(2)).is_err());
    assert_eq!(check_restore(&w, at(2)).unwrap().tag(), "EntityRestored");
  }

  #[test]
  fn changes_serialize_with_a_tag() {
    let change = Change::ClosePeriod { kind: PeriodKind::Injury, at: at(2) };
    let json = serde_json::to_value(change).unwrap();
    assert_eq!(json["change"], "close_period");
    assert_eq!(json["kind"], "injury");
    assert_eq!(serde_json::from_value::<Change>(json).unwrap(), change);
  }
}
