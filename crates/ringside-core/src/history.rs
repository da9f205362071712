//! [`EntityHistory`]: the complete period record of one entity.
//!
//! This is the in-memory form of the period store contract: storage backends
//! load a history, apply changes to it (which validates every invariant), and
//! only then persist the same changes. A history therefore never holds two
//! open periods of one kind, a period ending before it starts, or two
//! overlapping reigns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  championship::{ChampionRef, Championship},
  entity::Entity,
  lifecycle::Change,
  period::{Period, PeriodKind},
};

#[derive(Debug, Clone)]
pub struct EntityHistory {
  pub entity: Entity,
  /// Sorted by `started_at`; closed periods sort before an open one starting
  /// at the same instant, then insertion order.
  periods:    Vec<Period>,
  /// Sorted by `won_at`. Always empty for anything but a title.
  reigns:     Vec<Championship>,
}

impl EntityHistory {
  pub fn new(entity: Entity) -> Self {
    Self { entity, periods: Vec::new(), reigns: Vec::new() }
  }

  /// Rebuild a history from persisted rows. Rows are taken as-is; they were
  /// validated when they were written.
  pub fn from_records(
    entity: Entity,
    mut periods: Vec<Period>,
    mut reigns: Vec<Championship>,
  ) -> Self {
    periods.sort_by_key(|p| (p.started_at, p.is_open()));
    reigns.sort_by_key(|r| r.won_at);
    Self { entity, periods, reigns }
  }

  pub fn entity_id(&self) -> Uuid { self.entity.entity_id }

  pub fn periods(&self) -> &[Period] { &self.periods }

  /// All periods of `kind`, oldest first.
  pub fn periods_for(&self, kind: PeriodKind) -> impl Iterator<Item = &Period> {
    self.periods.iter().filter(move |p| p.kind == kind)
  }

  pub fn open_period(&self, kind: PeriodKind) -> Option<&Period> {
    self.periods_for(kind).find(|p| p.is_open())
  }

  pub fn current_period(
    &self,
    kind: PeriodKind,
    as_of: DateTime<Utc>,
  ) -> Option<&Period> {
    self.periods_for(kind).find(|p| p.is_current(as_of))
  }

  /// Reigns oldest first.
  pub fn reigns(&self) -> &[Championship] { &self.reigns }

  pub fn open_reign(&self) -> Option<&Championship> {
    self.reigns.iter().find(|r| r.is_open())
  }

  pub fn current_reign(&self, as_of: DateTime<Utc>) -> Option<&Championship> {
    self.reigns.iter().find(|r| r.is_current(as_of))
  }

  /// The latest instant at which any period or reign starts or ends.
  ///
  /// The start of an open period of kind `pending` is left out, since a
  /// pending start can still be moved earlier.
  pub fn latest_boundary(&self, pending: Option<PeriodKind>) -> Option<DateTime<Utc>> {
    let periods = self.periods.iter().flat_map(|p| {
      let movable = p.is_open() && Some(p.kind) == pending;
      (!movable).then_some(p.started_at).into_iter().chain(p.ended_at)
    });
    let reigns = self
      .reigns
      .iter()
      .flat_map(|r| std::iter::once(r.won_at).chain(r.lost_at));
    periods.chain(reigns).max()
  }

  // ── Period store operations ─────────────────────────────────────────────

  /// Open a new period of `kind` starting at `started_at`.
  pub fn add_period(
    &mut self,
    kind: PeriodKind,
    started_at: DateTime<Utc>,
  ) -> Result<&Period> {
    self.add_period_with_id(Uuid::new_v4(), kind, started_at)
  }

  pub fn add_period_with_id(
    &mut self,
    period_id: Uuid,
    kind: PeriodKind,
    started_at: DateTime<Utc>,
  ) -> Result<&Period> {
    self.check_supported(kind)?;

    let entity_id = self.entity_id();
    if self.open_period(kind).is_some() {
      return Err(Error::OverlappingPeriod { entity_id, kind });
    }
    let last_end = self.periods_for(kind).filter_map(|p| p.ended_at).max();
    if last_end.is_some_and(|end| started_at < end) {
      return Err(Error::OverlappingPeriod { entity_id, kind });
    }

    let period = Period { period_id, entity_id, kind, started_at, ended_at: None };
    let idx = self.periods.partition_point(|p| p.started_at <= started_at);
    self.periods.insert(idx, period);
    Ok(&self.periods[idx])
  }

  /// Close the open period of `kind` at `ended_at`.
  pub fn close_period(
    &mut self,
    kind: PeriodKind,
    ended_at: DateTime<Utc>,
  ) -> Result<&Period> {
    self.check_supported(kind)?;

    let entity_id = self.entity_id();
    let idx = self
      .periods
      .iter()
      .position(|p| p.kind == kind && p.is_open())
      .ok_or(Error::NoOpenPeriod { entity_id, kind })?;

    let period = &mut self.periods[idx];
    if ended_at < period.started_at {
      return Err(Error::InvalidRange {
        kind,
        started_at: period.started_at,
        ended_at,
      });
    }
    period.ended_at = Some(ended_at);
    Ok(&self.periods[idx])
  }

  /// Move the start of the open period of `kind` to `started_at`.
  pub fn restart_period(
    &mut self,
    kind: PeriodKind,
    started_at: DateTime<Utc>,
  ) -> Result<&Period> {
    self.check_supported(kind)?;

    let entity_id = self.entity_id();
    let last_end = self.periods_for(kind).filter_map(|p| p.ended_at).max();
    if last_end.is_some_and(|end| started_at < end) {
      return Err(Error::OverlappingPeriod { entity_id, kind });
    }

    let idx = self
      .periods
      .iter()
      .position(|p| p.kind == kind && p.is_open())
      .ok_or(Error::NoOpenPeriod { entity_id, kind })?;

    let mut period = self.periods.remove(idx);
    period.started_at = started_at;
    let idx = self.periods.partition_point(|p| p.started_at <= started_at);
    self.periods.insert(idx, period);
    Ok(&self.periods[idx])
  }

  fn check_supported(&self, kind: PeriodKind) -> Result<()> {
    let entity_type = self.entity.entity_type;
    if kind == PeriodKind::Reign || !entity_type.supports(kind) {
      return Err(Error::UnsupportedKind { entity_type, kind });
    }
    Ok(())
  }

  // ── Reign operations ────────────────────────────────────────────────────

  pub fn open_reign_with_id(
    &mut self,
    championship_id: Uuid,
    champion: ChampionRef,
    won_at: DateTime<Utc>,
    won_event_match_id: Option<Uuid>,
  ) -> Result<&Championship> {
    let title_id = self.entity_id();
    let kind = PeriodKind::Reign;
    if self.open_reign().is_some() {
      return Err(Error::OverlappingPeriod { entity_id: title_id, kind });
    }
    let last_lost = self.reigns.iter().filter_map(|r| r.lost_at).max();
    if last_lost.is_some_and(|lost| won_at < lost) {
      return Err(Error::OverlappingPeriod { entity_id: title_id, kind });
    }

    self.reigns.push(Championship {
      championship_id,
      title_id,
      champion,
      won_at,
      lost_at: None,
      won_event_match_id,
    });
    self.reigns.sort_by_key(|r| r.won_at);
    self
      .reigns
      .iter()
      .find(|r| r.championship_id == championship_id)
      .ok_or(Error::NoOpenPeriod { entity_id: title_id, kind })
  }

  /// End the open reign at `lost_at`; the reign must have begun strictly
  /// before that instant.
  pub fn close_reign(&mut self, lost_at: DateTime<Utc>) -> Result<&Championship> {
    let title_id = self.entity_id();
    let kind = PeriodKind::Reign;
    let idx = self
      .reigns
      .iter()
      .position(|r| r.is_open())
      .ok_or(Error::NoOpenPeriod { entity_id: title_id, kind })?;

    let reign = &mut self.reigns[idx];
    if lost_at <= reign.won_at {
      return Err(Error::InvalidRange {
        kind,
        started_at: reign.won_at,
        ended_at: lost_at,
      });
    }
    reign.lost_at = Some(lost_at);
    Ok(&self.reigns[idx])
  }

  // ── Planned changes ─────────────────────────────────────────────────────

  pub fn apply(&mut self, change: &Change) -> Result<()> {
    match *change {
      Change::OpenPeriod { period_id, kind, at } => {
        self.add_period_with_id(period_id, kind, at)?;
      }
      Change::ClosePeriod { kind, at } => {
        self.close_period(kind, at)?;
      }
      Change::RestartPeriod { kind, at } => {
        self.restart_period(kind, at)?;
      }
      Change::OpenReign { championship_id, champion, at, won_event_match_id } => {
        self.open_reign_with_id(championship_id, champion, at, won_event_match_id)?;
      }
      Change::CloseReign { at, .. } => {
        self.close_reign(at)?;
      }
    }
    Ok(())
  }

  /// Apply every change or none of them.
  pub fn apply_all(&mut self, changes: &[Change]) -> Result<()> {
    let mut staged = self.clone();
    for change in changes {
      staged.apply(change)?;
    }
    *self = staged;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::entity::EntityType;

  fn at(month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap()
  }

  fn history(entity_type: EntityType) -> EntityHistory {
    EntityHistory::new(Entity {
      entity_id: Uuid::new_v4(),
      entity_type,
      name: "Test".into(),
      created_at: at(1),
      deleted_at: None,
    })
  }

  #[test]
  fn add_period_rejects_second_open_period() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Employment, at(1)).unwrap();

    let err = h.add_period(PeriodKind::Employment, at(2)).unwrap_err();
    assert!(matches!(err, Error::OverlappingPeriod { kind: PeriodKind::Employment, .. }));
  }

  #[test]
  fn add_period_rejects_start_inside_closed_period() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Injury, at(1)).unwrap();
    h.close_period(PeriodKind::Injury, at(5)).unwrap();

    let err = h.add_period(PeriodKind::Injury, at(3)).unwrap_err();
    assert!(matches!(err, Error::OverlappingPeriod { .. }));

    h.add_period(PeriodKind::Injury, at(5)).unwrap();
    assert_eq!(h.periods_for(PeriodKind::Injury).count(), 2);
  }

  #[test]
  fn close_period_requires_an_open_period() {
    let mut h = history(EntityType::Referee);
    let err = h.close_period(PeriodKind::Suspension, at(2)).unwrap_err();
    assert!(matches!(err, Error::NoOpenPeriod { kind: PeriodKind::Suspension, .. }));
  }

  #[test]
  fn close_period_rejects_end_before_start() {
    let mut h = history(EntityType::Manager);
    h.add_period(PeriodKind::Employment, at(6)).unwrap();

    let err = h.close_period(PeriodKind::Employment, at(3)).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
    assert!(h.open_period(PeriodKind::Employment).is_some());
  }

  #[test]
  fn unsupported_kinds_are_rejected() {
    let mut h = history(EntityType::Stable);
    let err = h.add_period(PeriodKind::Injury, at(1)).unwrap_err();
    assert!(matches!(
      err,
      Error::UnsupportedKind { entity_type: EntityType::Stable, kind: PeriodKind::Injury }
    ));
  }

  #[test]
  fn periods_stay_ordered_by_start() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Employment, at(1)).unwrap();
    h.close_period(PeriodKind::Employment, at(2)).unwrap();
    h.add_period(PeriodKind::Employment, at(9)).unwrap();
    h.restart_period(PeriodKind::Employment, at(4)).unwrap();

    let starts: Vec<_> =
      h.periods_for(PeriodKind::Employment).map(|p| p.started_at).collect();
    assert_eq!(starts, vec![at(1), at(4)]);
  }

  #[test]
  fn reigns_cannot_overlap() {
    let mut h = history(EntityType::Title);
    let champ = ChampionRef::wrestler(Uuid::new_v4());
    h.open_reign_with_id(Uuid::new_v4(), champ, at(1), None).unwrap();

    let err = h
      .open_reign_with_id(Uuid::new_v4(), champ, at(2), None)
      .unwrap_err();
    assert!(matches!(err, Error::OverlappingPeriod { kind: PeriodKind::Reign, .. }));

    let err = h.close_reign(at(1)).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));

    h.close_reign(at(3)).unwrap();
    let err = h
      .open_reign_with_id(Uuid::new_v4(), champ, at(2), None)
      .unwrap_err();
    assert!(matches!(err, Error::OverlappingPeriod { .. }));
  }

  #[test]
  fn latest_boundary_spans_periods_and_reigns() {
    let mut h = history(EntityType::Title);
    assert_eq!(h.latest_boundary(None), None);

    h.add_period(PeriodKind::Activation, at(2)).unwrap();
    h.open_reign_with_id(Uuid::new_v4(), ChampionRef::wrestler(Uuid::new_v4()), at(3), None)
      .unwrap();
    assert_eq!(h.latest_boundary(None), Some(at(3)));

    h.close_reign(at(5)).unwrap();
    assert_eq!(h.latest_boundary(None), Some(at(5)));
  }

  #[test]
  fn latest_boundary_skips_a_pending_start() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Employment, at(1)).unwrap();
    h.close_period(PeriodKind::Employment, at(2)).unwrap();
    h.add_period(PeriodKind::Employment, at(9)).unwrap();

    assert_eq!(h.latest_boundary(None), Some(at(9)));
    assert_eq!(h.latest_boundary(Some(PeriodKind::Employment)), Some(at(2)));
  }

  #[test]
  fn from_records_puts_zero_length_period_first() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Injury, at(3)).unwrap();
    h.close_period(PeriodKind::Injury, at(3)).unwrap();
    h.add_period(PeriodKind::Injury, at(3)).unwrap();

    let mut rows = h.periods().to_vec();
    rows.reverse();
    let loaded = EntityHistory::from_records(h.entity.clone(), rows, Vec::new());
    let injuries: Vec<_> = loaded.periods_for(PeriodKind::Injury).collect();
    assert_eq!(injuries[0].ended_at, Some(at(3)));
    assert!(injuries[1].is_open());
  }

  #[test]
  fn apply_all_is_all_or_nothing() {
    let mut h = history(EntityType::Wrestler);
    h.add_period(PeriodKind::Employment, at(1)).unwrap();

    let changes = [
      Change::ClosePeriod { kind: PeriodKind::Employment, at: at(3) },
      Change::ClosePeriod { kind: PeriodKind::Injury, at: at(3) },
    ];
    assert!(h.apply_all(&changes).is_err());
    assert!(h.open_period(PeriodKind::Employment).is_some());
  }
}
