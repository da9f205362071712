//! Periods: time ranges during which a fact about an entity held.
//!
//! A period with no `ended_at` is open: it is still in effect. Periods are
//! never deleted; closing one only sets its end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a period records about its entity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
  Employment,
  Activation,
  Injury,
  Suspension,
  Retirement,
  /// A championship reign. Reigns carry a champion and live in the
  /// championship ledger rather than the plain period table.
  Reign,
}

impl PeriodKind {
  pub const LIFECYCLE: [PeriodKind; 5] = [
    Self::Employment,
    Self::Activation,
    Self::Injury,
    Self::Suspension,
    Self::Retirement,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Employment => "employment",
      Self::Activation => "activation",
      Self::Injury => "injury",
      Self::Suspension => "suspension",
      Self::Retirement => "retirement",
      Self::Reign => "reign",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "employment" => Some(Self::Employment),
      "activation" => Some(Self::Activation),
      "injury" => Some(Self::Injury),
      "suspension" => Some(Self::Suspension),
      "retirement" => Some(Self::Retirement),
      "reign" => Some(Self::Reign),
      _ => None,
    }
  }
}

impl fmt::Display for PeriodKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One `[started_at, ended_at?)` interval of a given kind for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub period_id:  Uuid,
  pub entity_id:  Uuid,
  pub kind:       PeriodKind,
  pub started_at: DateTime<Utc>,
  pub ended_at:   Option<DateTime<Utc>>,
}

impl Period {
  pub fn is_open(&self) -> bool { self.ended_at.is_none() }

  /// Whether the period is in effect at `as_of`.
  pub fn is_current(&self, as_of: DateTime<Utc>) -> bool {
    self.started_at <= as_of && self.ended_at.is_none_or(|end| end > as_of)
  }

  pub fn starts_after(&self, as_of: DateTime<Utc>) -> bool {
    self.started_at > as_of
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
  }

  fn period(started: u32, ended: Option<u32>) -> Period {
    Period {
      period_id:  Uuid::new_v4(),
      entity_id:  Uuid::new_v4(),
      kind:       PeriodKind::Injury,
      started_at: at(started),
      ended_at:   ended.map(at),
    }
  }

  #[test]
  fn open_period_is_current_from_its_start() {
    let p = period(10, None);
    assert!(p.is_open());
    assert!(!p.is_current(at(9)));
    assert!(p.is_current(at(10)));
    assert!(p.is_current(at(30)));
  }

  #[test]
  fn closed_period_is_current_until_its_end() {
    let p = period(10, Some(20));
    assert!(!p.is_open());
    assert!(p.is_current(at(19)));
    assert!(!p.is_current(at(20)));
  }

  #[test]
  fn kind_parse_matches_as_str() {
    for kind in PeriodKind::LIFECYCLE {
      assert_eq!(PeriodKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(PeriodKind::parse("reign"), Some(PeriodKind::Reign));
    assert_eq!(PeriodKind::parse("vacation"), None);
  }
}
