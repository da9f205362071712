//! Entities: roster members and bookable assets.
//!
//! An entity holds only identity metadata. Everything that changes over time
//! (employment, injuries, reigns, ...) lives in period records and is derived
//! on read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::PeriodKind;

/// The kind of entity a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
  Wrestler,
  TagTeam,
  Manager,
  Referee,
  Stable,
  Title,
}

impl EntityType {
  pub const ALL: [EntityType; 6] = [
    Self::Wrestler,
    Self::TagTeam,
    Self::Manager,
    Self::Referee,
    Self::Stable,
    Self::Title,
  ];

  /// The period kind that decides whether the entity is on the roster at all.
  pub fn tenure_kind(self) -> PeriodKind {
    match self {
      Self::Wrestler | Self::TagTeam | Self::Manager | Self::Referee => {
        PeriodKind::Employment
      }
      Self::Stable | Self::Title => PeriodKind::Activation,
    }
  }

  /// Individual people can be injured; teams, stables and titles cannot.
  pub fn is_individual(self) -> bool {
    matches!(self, Self::Wrestler | Self::Manager | Self::Referee)
  }

  pub fn supports(self, kind: PeriodKind) -> bool {
    match kind {
      PeriodKind::Employment | PeriodKind::Activation => {
        self.tenure_kind() == kind
      }
      PeriodKind::Injury => self.is_individual(),
      PeriodKind::Suspension => self != Self::Title,
      PeriodKind::Retirement => true,
      PeriodKind::Reign => self == Self::Title,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Wrestler => "wrestler",
      Self::TagTeam => "tag_team",
      Self::Manager => "manager",
      Self::Referee => "referee",
      Self::Stable => "stable",
      Self::Title => "title",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }
}

impl fmt::Display for EntityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A named roster member or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
  pub entity_id:   Uuid,
  pub entity_type: EntityType,
  pub name:        String,
  pub created_at:  DateTime<Utc>,
  /// Set while the entity is soft-deleted; its history is kept intact.
  pub deleted_at:  Option<DateTime<Utc>>,
}

impl Entity {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Input to [`crate::store::RosterStore::add_entity`].
#[derive(Debug, Clone)]
pub struct NewEntity {
  pub entity_type: EntityType,
  pub name:        String,
}

impl NewEntity {
  pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
    Self { entity_type, name: name.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn period_kinds_per_entity_type() {
    use PeriodKind::*;

    for t in [EntityType::Wrestler, EntityType::Manager, EntityType::Referee] {
      assert!(t.supports(Employment));
      assert!(t.supports(Injury));
      assert!(t.supports(Suspension));
      assert!(t.supports(Retirement));
      assert!(!t.supports(Activation));
    }

    assert!(EntityType::TagTeam.supports(Employment));
    assert!(EntityType::TagTeam.supports(Suspension));
    assert!(!EntityType::TagTeam.supports(Injury));

    assert!(EntityType::Stable.supports(Activation));
    assert!(EntityType::Stable.supports(Suspension));
    assert!(!EntityType::Stable.supports(Employment));
    assert!(!EntityType::Stable.supports(Injury));

    assert!(EntityType::Title.supports(Activation));
    assert!(EntityType::Title.supports(Retirement));
    assert!(!EntityType::Title.supports(Suspension));
    assert!(!EntityType::Title.supports(Injury));
  }

  #[test]
  fn entity_type_parse_matches_as_str() {
    for t in EntityType::ALL {
      assert_eq!(EntityType::parse(t.as_str()), Some(t));
    }
    assert_eq!(EntityType::parse("promoter"), None);
  }
}
