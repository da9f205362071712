//! Error types for `ringside-core`.
//!
//! Every variant is an expected outcome of invalid business input. None of
//! them leave partial state behind; callers can match on the variant to
//! render a precise message.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{entity::EntityType, period::PeriodKind, status::Status};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("entity {entity_id} already has an open {kind} period")]
  OverlappingPeriod { entity_id: Uuid, kind: PeriodKind },

  #[error("entity {entity_id} has no open {kind} period")]
  NoOpenPeriod { entity_id: Uuid, kind: PeriodKind },

  #[error("{kind} period cannot end at {ended_at} before it started at {started_at}")]
  InvalidRange {
    kind:       PeriodKind,
    started_at: DateTime<Utc>,
    ended_at:   DateTime<Utc>,
  },

  #[error("cannot {operation} entity {entity_id} while it is {status}")]
  InvalidTransition {
    entity_id: Uuid,
    operation: &'static str,
    status:    Status,
  },

  #[error("cannot {operation} entity {entity_id} at {at}: its history already reaches {latest}")]
  OutOfOrder {
    entity_id: Uuid,
    operation: &'static str,
    at:        DateTime<Utc>,
    latest:    DateTime<Utc>,
  },

  #[error("{entity_type} entities do not support {kind} periods")]
  UnsupportedKind {
    entity_type: EntityType,
    kind:        PeriodKind,
  },

  #[error("entity not found: {0}")]
  EntityNotFound(Uuid),

  #[error("entity {0} is deleted")]
  EntityDeleted(Uuid),

  #[error("entity {0} is not a title")]
  NotATitle(Uuid),

  #[error("{0} cannot hold a championship")]
  InvalidChampion(Uuid),

  #[error("{0} already holds this title")]
  ChampionUnchanged(Uuid),
}

impl Error {
  /// Short machine-readable name of the violated precondition.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::OverlappingPeriod { .. } => "overlapping_period",
      Self::NoOpenPeriod { .. } => "no_open_period",
      Self::InvalidRange { .. } => "invalid_range",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::OutOfOrder { .. } => "out_of_order",
      Self::UnsupportedKind { .. } => "unsupported_kind",
      Self::EntityNotFound(_) => "entity_not_found",
      Self::EntityDeleted(_) => "entity_deleted",
      Self::NotATitle(_) => "not_a_title",
      Self::InvalidChampion(_) => "invalid_champion",
      Self::ChampionUnchanged(_) => "champion_unchanged",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
