//! Status resolution: deriving an entity's current status from its periods.
//!
//! Status is never stored. It is computed from the whole history as of a
//! point in time, so the same history always resolves the same way.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  championship::{ChampionRef, Championship},
  history::EntityHistory,
  period::PeriodKind,
};

/// The single externally visible status of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  /// No employment (or activation) history at all.
  Unemployed,
  /// Employment is scheduled to begin after the resolution instant.
  FutureEmployment,
  Active,
  Injured,
  Suspended,
  Retired,
  /// Has employment history, but the latest period has ended.
  Released,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Unemployed => "unemployed",
      Self::FutureEmployment => "future_employment",
      Self::Active => "active",
      Self::Injured => "injured",
      Self::Suspended => "suspended",
      Self::Retired => "retired",
      Self::Released => "released",
    }
  }

  /// Currently employed in some form: active, injured or suspended.
  pub fn is_employed(self) -> bool {
    matches!(self, Self::Active | Self::Injured | Self::Suspended)
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Display status plus booking eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeStatus {
  pub status:   Status,
  pub bookable: bool,
}

/// Resolve the status of `history` as of `as_of`.
///
/// Precedence, highest first: retired, suspended, injured, active. Retiring
/// closes the tenure period, so retirement is checked before tenure.
pub fn resolve(history: &EntityHistory, as_of: DateTime<Utc>) -> CompositeStatus {
  let entity_type = history.entity.entity_type;
  let tenure = entity_type.tenure_kind();

  let status = if history.current_period(PeriodKind::Retirement, as_of).is_some() {
    Status::Retired
  } else if history.periods_for(tenure).next().is_none() {
    Status::Unemployed
  } else if history.current_period(tenure, as_of).is_some() {
    if history.current_period(PeriodKind::Suspension, as_of).is_some() {
      Status::Suspended
    } else if entity_type.is_individual()
      && history.current_period(PeriodKind::Injury, as_of).is_some()
    {
      Status::Injured
    } else {
      Status::Active
    }
  } else if history.periods_for(tenure).any(|p| p.starts_after(as_of)) {
    Status::FutureEmployment
  } else {
    Status::Released
  };

  CompositeStatus { status, bookable: status == Status::Active }
}

/// Whether the entity may be booked as of `as_of`.
pub fn is_bookable(history: &EntityHistory, as_of: DateTime<Utc>) -> bool {
  resolve(history, as_of).bookable
}

/// A title's lifecycle status plus its independent vacancy axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleStatus {
  pub status:   CompositeStatus,
  pub champion: Option<ChampionRef>,
  pub reign:    Option<Championship>,
}

impl TitleStatus {
  pub fn is_vacant(&self) -> bool { self.champion.is_none() }
}

pub fn resolve_title(history: &EntityHistory, as_of: DateTime<Utc>) -> TitleStatus {
  let reign = history.current_reign(as_of).cloned();
  TitleStatus {
    status: resolve(history, as_of),
    champion: reign.as_ref().map(|r| r.champion),
    reign,
  }
}
