//! Composable filters for bulk listing.
//!
//! A [`Filter`] mirrors one outcome of the status resolver. Stores translate
//! each filter into a single set-membership test over their period rows;
//! [`Filter::matches`] is the reference semantics they must agree with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entity::EntityType,
  history::EntityHistory,
  status::{Status, resolve},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
  Bookable,
  Unemployed,
  FutureEmployed,
  Released,
  Suspended,
  Retired,
  Injured,
  /// Titles with no reign in effect.
  Vacant,
  /// Titles with at least one finished reign.
  Defended,
  /// Titles that have never had a champion.
  NewTitle,
}

impl Filter {
  pub const ALL: [Filter; 10] = [
    Self::Bookable,
    Self::Unemployed,
    Self::FutureEmployed,
    Self::Released,
    Self::Suspended,
    Self::Retired,
    Self::Injured,
    Self::Vacant,
    Self::Defended,
    Self::NewTitle,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Bookable => "bookable",
      Self::Unemployed => "unemployed",
      Self::FutureEmployed => "future_employed",
      Self::Released => "released",
      Self::Suspended => "suspended",
      Self::Retired => "retired",
      Self::Injured => "injured",
      Self::Vacant => "vacant",
      Self::Defended => "defended",
      Self::NewTitle => "new_title",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|f| f.as_str() == s)
  }

  /// Whether the filter can ever match an entity of `entity_type`.
  pub fn applies_to(self, entity_type: EntityType) -> bool {
    match self {
      Self::Injured => entity_type.is_individual(),
      Self::Vacant | Self::Defended | Self::NewTitle => {
        entity_type == EntityType::Title
      }
      _ => true,
    }
  }

  pub fn matches(self, history: &EntityHistory, as_of: DateTime<Utc>) -> bool {
    if !self.applies_to(history.entity.entity_type) {
      return false;
    }
    let status = resolve(history, as_of);
    match self {
      Self::Bookable => status.bookable,
      Self::Unemployed => status.status == Status::Unemployed,
      Self::FutureEmployed => status.status == Status::FutureEmployment,
      Self::Released => status.status == Status::Released,
      Self::Suspended => status.status == Status::Suspended,
      Self::Retired => status.status == Status::Retired,
      Self::Injured => status.status == Status::Injured,
      Self::Vacant => history.current_reign(as_of).is_none(),
      Self::Defended => history
        .reigns()
        .iter()
        .any(|r| r.lost_at.is_some_and(|lost| lost <= as_of)),
      Self::NewTitle => history.reigns().iter().all(|r| r.won_at > as_of),
    }
  }
}

/// A conjunction of filters, optionally restricted to one entity type.
///
/// ```rust,ignore
/// let q = EntityQuery::of_type(EntityType::Wrestler).bookable();
/// let ids = store.query(&q, Utc::now()).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityQuery {
  pub entity_type:  Option<EntityType>,
  pub filters:      Vec<Filter>,
  /// Include soft-deleted entities.
  pub with_trashed: bool,
}

impl EntityQuery {
  pub fn all() -> Self { Self::default() }

  pub fn of_type(entity_type: EntityType) -> Self {
    Self { entity_type: Some(entity_type), ..Self::default() }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    if !self.filters.contains(&filter) {
      self.filters.push(filter);
    }
    self
  }

  pub fn bookable(self) -> Self { self.filter(Filter::Bookable) }

  pub fn unemployed(self) -> Self { self.filter(Filter::Unemployed) }

  pub fn future_employed(self) -> Self { self.filter(Filter::FutureEmployed) }

  pub fn released(self) -> Self { self.filter(Filter::Released) }

  pub fn suspended(self) -> Self { self.filter(Filter::Suspended) }

  pub fn retired(self) -> Self { self.filter(Filter::Retired) }

  pub fn injured(self) -> Self { self.filter(Filter::Injured) }

  pub fn vacant(self) -> Self { self.filter(Filter::Vacant) }

  pub fn defended(self) -> Self { self.filter(Filter::Defended) }

  pub fn new_titles(self) -> Self { self.filter(Filter::NewTitle) }

  pub fn with_trashed(mut self) -> Self {
    self.with_trashed = true;
    self
  }

  pub fn matches(&self, history: &EntityHistory, as_of: DateTime<Utc>) -> bool {
    let entity = &history.entity;
    (self.with_trashed || !entity.is_deleted())
      && self.entity_type.is_none_or(|t| t == entity.entity_type)
      && self.filters.iter().all(|f| f.matches(history, as_of))
  }
}
