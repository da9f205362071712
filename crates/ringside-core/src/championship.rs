//! Championship reigns: the ledger of who held a title and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityType;

/// The kinds of entity that can hold a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChampionType {
  Wrestler,
  TagTeam,
}

impl ChampionType {
  pub fn entity_type(self) -> EntityType {
    match self {
      Self::Wrestler => EntityType::Wrestler,
      Self::TagTeam => EntityType::TagTeam,
    }
  }

  pub fn as_str(self) -> &'static str { self.entity_type().as_str() }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "wrestler" => Some(Self::Wrestler),
      "tag_team" => Some(Self::TagTeam),
      _ => None,
    }
  }
}

/// A reference to the holder of a reign: a wrestler or a tag team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChampionRef {
  pub champion_type: ChampionType,
  pub champion_id:   Uuid,
}

impl ChampionRef {
  pub fn wrestler(id: Uuid) -> Self {
    Self { champion_type: ChampionType::Wrestler, champion_id: id }
  }

  pub fn tag_team(id: Uuid) -> Self {
    Self { champion_type: ChampionType::TagTeam, champion_id: id }
  }
}

/// One reign of one champion over one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Championship {
  pub championship_id:    Uuid,
  pub title_id:           Uuid,
  pub champion:           ChampionRef,
  pub won_at:             DateTime<Utc>,
  pub lost_at:            Option<DateTime<Utc>>,
  /// The match that produced the title change, when known.
  pub won_event_match_id: Option<Uuid>,
}

impl Championship {
  pub fn is_open(&self) -> bool { self.lost_at.is_none() }

  pub fn is_current(&self, as_of: DateTime<Utc>) -> bool {
    self.won_at <= as_of && self.lost_at.is_none_or(|lost| lost > as_of)
  }

  /// Whole days between winning the title and losing it, or `as_of` while
  /// the reign is still open. Never negative.
  pub fn reign_length(&self, as_of: DateTime<Utc>) -> i64 {
    let end = self.lost_at.unwrap_or(as_of);
    (end - self.won_at).num_days().max(0)
  }
}

/// The result of recording a title change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionshipChange {
  /// The reign that ended because of this change, if the title was held.
  pub previous: Option<Championship>,
  pub current:  Championship,
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn reign(won: DateTime<Utc>, lost: Option<DateTime<Utc>>) -> Championship {
    Championship {
      championship_id:    Uuid::new_v4(),
      title_id:           Uuid::new_v4(),
      champion:           ChampionRef::wrestler(Uuid::new_v4()),
      won_at:             won,
      lost_at:            lost,
      won_event_match_id: None,
    }
  }

  #[test]
  fn open_reign_length_counts_to_as_of() {
    let won = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let r = reign(won, None);
    assert_eq!(r.reign_length(won + Duration::days(30)), 30);
    assert_eq!(r.reign_length(won + Duration::hours(47)), 1);
  }

  #[test]
  fn closed_reign_length_ignores_as_of() {
    let won = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let lost = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let r = reign(won, Some(lost));
    assert_eq!(r.reign_length(lost), 152);
    assert_eq!(r.reign_length(lost + Duration::days(400)), 152);
  }

  #[test]
  fn reign_length_before_it_began_is_zero() {
    let won = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let r = reign(won, None);
    assert_eq!(r.reign_length(won - Duration::days(3)), 0);
  }
}
