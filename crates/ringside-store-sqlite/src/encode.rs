//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC with
//! nanosecond precision, so string comparison in SQL orders them correctly.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use ringside_core::{
  championship::{ChampionRef, ChampionType, Championship},
  entity::{Entity, EntityType},
  period::{Period, PeriodKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn decode_entity_type(s: &str) -> Result<EntityType> {
  EntityType::parse(s).ok_or_else(|| Error::Decode(format!("entity type {s:?}")))
}

pub fn decode_period_kind(s: &str) -> Result<PeriodKind> {
  PeriodKind::parse(s).ok_or_else(|| Error::Decode(format!("period kind {s:?}")))
}

pub fn decode_champion_type(s: &str) -> Result<ChampionType> {
  ChampionType::parse(s).ok_or_else(|| Error::Decode(format!("champion type {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ENTITY_COLUMNS: &str = "entity_id, entity_type, name, created_at, deleted_at";

/// Raw strings read directly from an `entities` row.
pub struct RawEntity {
  pub entity_id:   String,
  pub entity_type: String,
  pub name:        String,
  pub created_at:  String,
  pub deleted_at:  Option<String>,
}

impl RawEntity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_id:   row.get(0)?,
      entity_type: row.get(1)?,
      name:        row.get(2)?,
      created_at:  row.get(3)?,
      deleted_at:  row.get(4)?,
    })
  }

  pub fn into_entity(self) -> Result<Entity> {
    Ok(Entity {
      entity_id:   decode_uuid(&self.entity_id)?,
      entity_type: decode_entity_type(&self.entity_type)?,
      name:        self.name,
      created_at:  decode_dt(&self.created_at)?,
      deleted_at:  self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const PERIOD_COLUMNS: &str = "period_id, entity_id, kind, started_at, ended_at";

/// Raw strings read directly from a `periods` row.
pub struct RawPeriod {
  pub period_id:  String,
  pub entity_id:  String,
  pub kind:       String,
  pub started_at: String,
  pub ended_at:   Option<String>,
}

impl RawPeriod {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      period_id:  row.get(0)?,
      entity_id:  row.get(1)?,
      kind:       row.get(2)?,
      started_at: row.get(3)?,
      ended_at:   row.get(4)?,
    })
  }

  pub fn into_period(self) -> Result<Period> {
    Ok(Period {
      period_id:  decode_uuid(&self.period_id)?,
      entity_id:  decode_uuid(&self.entity_id)?,
      kind:       decode_period_kind(&self.kind)?,
      started_at: decode_dt(&self.started_at)?,
      ended_at:   self.ended_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const CHAMPIONSHIP_COLUMNS: &str = "championship_id, title_id, champion_type, \
                                        champion_id, won_at, lost_at, won_event_match_id";

/// Raw strings read directly from a `championships` row.
pub struct RawChampionship {
  pub championship_id:    String,
  pub title_id:           String,
  pub champion_type:      String,
  pub champion_id:        String,
  pub won_at:             String,
  pub lost_at:            Option<String>,
  pub won_event_match_id: Option<String>,
}

impl RawChampionship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      championship_id:    row.get(0)?,
      title_id:           row.get(1)?,
      champion_type:      row.get(2)?,
      champion_id:        row.get(3)?,
      won_at:             row.get(4)?,
      lost_at:            row.get(5)?,
      won_event_match_id: row.get(6)?,
    })
  }

  pub fn into_championship(self) -> Result<Championship> {
    Ok(Championship {
      championship_id:    decode_uuid(&self.championship_id)?,
      title_id:           decode_uuid(&self.title_id)?,
      champion:           ChampionRef {
        champion_type: decode_champion_type(&self.champion_type)?,
        champion_id:   decode_uuid(&self.champion_id)?,
      },
      won_at:             decode_dt(&self.won_at)?,
      lost_at:            self.lost_at.as_deref().map(decode_dt).transpose()?,
      won_event_match_id: self
        .won_event_match_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_strings() {
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = early + chrono::Duration::nanoseconds(1);
    let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();

    assert!(encode_dt(early) < encode_dt(late));
    assert!(encode_dt(late) < encode_dt(later));
    assert_eq!(encode_dt(early).len(), encode_dt(late).len());
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn unknown_enum_values_are_decode_errors() {
    assert!(matches!(decode_entity_type("jobber"), Err(Error::Decode(_))));
    assert!(matches!(decode_period_kind("vacation"), Err(Error::Decode(_))));
    assert_eq!(decode_period_kind("injury").unwrap(), PeriodKind::Injury);
  }
}
