//! [`SqliteStore`]: the SQLite implementation of [`RosterStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use ringside_core::{
  championship::{ChampionRef, Championship},
  entity::{Entity, EntityType, NewEntity},
  event::DomainEvent,
  history::EntityHistory,
  lifecycle::{self, Change, Plan, Transition},
  period::{Period, PeriodKind},
  query::EntityQuery,
  store::RosterStore,
};

use crate::{
  Error, Result,
  encode::{
    CHAMPIONSHIP_COLUMNS, ENTITY_COLUMNS, PERIOD_COLUMNS, RawChampionship,
    RawEntity, RawPeriod, decode_uuid, encode_dt, encode_uuid,
  },
  filter,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ringside roster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a throwaway in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection on the database thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one `IMMEDIATE` transaction. The transaction commits
  /// only if `f` succeeds; otherwise it is rolled back on drop.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }
}

// ─── Row access ──────────────────────────────────────────────────────────────

fn load_entity(conn: &Connection, id: Uuid) -> Result<Option<Entity>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE entity_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawEntity::from_row,
    )
    .optional()?;
  raw.map(RawEntity::into_entity).transpose()
}

fn select_periods(
  conn: &Connection,
  entity_id: Uuid,
  kind: Option<PeriodKind>,
) -> Result<Vec<Period>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PERIOD_COLUMNS} FROM periods
     WHERE entity_id = ?1 AND (?2 IS NULL OR kind = ?2)
     ORDER BY started_at, ended_at IS NULL, rowid"
  ))?;
  let raws = stmt
    .query_map(
      rusqlite::params![encode_uuid(entity_id), kind.map(PeriodKind::as_str)],
      RawPeriod::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPeriod::into_period).collect()
}

fn select_reigns(conn: &Connection, title_id: Uuid) -> Result<Vec<Championship>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CHAMPIONSHIP_COLUMNS} FROM championships
     WHERE title_id = ?1
     ORDER BY won_at, rowid"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![encode_uuid(title_id)], RawChampionship::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawChampionship::into_championship).collect()
}

fn load_history(conn: &Connection, id: Uuid) -> Result<Option<EntityHistory>> {
  let Some(entity) = load_entity(conn, id)? else {
    return Ok(None);
  };
  let periods = select_periods(conn, id, None)?;
  let reigns = if entity.entity_type == EntityType::Title {
    select_reigns(conn, id)?
  } else {
    Vec::new()
  };
  Ok(Some(EntityHistory::from_records(entity, periods, reigns)))
}

fn require_history(conn: &Connection, id: Uuid) -> Result<EntityHistory> {
  load_history(conn, id)?.ok_or(Error::Core(ringside_core::Error::EntityNotFound(id)))
}

/// Persist `changes` for `entity_id`, in order.
fn write_changes(conn: &Connection, entity_id: Uuid, changes: &[Change]) -> Result<()> {
  let id = encode_uuid(entity_id);
  for change in changes {
    match *change {
      Change::OpenPeriod { period_id, kind, at } => {
        conn.execute(
          "INSERT INTO periods (period_id, entity_id, kind, started_at, ended_at)
           VALUES (?1, ?2, ?3, ?4, NULL)",
          rusqlite::params![encode_uuid(period_id), id, kind.as_str(), encode_dt(at)],
        )?;
      }
      Change::ClosePeriod { kind, at } => {
        conn.execute(
          "UPDATE periods SET ended_at = ?3
           WHERE entity_id = ?1 AND kind = ?2 AND ended_at IS NULL",
          rusqlite::params![id, kind.as_str(), encode_dt(at)],
        )?;
      }
      Change::RestartPeriod { kind, at } => {
        conn.execute(
          "UPDATE periods SET started_at = ?3
           WHERE entity_id = ?1 AND kind = ?2 AND ended_at IS NULL",
          rusqlite::params![id, kind.as_str(), encode_dt(at)],
        )?;
      }
      Change::OpenReign { championship_id, champion, at, won_event_match_id } => {
        conn.execute(
          "INSERT INTO championships (
             championship_id, title_id, champion_type, champion_id,
             won_at, lost_at, won_event_match_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
          rusqlite::params![
            encode_uuid(championship_id),
            id,
            champion.champion_type.as_str(),
            encode_uuid(champion.champion_id),
            encode_dt(at),
            won_event_match_id.map(encode_uuid),
          ],
        )?;
      }
      Change::CloseReign { championship_id, at } => {
        conn.execute(
          "UPDATE championships SET lost_at = ?2 WHERE championship_id = ?1",
          rusqlite::params![encode_uuid(championship_id), encode_dt(at)],
        )?;
      }
    }
  }
  debug!(entity_id = %entity_id, changes = changes.len(), "changes written");
  Ok(())
}

fn set_deleted_at(conn: &Connection, id: Uuid, at: Option<DateTime<Utc>>) -> Result<()> {
  conn.execute(
    "UPDATE entities SET deleted_at = ?2 WHERE entity_id = ?1",
    rusqlite::params![encode_uuid(id), at.map(encode_dt)],
  )?;
  Ok(())
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn add_entity(&self, input: NewEntity, created_at: DateTime<Utc>) -> Result<Entity> {
    let entity = Entity {
      entity_id:   Uuid::new_v4(),
      entity_type: input.entity_type,
      name:        input.name,
      created_at,
      deleted_at:  None,
    };

    let id_str   = encode_uuid(entity.entity_id);
    let type_str = entity.entity_type.as_str();
    let name     = entity.name.clone();
    let at_str   = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entities (entity_id, entity_type, name, created_at, deleted_at)
           VALUES (?1, ?2, ?3, ?4, NULL)",
          rusqlite::params![id_str, type_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entity)
  }

  async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>> {
    self.read(move |conn| load_entity(conn, id)).await
  }

  async fn list_entities(&self, entity_type: Option<EntityType>) -> Result<Vec<Entity>> {
    let type_str = entity_type.map(EntityType::as_str);

    let raws: Vec<RawEntity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTITY_COLUMNS} FROM entities
           WHERE ?1 IS NULL OR entity_type = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![type_str], RawEntity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntity::into_entity).collect()
  }

  async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<(Entity, DomainEvent)> {
    self
      .transact(move |conn| {
        let history = require_history(conn, id)?;
        let event = lifecycle::check_delete(&history, at)?;
        set_deleted_at(conn, id, Some(at))?;

        let mut entity = history.entity;
        entity.deleted_at = Some(at);
        Ok((entity, event))
      })
      .await
  }

  async fn restore(&self, id: Uuid, at: DateTime<Utc>) -> Result<(Entity, DomainEvent)> {
    self
      .transact(move |conn| {
        let history = require_history(conn, id)?;
        let event = lifecycle::check_restore(&history, at)?;
        set_deleted_at(conn, id, None)?;

        let mut entity = history.entity;
        entity.deleted_at = None;
        Ok((entity, event))
      })
      .await
  }

  // ── Period store ──────────────────────────────────────────────────────────

  async fn add_period(
    &self,
    entity_id: Uuid,
    kind: PeriodKind,
    started_at: DateTime<Utc>,
  ) -> Result<Period> {
    self
      .transact(move |conn| {
        let mut history = require_history(conn, entity_id)?;
        let period = history.add_period(kind, started_at)?.clone();
        write_changes(conn, entity_id, &[Change::OpenPeriod {
          period_id: period.period_id,
          kind,
          at: started_at,
        }])?;
        Ok(period)
      })
      .await
  }

  async fn close_period(
    &self,
    entity_id: Uuid,
    kind: PeriodKind,
    ended_at: DateTime<Utc>,
  ) -> Result<Period> {
    self
      .transact(move |conn| {
        let mut history = require_history(conn, entity_id)?;
        let period = history.close_period(kind, ended_at)?.clone();
        write_changes(conn, entity_id, &[Change::ClosePeriod { kind, at: ended_at }])?;
        Ok(period)
      })
      .await
  }

  async fn periods_for(&self, entity_id: Uuid, kind: PeriodKind) -> Result<Vec<Period>> {
    self
      .read(move |conn| select_periods(conn, entity_id, Some(kind)))
      .await
  }

  async fn load_history(&self, entity_id: Uuid) -> Result<Option<EntityHistory>> {
    self.read(move |conn| load_history(conn, entity_id)).await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn apply_transition(
    &self,
    entity_id: Uuid,
    transition: Transition,
    at: DateTime<Utc>,
  ) -> Result<Plan> {
    self
      .transact(move |conn| {
        let history = require_history(conn, entity_id)?;
        let plan = lifecycle::plan(&history, transition, at)?;
        write_changes(conn, entity_id, &plan.changes)?;
        Ok(plan)
      })
      .await
  }

  // ── Championship ledger ───────────────────────────────────────────────────

  async fn record_championship_change(
    &self,
    title_id: Uuid,
    champion: ChampionRef,
    at: DateTime<Utc>,
    won_event_match_id: Option<Uuid>,
  ) -> Result<Plan> {
    self
      .transact(move |conn| {
        let title = require_history(conn, title_id)?;
        let holder = load_entity(conn, champion.champion_id)?
          .ok_or(ringside_core::Error::InvalidChampion(champion.champion_id))?;
        let plan = lifecycle::plan_championship_change(
          &title,
          &holder,
          champion,
          at,
          won_event_match_id,
        )?;
        write_changes(conn, title_id, &plan.changes)?;
        Ok(plan)
      })
      .await
  }

  async fn vacate_title(&self, title_id: Uuid, at: DateTime<Utc>) -> Result<Plan> {
    self
      .transact(move |conn| {
        let title = require_history(conn, title_id)?;
        let plan = lifecycle::plan_vacate(&title, at)?;
        write_changes(conn, title_id, &plan.changes)?;
        Ok(plan)
      })
      .await
  }

  async fn championships(&self, title_id: Uuid) -> Result<Vec<Championship>> {
    let mut reigns = self.read(move |conn| select_reigns(conn, title_id)).await?;
    reigns.reverse();
    Ok(reigns)
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn query<'a>(
    &'a self,
    query: &'a EntityQuery,
    as_of: DateTime<Utc>,
  ) -> Result<Vec<Uuid>> {
    // ?1 is the resolution instant, ?2 the entity type, ?3 the trash flag.
    // ?3 always appears so all three parameters are bound whatever the filters.
    let mut conds = vec![
      "(?2 IS NULL OR e.entity_type = ?2)".to_owned(),
      "(?3 OR e.deleted_at IS NULL)".to_owned(),
    ];
    conds.extend(query.filters.iter().map(|f| format!("({})", filter::clause(*f))));

    let sql = format!(
      "SELECT e.entity_id FROM entities e
       WHERE {}
       ORDER BY e.created_at, e.rowid",
      conds.join("\n         AND ")
    );
    let as_of_str    = encode_dt(as_of);
    let type_str     = query.entity_type.map(EntityType::as_str);
    let with_trashed = query.with_trashed;

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![as_of_str, type_str, with_trashed], |row| {
            row.get(0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }
}
