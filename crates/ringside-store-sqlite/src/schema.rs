//! SQL schema for the Ringside SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entities (
    entity_id   TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,   -- 'wrestler' | 'tag_team' | ... | 'title'
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    deleted_at  TEXT             -- set while soft-deleted
);

-- Periods are never deleted; closing one sets ended_at.
CREATE TABLE IF NOT EXISTS periods (
    period_id  TEXT PRIMARY KEY,
    entity_id  TEXT NOT NULL REFERENCES entities(entity_id),
    kind       TEXT NOT NULL,    -- 'employment' | 'activation' | 'injury' | ...
    started_at TEXT NOT NULL,
    ended_at   TEXT,
    CHECK (ended_at IS NULL OR ended_at >= started_at)
);

CREATE TABLE IF NOT EXISTS championships (
    championship_id    TEXT PRIMARY KEY,
    title_id           TEXT NOT NULL REFERENCES entities(entity_id),
    champion_type      TEXT NOT NULL,   -- 'wrestler' | 'tag_team'
    champion_id        TEXT NOT NULL REFERENCES entities(entity_id),
    won_at             TEXT NOT NULL,
    lost_at            TEXT,
    won_event_match_id TEXT,
    CHECK (lost_at IS NULL OR lost_at > won_at)
);

-- At most one open period per entity and kind, one open reign per title.
CREATE UNIQUE INDEX IF NOT EXISTS periods_open_idx
    ON periods(entity_id, kind) WHERE ended_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS championships_open_idx
    ON championships(title_id) WHERE lost_at IS NULL;

CREATE INDEX IF NOT EXISTS periods_entity_idx       ON periods(entity_id, kind, started_at);
CREATE INDEX IF NOT EXISTS championships_title_idx  ON championships(title_id, won_at);
CREATE INDEX IF NOT EXISTS entities_type_idx        ON entities(entity_type);

PRAGMA user_version = 1;
";
