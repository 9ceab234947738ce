//! SQL schema for the Muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id  TEXT PRIMARY KEY,
    display_name TEXT,
    created_at   TEXT NOT NULL
);

-- One enrolled reference vector per pose. Re-enrollment replaces an
-- identity's full set inside a single transaction.
CREATE TABLE IF NOT EXISTS descriptors (
    descriptor_id TEXT PRIMARY KEY,
    identity_id   TEXT NOT NULL REFERENCES identities(identity_id),
    pose          TEXT NOT NULL,   -- 'front' | 'left' | 'right'
    vector_json   TEXT NOT NULL,   -- JSON array of f64 components
    created_at    TEXT NOT NULL,
    UNIQUE (identity_id, pose)
);

-- Attendance rows span three persisted generations:
--   gen 0: employee_id + work_entries, no scalar timestamps
--   gen 1: employee_id + scalar timestamps
--   gen 2: identity_id + scalar timestamps (all new writes)
-- Reads resolve the identity via COALESCE(identity_id, employee_id).
CREATE TABLE IF NOT EXISTS attendance (
    record_id      TEXT PRIMARY KEY,
    identity_id    TEXT REFERENCES identities(identity_id),
    employee_id    TEXT,            -- historical identity column; never written
    check_in_time  TEXT,            -- ISO 8601 UTC; set by every new check-in
    check_out_time TEXT,
    status         TEXT NOT NULL DEFAULT 'checked-in',
    check_in_day   TEXT,            -- local day bucket of check_in_time
    work_entries   TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- At most one record per identity and day. The losing writer of a racing
-- double check-in hits this index and is reported as a state conflict.
CREATE UNIQUE INDEX IF NOT EXISTS attendance_identity_day_idx
    ON attendance(identity_id, check_in_day);

CREATE INDEX IF NOT EXISTS attendance_identity_idx  ON attendance(identity_id);
CREATE INDEX IF NOT EXISTS attendance_day_idx       ON attendance(check_in_day);
CREATE INDEX IF NOT EXISTS descriptors_identity_idx ON descriptors(identity_id);

PRAGMA user_version = 2;
";
