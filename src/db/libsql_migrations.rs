//! Schema for the libSQL backend.
//!
//! Statements are idempotent so `run_migrations` can run on every start.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clients_name ON clients (name);

CREATE TABLE IF NOT EXISTS matters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL REFERENCES clients (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    matter_type TEXT NOT NULL CHECK (matter_type IN ('transaction', 'land_use')),
    property_address TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'on_hold', 'closed')),
    external_project_id TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matters_client ON matters (client_id);
CREATE INDEX IF NOT EXISTS idx_matters_status ON matters (status);

CREATE TABLE IF NOT EXISTS deadline_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    matter_type TEXT NOT NULL CHECK (matter_type IN ('transaction', 'land_use')),
    default_reminder_days TEXT NOT NULL DEFAULT '[]'
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_deadline_types_name
    ON deadline_types (name, matter_type);

CREATE TABLE IF NOT EXISTS deadlines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    matter_id INTEGER NOT NULL REFERENCES matters (id) ON DELETE CASCADE,
    deadline_type_id INTEGER NOT NULL REFERENCES deadline_types (id) ON DELETE RESTRICT,
    date TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    reminder_days TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'upcoming'
        CHECK (status IN ('upcoming', 'completed', 'extended', 'waived')),
    external_task_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_deadlines_matter ON deadlines (matter_id);
CREATE INDEX IF NOT EXISTS idx_deadlines_status_date ON deadlines (status, date);
CREATE INDEX IF NOT EXISTS idx_deadlines_external_task
    ON deadlines (matter_id, external_task_id);

CREATE TABLE IF NOT EXISTS reminder_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deadline_id INTEGER NOT NULL REFERENCES deadlines (id) ON DELETE CASCADE,
    sent_at TEXT NOT NULL,
    recipient_email TEXT NOT NULL,
    days_before INTEGER NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('sent', 'failed')),
    error_message TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_reminder_logs_dedup
    ON reminder_logs (deadline_id, days_before, status, sent_at);
"#;
