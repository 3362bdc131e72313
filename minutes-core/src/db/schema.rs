pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT,
    role TEXT,
    email TEXT UNIQUE,
    password_hash TEXT
);

CREATE TABLE IF NOT EXISTS recordings (
    id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL,
    name TEXT NOT NULL,
    audio_url TEXT,
    transcript TEXT,
    summary TEXT,
    duration INTEGER,
    notes TEXT,
    archived INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL CHECK (status IN ('not_started', 'partial', 'done', 'blocked', 'skipped')),
    user_id INTEGER NOT NULL REFERENCES users(id),
    created_at_recording_id INTEGER REFERENCES recordings(id) ON DELETE SET NULL,
    updated_at_recording_id INTEGER REFERENCES recordings(id) ON DELETE SET NULL
);

-- Snapshot columns are plain values, not foreign keys: a history row must
-- keep what the todo looked like even after the referenced recording is gone.
CREATE TABLE IF NOT EXISTS todo_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    todo_id INTEGER NOT NULL REFERENCES todos(id) ON DELETE CASCADE,
    actor_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    change_kind TEXT NOT NULL CHECK (change_kind IN ('create', 'update', 'delete')),
    name TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at_recording_id INTEGER,
    updated_at_recording_id INTEGER,
    changed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
CREATE INDEX IF NOT EXISTS idx_todos_created_recording ON todos(created_at_recording_id);
CREATE INDEX IF NOT EXISTS idx_history_todo ON todo_history(todo_id);
"#;
