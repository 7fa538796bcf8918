use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS items (
      id INTEGER PRIMARY KEY,
      kind TEXT NOT NULL,
      source_text TEXT NOT NULL,
      target_text TEXT NOT NULL,
      pronunciation TEXT,
      category TEXT,
      tier INTEGER,
      audio_ref TEXT,
      example_sentence TEXT,
      example_translation TEXT
    );

    CREATE TABLE IF NOT EXISTS progress (
      user_id TEXT NOT NULL,
      item_id INTEGER NOT NULL,
      mastery_level INTEGER NOT NULL DEFAULT 0,
      times_practiced INTEGER NOT NULL DEFAULT 0,
      is_difficult INTEGER NOT NULL DEFAULT 0,
      is_deleted INTEGER NOT NULL DEFAULT 0,
      last_practiced TEXT,
      PRIMARY KEY (user_id, item_id)
    );

    CREATE TABLE IF NOT EXISTS profiles (
      user_id TEXT PRIMARY KEY,
      determined_level INTEGER,
      updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS local_storage (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS earned_badges (
      user_id TEXT NOT NULL,
      badge_key TEXT NOT NULL,
      earned_at TEXT NOT NULL,
      PRIMARY KEY (user_id, badge_key)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);
    CREATE INDEX IF NOT EXISTS idx_items_tier ON items(tier);
    CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: cloze support (example sentences added after launch)
  add_column_if_missing(conn, "items", "example_sentence", "TEXT")?;
  add_column_if_missing(conn, "items", "example_translation", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
