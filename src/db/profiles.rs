//! Profile fields, device-local key/value storage and the earned badge ledger

use chrono::Utc;
use rusqlite::{params, Connection, Result};

use crate::domain::{Tier, UserId};

// ==================== Profile ====================

pub fn set_determined_level(conn: &Connection, user: &UserId, level: Tier) -> Result<()> {
    conn.execute(
        r#"
    INSERT INTO profiles (user_id, determined_level, updated_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(user_id) DO UPDATE SET
      determined_level = excluded.determined_level,
      updated_at = excluded.updated_at
    "#,
        params![user.as_str(), level.as_u8(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn get_determined_level(conn: &Connection, user: &UserId) -> Result<Option<Tier>> {
    let mut stmt = conn.prepare("SELECT determined_level FROM profiles WHERE user_id = ?1")?;
    let mut rows = stmt.query(params![user.as_str()])?;
    if let Some(row) = rows.next()? {
        let level: Option<u8> = row.get(0)?;
        Ok(level.and_then(Tier::from_u8))
    } else {
        Ok(None)
    }
}

// ==================== Local Storage ====================

pub fn get_local(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM local_storage WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

pub fn set_local(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO local_storage (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove_local(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
    Ok(())
}

// ==================== Earned Badges ====================

/// Record badge keys as earned; returns only the keys not seen before.
pub fn record_earned_badges(conn: &Connection, user: &UserId, keys: &[&str]) -> Result<Vec<String>> {
    let now = Utc::now().to_rfc3339();
    let mut newly_earned = Vec::new();
    for key in keys {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO earned_badges (user_id, badge_key, earned_at) VALUES (?1, ?2, ?3)",
            params![user.as_str(), key, now],
        )?;
        if inserted > 0 {
            newly_earned.push(key.to_string());
        }
    }
    Ok(newly_earned)
}

pub fn get_earned_badges(conn: &Connection, user: &UserId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT badge_key FROM earned_badges WHERE user_id = ?1 ORDER BY earned_at ASC, badge_key ASC",
    )?;
    let keys = stmt
        .query_map(params![user.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<String>>>()?;
    Ok(keys)
}
