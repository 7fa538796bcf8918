//! Per-user progress records

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result, Row};

use crate::config::MASTERED_THRESHOLD;
use crate::domain::{ItemId, ProgressFilter, ProgressRecord, UserId};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;

const PROGRESS_COLUMNS: &str =
    "user_id, item_id, mastery_level, times_practiced, is_difficult, is_deleted, last_practiced";

pub fn get_progress(conn: &Connection, user: &UserId, item_id: ItemId) -> Result<Option<ProgressRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM progress WHERE user_id = ?1 AND item_id = ?2",
        PROGRESS_COLUMNS
    ))?;
    let mut rows = stmt.query(params![user.as_str(), item_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_progress(row)?))
    } else {
        Ok(None)
    }
}

pub fn upsert_progress(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::DbQuery {
        operation: "upsert".into(),
        table: "progress".into(),
    });

    conn.execute(
        r#"
    INSERT INTO progress (user_id, item_id, mastery_level, times_practiced, is_difficult, is_deleted, last_practiced)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(user_id, item_id) DO UPDATE SET
      mastery_level = excluded.mastery_level,
      times_practiced = excluded.times_practiced,
      is_difficult = excluded.is_difficult,
      is_deleted = excluded.is_deleted,
      last_practiced = excluded.last_practiced
    "#,
        params![
            record.user_id.as_str(),
            record.item_id,
            record.mastery_level.min(MASTERED_THRESHOLD),
            record.times_practiced,
            record.is_difficult,
            record.is_deleted,
            record.last_practiced.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn list_progress(conn: &Connection, user: &UserId, filter: ProgressFilter) -> Result<Vec<ProgressRecord>> {
    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::DbQuery {
        operation: "select".into(),
        table: "progress".into(),
    });

    let condition = match filter {
        ProgressFilter::All => String::new(),
        ProgressFilter::Learned => " AND mastery_level >= 1 AND is_deleted = 0".to_string(),
        ProgressFilter::Mastered => format!(" AND mastery_level >= {} AND is_deleted = 0", MASTERED_THRESHOLD),
        ProgressFilter::Difficult => " AND is_difficult = 1 AND is_deleted = 0".to_string(),
        ProgressFilter::Skipped => " AND is_deleted = 1".to_string(),
    };
    let query = format!(
        "SELECT {} FROM progress WHERE user_id = ?1{} ORDER BY item_id ASC",
        PROGRESS_COLUMNS, condition
    );

    let mut stmt = conn.prepare(&query)?;
    let records = stmt
        .query_map(params![user.as_str()], row_to_progress)?
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

fn row_to_progress(row: &Row) -> Result<ProgressRecord> {
    let last_practiced: Option<String> = row.get(6)?;
    Ok(ProgressRecord {
        user_id: UserId(row.get(0)?),
        item_id: row.get(1)?,
        mastery_level: row.get(2)?,
        times_practiced: row.get(3)?,
        is_difficult: row.get(4)?,
        is_deleted: row.get(5)?,
        last_practiced: last_practiced.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
    })
}
