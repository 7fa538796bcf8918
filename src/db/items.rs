//! Content catalog queries

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result, Row};

use crate::domain::{ItemFilter, ItemId, ItemKind, LearnableItem, Tier};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;

const ITEM_COLUMNS: &str = "id, kind, source_text, target_text, pronunciation, category, tier, \
                            audio_ref, example_sentence, example_translation";

/// Insert or replace a catalog item (content import, tests)
pub fn upsert_item(conn: &Connection, item: &LearnableItem) -> Result<()> {
    conn.execute(
        r#"
    INSERT OR REPLACE INTO items (id, kind, source_text, target_text, pronunciation, category, tier,
                                  audio_ref, example_sentence, example_translation)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
        params![
            item.id,
            item.kind.as_str(),
            item.source_text,
            item.target_text,
            item.pronunciation,
            item.category,
            item.tier.map(|t| t.as_u8()),
            item.audio_ref,
            item.example_sentence,
            item.example_translation,
        ],
    )?;
    Ok(())
}

pub fn get_items(conn: &Connection, filter: &ItemFilter) -> Result<Vec<LearnableItem>> {
    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::DbQuery {
        operation: "select".into(),
        table: "items".into(),
    });

    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(kind) = filter.kind {
        values.push(Value::Text(kind.as_str().to_string()));
        clauses.push(format!("kind = ?{}", values.len()));
    }
    if let Some(category) = &filter.category {
        values.push(Value::Text(category.clone()));
        clauses.push(format!("category = ?{}", values.len()));
    }
    if let Some(tier) = filter.tier {
        values.push(Value::Integer(tier.as_u8() as i64));
        clauses.push(format!("tier = ?{}", values.len()));
    }

    let mut query = format!("SELECT {} FROM items", ITEM_COLUMNS);
    if !clauses.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&clauses.join(" AND "));
    }
    query.push_str(" ORDER BY id ASC");
    if let Some(limit) = filter.limit {
        values.push(Value::Integer(limit as i64));
        query.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    let mut stmt = conn.prepare(&query)?;
    let items = stmt
        .query_map(params_from_iter(values), row_to_item)?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_items_by_ids(conn: &Connection, ids: &[ItemId]) -> Result<Vec<LearnableItem>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = (1..=ids.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(",");
    let query = format!(
        "SELECT {} FROM items WHERE id IN ({}) ORDER BY id ASC",
        ITEM_COLUMNS, placeholders
    );

    let mut stmt = conn.prepare(&query)?;
    let items = stmt
        .query_map(params_from_iter(ids.iter()), row_to_item)?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

fn row_to_item(row: &Row) -> Result<LearnableItem> {
    let kind_str: String = row.get(1)?;
    let tier: Option<u8> = row.get(6)?;
    Ok(LearnableItem {
        id: row.get(0)?,
        kind: ItemKind::from_str(&kind_str).unwrap_or(ItemKind::Word),
        source_text: row.get(2)?,
        target_text: row.get(3)?,
        pronunciation: row.get(4)?,
        category: row.get(5)?,
        tier: tier.and_then(Tier::from_u8),
        audio_ref: row.get(7)?,
        example_sentence: row.get(8)?,
        example_translation: row.get(9)?,
    })
}
