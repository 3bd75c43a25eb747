//! Adventure rows.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::adventure::{Adventure, AdventureForm, AdventureId};
use crate::user::UserId;

const COLUMNS: &str = "id, creator_id, date, info, joined, mode, views, searched";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Adventure> {
    Ok(Adventure {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        date: row.get(2)?,
        info: row.get(3)?,
        joined: row.get(4)?,
        mode: row.get(5)?,
        views: row.get(6)?,
        searched: row.get(7)?,
    })
}

pub fn insert(conn: &Connection, creator: UserId, form: &AdventureForm) -> rusqlite::Result<AdventureId> {
    conn.execute(
        "INSERT INTO adventures (creator_id, date, info, joined, mode) VALUES (?1, ?2, ?3, 1, ?4)",
        params![creator, form.date, form.info, form.mode],
    )?;
    Ok(AdventureId(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: AdventureId) -> rusqlite::Result<Option<Adventure>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM adventures WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// Overwrite the user-editable fields.
pub fn update(conn: &Connection, id: AdventureId, form: &AdventureForm) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE adventures SET date = ?2, info = ?3, mode = ?4 WHERE id = ?1",
        params![id, form.date, form.info, form.mode],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: AdventureId) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM adventures WHERE id = ?1", params![id])
}

pub fn all_by_date(conn: &Connection) -> rusqlite::Result<Vec<Adventure>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COLUMNS} FROM adventures ORDER BY date ASC, id ASC"
    ))?;
    stmt.query_map([], from_row)?.collect()
}

pub fn created_by(conn: &Connection, creator: UserId) -> rusqlite::Result<Vec<Adventure>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COLUMNS} FROM adventures WHERE creator_id = ?1 ORDER BY date ASC, id ASC"
    ))?;
    stmt.query_map(params![creator], from_row)?.collect()
}

pub fn increment_views(conn: &Connection, id: AdventureId) -> rusqlite::Result<()> {
    conn.execute("UPDATE adventures SET views = views + 1 WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn increment_searched(conn: &Connection, id: AdventureId) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE adventures SET searched = searched + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

/// Recompute the cached participant count from the participant table.
pub fn refresh_joined(conn: &Connection, id: AdventureId) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE adventures SET joined = \
         (SELECT COUNT(*) FROM adventure_participants WHERE adventure_id = ?1) \
         WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}
