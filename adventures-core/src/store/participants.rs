//! Participant rows: one per (adventure, user) pair.

use rusqlite::{Connection, params};

use crate::adventure::AdventureId;
use crate::user::UserId;

pub fn insert(conn: &Connection, adventure: AdventureId, user: UserId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO adventure_participants (adventure_id, user_id) VALUES (?1, ?2)",
        params![adventure, user],
    )?;
    Ok(())
}

pub fn exists(conn: &Connection, adventure: AdventureId, user: UserId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM adventure_participants WHERE adventure_id = ?1 AND user_id = ?2)",
        params![adventure, user],
        |row| row.get(0),
    )
}

pub fn delete(conn: &Connection, adventure: AdventureId, user: UserId) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM adventure_participants WHERE adventure_id = ?1 AND user_id = ?2",
        params![adventure, user],
    )
}

pub fn delete_for_adventure(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM adventure_participants WHERE adventure_id = ?1",
        params![adventure],
    )
}

pub fn count(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM adventure_participants WHERE adventure_id = ?1",
        params![adventure],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Adventures `user` has a participant row for, in join order.
pub fn adventures_of(conn: &Connection, user: UserId) -> rusqlite::Result<Vec<AdventureId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT adventure_id FROM adventure_participants WHERE user_id = ?1 ORDER BY id",
    )?;
    stmt.query_map(params![user], |row| row.get(0))?.collect()
}
