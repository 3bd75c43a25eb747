//! User rows.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::adventure::AdventureId;
use crate::user::{Role, User, UserId};

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        registered_on: row.get(3)?,
        role: row.get(4)?,
        confirmed: row.get(5)?,
    })
}

pub fn insert(
    conn: &Connection,
    username: &str,
    email: &str,
    registered_on: DateTime<Utc>,
) -> rusqlite::Result<UserId> {
    conn.execute(
        "INSERT INTO users (username, email, registered_on, role, confirmed) VALUES (?1, ?2, ?3, ?4, 0)",
        params![username, email, registered_on, Role::User],
    )?;
    Ok(UserId(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, email, registered_on, role, confirmed FROM users WHERE id = ?1",
        params![id],
        from_row,
    )
    .optional()
}

/// Existing users holding a participant row for `adventure`, in join order.
/// Rows pointing at users that no longer exist are left out.
pub fn participants_of(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare_cached(
        "SELECT u.id, u.username, u.email, u.registered_on, u.role, u.confirmed \
         FROM adventure_participants p JOIN users u ON u.id = p.user_id \
         WHERE p.adventure_id = ?1 ORDER BY p.id",
    )?;
    stmt.query_map(params![adventure], from_row)?.collect()
}
