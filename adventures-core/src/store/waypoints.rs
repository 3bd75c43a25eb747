//! Waypoint rows (the `coordinates` table).

use rusqlite::{Connection, params};

use crate::adventure::AdventureId;
use crate::waypoint::{Marker, Waypoint};

/// Insert `markers` as path points 0, 1, 2, ...
pub fn insert_all(conn: &Connection, adventure: AdventureId, markers: &[Marker]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO coordinates (adventure_id, path_point, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (path_point, (latitude, longitude)) in markers.iter().enumerate() {
        stmt.execute(params![adventure, path_point as i64, latitude, longitude])?;
    }

    Ok(markers.len())
}

/// Drop every waypoint of `adventure` and insert `markers` in their place.
pub fn replace(conn: &Connection, adventure: AdventureId, markers: &[Marker]) -> rusqlite::Result<usize> {
    delete_for_adventure(conn, adventure)?;
    insert_all(conn, adventure, markers)
}

pub fn delete_for_adventure(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM coordinates WHERE adventure_id = ?1", params![adventure])
}

pub fn for_adventure(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<Vec<Waypoint>> {
    let mut stmt = conn.prepare_cached(
        "SELECT adventure_id, path_point, latitude, longitude FROM coordinates \
         WHERE adventure_id = ?1 ORDER BY path_point",
    )?;

    stmt.query_map(params![adventure], |row| {
        Ok(Waypoint {
            adventure_id: row.get(0)?,
            path_point: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
        })
    })?
    .collect()
}

pub fn markers_for(conn: &Connection, adventure: AdventureId) -> rusqlite::Result<Vec<Marker>> {
    Ok(for_adventure(conn, adventure)?
        .iter()
        .map(Waypoint::marker)
        .collect())
}

/// Adventures with at least one waypoint inside the closed box spanned by
/// `bottom_left` and `top_right`. Each adventure appears once.
pub fn adventures_in_box(
    conn: &Connection,
    bottom_left: Marker,
    top_right: Marker,
) -> rusqlite::Result<Vec<AdventureId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT adventure_id FROM coordinates \
         WHERE latitude >= ?1 AND latitude <= ?2 AND longitude >= ?3 AND longitude <= ?4 \
         ORDER BY adventure_id",
    )?;

    stmt.query_map(
        params![bottom_left.0, top_right.0, bottom_left.1, top_right.1],
        |row| row.get(0),
    )?
    .collect()
}
