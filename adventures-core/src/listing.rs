//! Read-side records returned to the presentation layer.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Serialize, Serializer};

use crate::adventure::{Adventure, AdventureId, Mode};
use crate::store::participants;
use crate::user::User;
use crate::waypoint::Marker;

/// What the "all adventures" view offers the caller for one adventure.
///
/// Serialized as `-1` (no action), `0` (join) or `1` (leave).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationAction {
    /// Anonymous caller or the adventure's creator
    None,
    Join,
    Leave,
}

impl ParticipationAction {
    pub fn code(self) -> i8 {
        match self {
            ParticipationAction::None => -1,
            ParticipationAction::Join => 0,
            ParticipationAction::Leave => 1,
        }
    }
}

impl Serialize for ParticipationAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

/// An adventure with its live participant count.
#[derive(Debug, Clone, Serialize)]
pub struct AdventureSummary {
    pub id: AdventureId,
    pub date: DateTime<Utc>,
    pub info: String,
    pub mode: Mode,
    pub joined: usize,
}

impl AdventureSummary {
    /// Summarize `adventure`, counting participant rows.
    pub fn counted(conn: &Connection, adventure: Adventure) -> rusqlite::Result<Self> {
        Ok(AdventureSummary {
            joined: participants::count(conn, adventure.id)?,
            id: adventure.id,
            date: adventure.date,
            info: adventure.info,
            mode: adventure.mode,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MyAdventures {
    pub created: Vec<AdventureSummary>,
    /// Joined but not created by the caller
    pub joined: Vec<AdventureSummary>,
}

/// One row of the "all adventures" view.
#[derive(Debug, Clone, Serialize)]
pub struct ListedAdventure {
    pub id: AdventureId,
    pub username: String,
    pub date: DateTime<Utc>,
    pub info: String,
    pub joined: usize,
    pub mode: Mode,
    pub action: ParticipationAction,
    pub markers: Vec<Marker>,
}

/// One search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: AdventureId,
    pub username: String,
    pub date: DateTime<Utc>,
    pub info: String,
    pub joined: usize,
    pub mode: Mode,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdventureDetail {
    pub id: AdventureId,
    pub username: String,
    pub date: DateTime<Utc>,
    pub info: String,
    pub mode: Mode,
    pub joined: usize,
    pub participants: Vec<User>,
    pub markers: Vec<Marker>,
}

/// What the creator sees before editing.
#[derive(Debug, Clone, Serialize)]
pub struct EditView {
    pub adventure: Adventure,
    pub markers: Vec<Marker>,
    /// Participants other than the creator
    pub participants: Vec<User>,
}
