//! Adventure records.
//!
//! An adventure is a dated meetup with a creator, its participants and an
//! ordered path of waypoints. Only the adventure row itself lives here;
//! waypoints are in [`crate::waypoint`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{AdventureError, AdventureResult};
use crate::user::UserId;
use crate::waypoint::WaypointSubmission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdventureId(pub i64);

impl fmt::Display for AdventureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse an id taken from a request path.
///
/// Anything that is not a positive `i64` below `i64::MAX` is rejected.
impl FromStr for AdventureId {
    type Err = AdventureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 && id < i64::MAX => Ok(AdventureId(id)),
            _ => Err(AdventureError::InvalidInput(format!(
                "'{s}' is not a valid adventure id"
            ))),
        }
    }
}

impl ToSql for AdventureId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for AdventureId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(AdventureId)
    }
}

/// Category of an adventure. Stored as its small-integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Recreational,
    Amateurish,
    Professional,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Recreational, Mode::Amateurish, Mode::Professional];

    pub fn code(self) -> i64 {
        match self {
            Mode::Recreational => 0,
            Mode::Amateurish => 1,
            Mode::Professional => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Mode::ALL.into_iter().find(|mode| mode.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Recreational => "recreational",
            Mode::Amateurish => "amateurish",
            Mode::Professional => "professional",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the lowercase name or the numeric code, as sent by form clients.
impl FromStr for Mode {
    type Err = AdventureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .or_else(|| s.parse().ok().and_then(Mode::from_code))
            .ok_or(AdventureError::InvalidField("mode"))
    }
}

impl ToSql for Mode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Mode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        Mode::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}

/// A stored adventure row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adventure {
    pub id: AdventureId,
    pub creator_id: UserId,
    pub date: DateTime<Utc>,
    pub info: String,
    /// Cached participant count, creator included
    pub joined: i64,
    pub mode: Mode,
    pub views: i64,
    pub searched: i64,
}

impl Adventure {
    pub fn is_creator(&self, user: UserId) -> bool {
        self.creator_id == user
    }

    /// Active adventures are the ones still ahead of `now`. Past adventures
    /// stay in the store but are hidden from show, listings and search.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.date >= now
    }
}

/// Submitted fields for creating or editing an adventure.
///
/// Date and mode arrive type-checked; `info` is validated here and waypoints
/// are parsed leniently (see [`WaypointSubmission`]).
#[derive(Debug, Clone, Deserialize)]
pub struct AdventureForm {
    pub date: DateTime<Utc>,
    pub info: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub waypoints: WaypointSubmission,
}

impl AdventureForm {
    pub fn validate(&self) -> AdventureResult<()> {
        if self.info.trim().is_empty() {
            return Err(AdventureError::MissingField("info"));
        }
        Ok(())
    }
}
