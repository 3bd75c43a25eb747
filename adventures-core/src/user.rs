//! Users as seen by the adventure rules.
//!
//! Credentials and sessions belong to the identity provider; this crate only
//! keeps what listings need to show (username) and what policy needs (id).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::AdventureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AdventureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(UserId)
            .ok_or_else(|| AdventureError::InvalidInput(format!("'{s}' is not a user id")))
    }
}

impl ToSql for UserId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn code(self) -> i64 {
        match self {
            Role::User => 0,
            Role::Admin => 1,
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match i64::column_result(value)? {
            0 => Ok(Role::User),
            1 => Ok(Role::Admin),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub registered_on: DateTime<Utc>,
    pub role: Role,
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parses_positive_integers() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId(42));
        assert_eq!(" 7 ".parse::<UserId>().unwrap(), UserId(7));
    }

    #[test]
    fn test_user_id_rejects_garbage() {
        assert!("".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
        assert!("99999999999999999999999".parse::<UserId>().is_err());
    }
}
