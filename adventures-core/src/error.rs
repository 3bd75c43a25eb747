//! Error types for adventure operations.

use thiserror::Error;

use crate::adventure::AdventureId;
use crate::policy::Action;
use crate::user::UserId;

/// Errors that can occur in adventure operations.
#[derive(Error, Debug)]
pub enum AdventureError {
    #[error("Adventure does not exist")]
    AdventureNotFound(AdventureId),

    #[error("User does not exist")]
    UserNotFound(UserId),

    #[error("Please log in to access this page")]
    LoginRequired,

    #[error("You cannot {0} this adventure")]
    NotCreator(Action),

    #[error("You cannot leave this adventure")]
    CreatorCannotLeave,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {0}")]
    InvalidField(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used at the boundary to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidInput,
    Internal,
}

impl AdventureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdventureError::AdventureNotFound(_) | AdventureError::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            AdventureError::LoginRequired
            | AdventureError::NotCreator(_)
            | AdventureError::CreatorCannotLeave => ErrorKind::Forbidden,
            AdventureError::InvalidInput(_)
            | AdventureError::MissingField(_)
            | AdventureError::InvalidField(_) => ErrorKind::InvalidInput,
            AdventureError::Storage(_) | AdventureError::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for adventure operations.
pub type AdventureResult<T> = Result<T, AdventureError>;
