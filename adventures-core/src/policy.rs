//! Authorization policy.
//!
//! Every service operation asks [`authorize`] whether the caller may perform
//! an action, instead of checking roles inline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adventure::Adventure;
use crate::error::{AdventureError, AdventureResult};
use crate::user::UserId;

/// The current caller as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caller {
    Anonymous,
    User(UserId),
}

impl Caller {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Caller::Anonymous => None,
            Caller::User(id) => Some(*id),
        }
    }

    /// The caller's id, or `LoginRequired` for anonymous callers.
    pub fn require_login(&self) -> AdventureResult<UserId> {
        self.user_id().ok_or(AdventureError::LoginRequired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Search,
    Create,
    Join,
    Leave,
    Edit,
    Delete,
    ListOwn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let verb = match self {
            Action::View => "view",
            Action::Search => "search",
            Action::Create => "create",
            Action::Join => "join",
            Action::Leave => "leave",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::ListOwn => "list",
        };
        f.write_str(verb)
    }
}

/// Decide whether `caller` may perform `action` on `adventure`.
///
/// - View, Search: anyone
/// - Create, Join, ListOwn: authenticated callers
/// - Edit, Delete: the adventure's creator
/// - Leave: authenticated callers other than the creator
///
/// Creator checks need the adventure; with `None` only authentication is
/// checked.
pub fn authorize(
    caller: &Caller,
    action: Action,
    adventure: Option<&Adventure>,
) -> AdventureResult<()> {
    match action {
        Action::View | Action::Search => Ok(()),
        Action::Create | Action::Join | Action::ListOwn => caller.require_login().map(|_| ()),
        Action::Edit | Action::Delete => {
            let user = caller.require_login()?;
            match adventure {
                Some(adventure) if !adventure.is_creator(user) => {
                    Err(AdventureError::NotCreator(action))
                }
                _ => Ok(()),
            }
        }
        Action::Leave => {
            let user = caller.require_login()?;
            match adventure {
                Some(adventure) if adventure.is_creator(user) => {
                    Err(AdventureError::CreatorCannotLeave)
                }
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventure::{AdventureId, Mode};
    use chrono::Utc;

    fn owned_by(creator: i64) -> Adventure {
        Adventure {
            id: AdventureId(1),
            creator_id: UserId(creator),
            date: Utc::now(),
            info: "Ride".to_string(),
            joined: 1,
            mode: Mode::Recreational,
            views: 0,
            searched: 0,
        }
    }

    #[test]
    fn test_anyone_can_view_and_search() {
        let adventure = owned_by(1);
        for action in [Action::View, Action::Search] {
            assert!(authorize(&Caller::Anonymous, action, Some(&adventure)).is_ok());
            assert!(authorize(&Caller::User(UserId(2)), action, None).is_ok());
        }
    }

    #[test]
    fn test_anonymous_callers_must_log_in() {
        let adventure = owned_by(1);
        for action in [
            Action::Create,
            Action::Join,
            Action::Leave,
            Action::Edit,
            Action::Delete,
            Action::ListOwn,
        ] {
            assert!(matches!(
                authorize(&Caller::Anonymous, action, Some(&adventure)),
                Err(AdventureError::LoginRequired)
            ));
        }
    }

    #[test]
    fn test_only_creator_edits_and_deletes() {
        let adventure = owned_by(1);
        let creator = Caller::User(UserId(1));
        let stranger = Caller::User(UserId(2));

        for action in [Action::Edit, Action::Delete] {
            assert!(authorize(&creator, action, Some(&adventure)).is_ok());
            assert!(matches!(
                authorize(&stranger, action, Some(&adventure)),
                Err(AdventureError::NotCreator(a)) if a == action
            ));
        }
    }

    #[test]
    fn test_creator_cannot_leave() {
        let adventure = owned_by(1);

        assert!(matches!(
            authorize(&Caller::User(UserId(1)), Action::Leave, Some(&adventure)),
            Err(AdventureError::CreatorCannotLeave)
        ));
        assert!(authorize(&Caller::User(UserId(2)), Action::Leave, Some(&adventure)).is_ok());
    }
}
