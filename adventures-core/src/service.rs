//! Adventure lifecycle operations.
//!
//! [`Adventures`] is the one entry point for create, edit, delete, join,
//! leave, search and the listing views. Each call runs in a single
//! transaction: either every row it touches is written, or none is.

use std::time::{Duration, Instant};

use chrono::Utc;
use rusqlite::{ErrorCode, Transaction};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adventure::{AdventureForm, AdventureId};
use crate::error::{AdventureError, AdventureResult};
use crate::listing::{
    AdventureDetail, AdventureSummary, EditView, ListedAdventure, MyAdventures,
    ParticipationAction, SearchHit,
};
use crate::policy::{Action, Caller, authorize};
use crate::search::SearchQuery;
use crate::store::{self, Store};
use crate::user::{User, UserId};

/// Operations slower than this are logged.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    Left,
    NotJoined,
}

pub struct Adventures {
    store: Store,
    slow_threshold: Duration,
    slow_operations: u64,
}

impl Adventures {
    pub fn new(store: Store) -> Self {
        Adventures {
            store,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            slow_operations: 0,
        }
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Operations, failed ones included, that took at least the slow threshold.
    pub fn slow_operations(&self) -> u64 {
        self.slow_operations
    }

    /// Run `f` inside one transaction, committing only if it succeeds.
    fn run<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&Transaction<'_>) -> AdventureResult<T>,
    ) -> AdventureResult<T> {
        let started = Instant::now();

        let tx = self.store.transaction()?;
        let result = f(&tx).and_then(|value| {
            tx.commit()?;
            Ok(value)
        });

        let elapsed = started.elapsed();
        if elapsed >= self.slow_threshold {
            self.slow_operations += 1;
            warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                failed = result.is_err(),
                "slow store operation"
            );
        }

        result
    }

    // USERS:

    pub fn register_user(&mut self, username: &str, email: &str) -> AdventureResult<User> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() {
            return Err(AdventureError::MissingField("username"));
        }
        if !email.contains('@') {
            return Err(AdventureError::InvalidField("email"));
        }

        let user = self.run("register_user", |tx| {
            let id = match store::users::insert(tx, username, email, Utc::now()) {
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(AdventureError::InvalidInput(
                        "Username or email is already taken".to_string(),
                    ));
                }
                other => other?,
            };
            store::users::get(tx, id)?.ok_or(AdventureError::UserNotFound(id))
        })?;

        info!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub fn user(&mut self, id: UserId) -> AdventureResult<User> {
        self.run("user", |tx| {
            store::users::get(tx, id)?.ok_or(AdventureError::UserNotFound(id))
        })
    }

    // LIFECYCLE:

    /// Create an adventure with the caller as creator and first participant.
    pub fn create(&mut self, caller: &Caller, form: &AdventureForm) -> AdventureResult<AdventureId> {
        authorize(caller, Action::Create, None)?;
        let creator = caller.require_login()?;
        form.validate()?;

        let markers = form.waypoints.markers();

        let id = self.run("create", |tx| {
            let id = store::adventures::insert(tx, creator, form)?;
            store::participants::insert(tx, id, creator)?;
            store::waypoints::insert_all(tx, id, &markers)?;
            Ok(id)
        })?;

        info!(
            adventure = %id,
            creator = %creator,
            waypoints = markers.len(),
            skipped = form.waypoints.len() - markers.len(),
            "adventure created"
        );
        Ok(id)
    }

    /// Overwrite an adventure's fields and replace its whole path.
    pub fn edit(&mut self, caller: &Caller, id: AdventureId, form: &AdventureForm) -> AdventureResult<()> {
        authorize(caller, Action::Edit, None)?;
        let markers = form.waypoints.markers();

        self.run("edit", |tx| {
            let adventure =
                store::adventures::get(tx, id)?.ok_or(AdventureError::AdventureNotFound(id))?;
            authorize(caller, Action::Edit, Some(&adventure))?;
            form.validate()?;

            store::waypoints::replace(tx, id, &markers)?;
            store::adventures::update(tx, id, form)?;
            Ok(())
        })?;

        info!(adventure = %id, waypoints = markers.len(), "adventure edited");
        Ok(())
    }

    /// What the creator needs to pre-fill an edit form.
    pub fn edit_view(&mut self, caller: &Caller, id: AdventureId) -> AdventureResult<EditView> {
        authorize(caller, Action::Edit, None)?;
        let user = caller.require_login()?;

        self.run("edit_view", |tx| {
            let adventure =
                store::adventures::get(tx, id)?.ok_or(AdventureError::AdventureNotFound(id))?;
            authorize(caller, Action::Edit, Some(&adventure))?;

            let markers = store::waypoints::markers_for(tx, id)?;
            let participants = store::users::participants_of(tx, id)?
                .into_iter()
                .filter(|participant| participant.id != user)
                .collect();

            Ok(EditView {
                adventure,
                markers,
                participants,
            })
        })
    }

    /// Remove participants, then waypoints, then the adventure itself.
    pub fn delete(&mut self, caller: &Caller, id: AdventureId) -> AdventureResult<()> {
        authorize(caller, Action::Delete, None)?;

        self.run("delete", |tx| {
            let adventure =
                store::adventures::get(tx, id)?.ok_or(AdventureError::AdventureNotFound(id))?;
            authorize(caller, Action::Delete, Some(&adventure))?;

            let participants = store::participants::delete_for_adventure(tx, id)?;
            let waypoints = store::waypoints::delete_for_adventure(tx, id)?;
            store::adventures::delete(tx, id)?;

            debug!(adventure = %id, participants, waypoints, "adventure rows removed");
            Ok(())
        })?;

        info!(adventure = %id, "adventure deleted");
        Ok(())
    }

    pub fn join(&mut self, caller: &Caller, id: AdventureId) -> AdventureResult<JoinOutcome> {
        authorize(caller, Action::Join, None)?;
        let user = caller.require_login()?;

        self.run("join", |tx| {
            let adventure =
                store::adventures::get(tx, id)?.ok_or(AdventureError::AdventureNotFound(id))?;
            authorize(caller, Action::Join, Some(&adventure))?;

            if store::participants::exists(tx, id, user)? {
                return Ok(JoinOutcome::AlreadyJoined);
            }

            store::participants::insert(tx, id, user)?;
            store::adventures::refresh_joined(tx, id)?;
            Ok(JoinOutcome::Joined)
        })
    }

    pub fn leave(&mut self, caller: &Caller, id: AdventureId) -> AdventureResult<LeaveOutcome> {
        authorize(caller, Action::Leave, None)?;
        let user = caller.require_login()?;

        self.run("leave", |tx| {
            let adventure =
                store::adventures::get(tx, id)?.ok_or(AdventureError::AdventureNotFound(id))?;
            authorize(caller, Action::Leave, Some(&adventure))?;

            if store::participants::delete(tx, id, user)? == 0 {
                return Ok(LeaveOutcome::NotJoined);
            }

            store::adventures::refresh_joined(tx, id)?;
            Ok(LeaveOutcome::Left)
        })
    }

    // VIEWS:

    /// Full details of one active adventure. Counts as a view.
    pub fn show(&mut self, caller: &Caller, id: AdventureId) -> AdventureResult<AdventureDetail> {
        authorize(caller, Action::View, None)?;
        let now = Utc::now();

        self.run("show", |tx| {
            let adventure = store::adventures::get(tx, id)?
                .filter(|adventure| adventure.is_active_at(now))
                .ok_or(AdventureError::AdventureNotFound(id))?;

            let creator = store::users::get(tx, adventure.creator_id)?
                .ok_or(AdventureError::UserNotFound(adventure.creator_id))?;

            let participants = store::users::participants_of(tx, id)?;
            let joined = store::participants::count(tx, id)?;
            let markers = store::waypoints::markers_for(tx, id)?;

            store::adventures::increment_views(tx, id)?;

            Ok(AdventureDetail {
                id,
                username: creator.username,
                date: adventure.date,
                info: adventure.info,
                mode: adventure.mode,
                joined,
                participants,
                markers,
            })
        })
    }

    /// Active adventures the caller created, and the ones they joined.
    pub fn my_adventures(&mut self, caller: &Caller) -> AdventureResult<MyAdventures> {
        authorize(caller, Action::ListOwn, None)?;
        let user = caller.require_login()?;
        let now = Utc::now();

        self.run("my_adventures", |tx| {
            let mut created = Vec::new();
            for adventure in store::adventures::created_by(tx, user)? {
                if adventure.is_active_at(now) {
                    created.push(AdventureSummary::counted(tx, adventure)?);
                }
            }

            let mut joined = Vec::new();
            for adventure_id in store::participants::adventures_of(tx, user)? {
                let Some(adventure) = store::adventures::get(tx, adventure_id)? else {
                    continue;
                };

                // Own adventures are already listed above
                if adventure.is_active_at(now) && !adventure.is_creator(user) {
                    joined.push(AdventureSummary::counted(tx, adventure)?);
                }
            }
            joined.sort_by_key(|summary| summary.date);

            Ok(MyAdventures { created, joined })
        })
    }

    /// Every active adventure with a known creator, oldest date first.
    pub fn all_adventures(&mut self, caller: &Caller) -> AdventureResult<Vec<ListedAdventure>> {
        let viewer = caller.user_id();
        let now = Utc::now();

        self.run("all_adventures", |tx| {
            let mut listed = Vec::new();

            for adventure in store::adventures::all_by_date(tx)? {
                if !adventure.is_active_at(now) {
                    continue;
                }

                let Some(creator) = store::users::get(tx, adventure.creator_id)? else {
                    continue;
                };

                let action = match viewer {
                    Some(user) if !adventure.is_creator(user) => {
                        if store::participants::exists(tx, adventure.id, user)? {
                            ParticipationAction::Leave
                        } else {
                            ParticipationAction::Join
                        }
                    }
                    _ => ParticipationAction::None,
                };

                listed.push(ListedAdventure {
                    joined: store::participants::count(tx, adventure.id)?,
                    markers: store::waypoints::markers_for(tx, adventure.id)?,
                    id: adventure.id,
                    username: creator.username,
                    date: adventure.date,
                    info: adventure.info,
                    mode: adventure.mode,
                    action,
                });
            }

            Ok(listed)
        })
    }

    /// Active adventures with a waypoint inside the query's box and a
    /// selected mode, sorted by date. Each hit bumps its search counter.
    ///
    /// Corners are validated before the store is touched.
    pub fn search(&mut self, caller: &Caller, query: &SearchQuery) -> AdventureResult<Vec<SearchHit>> {
        authorize(caller, Action::Search, None)?;
        let (bottom_left, top_right) = query.bounding_box()?;
        let now = Utc::now();

        let hits = self.run("search", |tx| {
            let mut hits = Vec::new();

            for id in store::waypoints::adventures_in_box(tx, bottom_left, top_right)? {
                let Some(adventure) = store::adventures::get(tx, id)? else {
                    continue;
                };

                if !adventure.is_active_at(now) || !query.modes.contains(&adventure.mode) {
                    continue;
                }

                let Some(creator) = store::users::get(tx, adventure.creator_id)? else {
                    continue;
                };

                store::adventures::increment_searched(tx, id)?;

                hits.push(SearchHit {
                    id,
                    username: creator.username,
                    date: adventure.date,
                    info: adventure.info,
                    joined: store::participants::count(tx, id)?,
                    mode: adventure.mode,
                });
            }

            hits.sort_by_key(|hit| hit.date);
            Ok(hits)
        })?;

        debug!(hits = hits.len(), ?bottom_left, ?top_right, "search finished");
        Ok(hits)
    }
}
