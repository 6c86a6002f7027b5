// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # State Container
//!
//! Single writable source for the UI selection state: the selected workout,
//! the selected date, the client-side completed-workout id set and the active
//! completion filter. All transitions are synchronous, total and applied in
//! issue order; presentation code and the persistence gateway observe changes
//! through [`StateHandle::subscribe`].
//!
//! The container is an explicitly constructed handle, not an ambient global:
//! build one at startup (usually via [`crate::persistence::PersistenceGateway::hydrate`])
//! and pass clones to whatever needs read or transition access.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::{FilterType, Workout};

/// UI selection state; never includes remote-cache contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutState {
    /// At most one workout is selected at a time
    pub selected_workout: Option<Workout>,
    /// Selected calendar date (`YYYY-MM-DD`); format is enforced upstream by
    /// form validation, not here
    pub selected_date: String,
    /// Ids the user marked completed on this device. Set semantics: no
    /// duplicates, insertion order preserved.
    pub completed_workouts: Vec<String>,
    /// Active completion filter
    pub filter_type: FilterType,
}

impl Default for WorkoutState {
    fn default() -> Self {
        Self {
            selected_workout: None,
            selected_date: today(),
            completed_workouts: Vec::new(),
            filter_type: FilterType::All,
        }
    }
}

/// Today's date on the device clock, `YYYY-MM-DD`
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Handle to the process-wide state container
///
/// Cheap to clone; all clones share the same underlying state. Transitions
/// complete before returning, so no observer can see one half-applied.
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: watch::Sender<WorkoutState>,
}

impl StateHandle {
    /// Create a container holding the default state (today's date, empty
    /// selection, empty completed set, filter `all`).
    pub fn new() -> Self {
        Self::with_state(WorkoutState::default())
    }

    /// Create a container holding a previously persisted state.
    pub fn with_state(state: WorkoutState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Replace the selected workout, or clear the selection with `None`.
    pub fn select_workout(&self, workout: Option<Workout>) {
        self.tx.send_modify(|state| state.selected_workout = workout);
    }

    /// Replace the selected date.
    pub fn set_selected_date(&self, date: impl Into<String>) {
        let date = date.into();
        self.tx.send_modify(|state| state.selected_date = date);
    }

    /// Insert `id` into the completed set; already-present ids are a no-op.
    pub fn mark_completed(&self, id: &str) {
        self.tx.send_modify(|state| {
            if !state.completed_workouts.iter().any(|c| c == id) {
                state.completed_workouts.push(id.to_string());
            }
        });
    }

    /// Remove `id` from the completed set; absent ids are a no-op, not an
    /// error.
    pub fn mark_not_completed(&self, id: &str) {
        self.tx
            .send_modify(|state| state.completed_workouts.retain(|c| c != id));
    }

    /// Replace the active completion filter.
    pub fn set_filter(&self, filter: FilterType) {
        self.tx.send_modify(|state| state.filter_type = filter);
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> WorkoutState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes. Rapid transition bursts may coalesce; the
    /// receiver always observes the latest state.
    pub fn subscribe(&self) -> watch::Receiver<WorkoutState> {
        self.tx.subscribe()
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}
