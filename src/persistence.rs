// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Persistence Gateway
//!
//! Makes the UI selection state durable across process restarts. The current
//! state is serialized as a versioned JSON blob under a fixed key on every
//! committed transition, and read back once at startup before any screen
//! renders.
//!
//! Persistence is best-effort relative to in-memory correctness: a blob that
//! fails to deserialize (corrupt, wrong version, type mismatch) is discarded
//! in favor of defaults, and write failures are logged and contained. Neither
//! case ever propagates to the caller of the triggering transition.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::state::{StateHandle, WorkoutState};
use crate::storage::KvStore;

/// Fixed key the state blob lives under
const STATE_KEY: &str = "workout-state";

/// Bumped whenever the persisted shape changes incompatibly
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    state: WorkoutState,
}

/// Write-through persistence for the state container
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<KvStore>,
}

impl PersistenceGateway {
    pub fn new(store: KvStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Build the state container from the persisted blob, falling back to
    /// defaults when nothing usable is stored. Never fails.
    pub fn hydrate(&self) -> StateHandle {
        StateHandle::with_state(self.restore())
    }

    /// Read and decode the persisted state, or defaults.
    pub fn restore(&self) -> WorkoutState {
        let blob = match self.store.get(STATE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("no persisted state found, starting from defaults");
                return WorkoutState::default();
            }
            Err(e) => {
                warn!("failed to read persisted state, starting from defaults: {e}");
                return WorkoutState::default();
            }
        };

        match serde_json::from_str::<PersistedState>(&blob) {
            Ok(persisted) if persisted.version == SCHEMA_VERSION => persisted.state,
            Ok(persisted) => {
                warn!(
                    "persisted state has unsupported schema version {}, starting from defaults",
                    persisted.version
                );
                WorkoutState::default()
            }
            Err(e) => {
                warn!("persisted state is unreadable, starting from defaults: {e}");
                WorkoutState::default()
            }
        }
    }

    /// Write the given state through to the store. Failures are logged, never
    /// returned.
    pub fn persist(&self, state: &WorkoutState) {
        let blob = match serde_json::to_string(&PersistedState {
            version: SCHEMA_VERSION,
            state: state.clone(),
        }) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("failed to serialize state for persistence: {e}");
                return;
            }
        };

        if let Err(e) = self.store.set(STATE_KEY, &blob) {
            warn!("failed to persist state: {e}");
        }
    }

    /// Spawn the write-through task: every observed transition is persisted.
    /// Rapid bursts coalesce, so only the final state of a burst is
    /// guaranteed durable. The task ends when the state container is dropped.
    pub fn spawn_writer(&self, handle: &StateHandle) -> JoinHandle<()> {
        let gateway = self.clone();
        let mut rx = handle.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                gateway.persist(&state);
            }
        })
    }
}
