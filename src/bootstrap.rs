// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Composition root.
//!
//! Wires the core together in its required order: open storage, rehydrate
//! the state container from the persisted blob, start the write-through
//! task, then construct the services over one shared cache. Presentation
//! code receives the assembled [`App`] and never builds these pieces itself.

use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::weather::WeatherClient;
use crate::api::workouts::WorkoutClient;
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::persistence::PersistenceGateway;
use crate::service::{WeatherService, WorkoutService};
use crate::state::StateHandle;
use crate::storage::KvStore;

/// The assembled core, ready for presentation code
pub struct App {
    /// State container handle; cheap to clone into screens
    pub state: StateHandle,
    /// Workout operations
    pub workouts: WorkoutService,
    /// Weather operations; disabled when no API key is configured
    pub weather: WeatherService,
    /// Persistence gateway backing the state container
    pub gateway: PersistenceGateway,
    /// Write-through task; ends when the state container is dropped
    pub writer: JoinHandle<()>,
}

/// Build the core from configuration. Must run inside a tokio runtime.
///
/// The state container is hydrated before this returns, so callers can
/// render from it immediately.
pub fn bootstrap(config: AppConfig) -> Result<App> {
    let store = KvStore::open(
        &config.storage.dir,
        config.storage.encryption_key.as_deref(),
    )
    .with_context(|| format!("failed to open state store at {}", config.storage.dir.display()))?;

    let gateway = PersistenceGateway::new(store);
    let state = gateway.hydrate();
    let writer = gateway.spawn_writer(&state);

    let http = Client::new();
    let cache = Arc::new(QueryCache::new());

    let workouts = WorkoutService::new(
        Arc::new(WorkoutClient::new(http.clone(), &config.api.base_url)),
        Arc::clone(&cache),
    );

    let weather_client = config
        .weather
        .api_key
        .as_ref()
        .map(|key| WeatherClient::new(http, &config.weather.base_url, key));
    let weather = WeatherService::new(weather_client, cache);

    info!(
        api = %config.api.base_url,
        weather_enabled = weather.enabled(),
        "workout companion core ready"
    );

    Ok(App {
        state,
        workouts,
        weather,
        gateway,
        writer,
    })
}
