// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Workout Companion Core
//!
//! The data and state core of the Workout Companion mobile app: workout
//! CRUD over a REST backend, a weather readout for outdoor-vs-indoor
//! decisions, durable UI selection state, and a tag-invalidated query cache
//! keeping it all consistent. Presentation code (screens, navigation, forms)
//! lives elsewhere and consumes this crate.
//!
//! ## Features
//!
//! - **Cached workout access**: get all / by id / by date / save / delete /
//!   complete, with declarative tag-based cache invalidation
//! - **Durable selection state**: selected workout, selected date, completed
//!   set and filter survive restarts via an encrypted key-value store
//! - **Weather readouts**: current conditions and five-day forecast per
//!   location, refreshed on a fixed interval
//! - **Request deduplication**: concurrent identical queries share one fetch
//!
//! ## Architecture
//!
//! - **Models**: workout, exercise, weather and summary data structures
//! - **State**: the single writable container for UI selection state
//! - **Storage / Persistence**: key-value store and the write-through gateway
//! - **Cache**: query memoization with tag-based invalidation
//! - **Api / Service**: REST clients and the operations built on them
//! - **Bootstrap**: composition root wiring the above together
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use workout_companion_core::bootstrap::bootstrap;
//! use workout_companion_core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration (config file or environment)
//!     let config = AppConfig::load(None)?;
//!
//!     // Assemble the core; state is rehydrated before this returns
//!     let app = bootstrap(config)?;
//!
//!     // Query through the domain access layer
//!     let workouts = app.workouts.get_all_workouts().await?;
//!     println!("{} workouts", workouts.len());
//!
//!     // Read and transition UI state through the container
//!     app.state.set_selected_date("2023-10-15");
//!     for id in app.state.snapshot().completed_workouts {
//!         println!("completed on this device: {id}");
//!     }
//!
//!     Ok(())
//! }
//! ```

/// REST clients for the workout backend and the weather provider
pub mod api;

/// Composition root assembling the core at startup
pub mod bootstrap;

/// Remote resource cache with tag-based invalidation
pub mod cache;

/// Configuration loading and defaults
pub mod config;

/// Structured logging setup
pub mod logging;

/// Common data models for workouts, weather and summaries
pub mod models;

/// Write-through persistence for the state container
pub mod persistence;

/// Domain access layer operations
pub mod service;

/// UI selection state container
pub mod state;

/// Persistent key-value store
pub mod storage;

/// Weekly completion aggregation
pub mod summary;

/// Field-level workout validation
pub mod validation;
