// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! REST clients for the workout backend and the weather provider, plus the
//! transport error taxonomy shared by the domain access layer.

use async_trait::async_trait;

use crate::models::Workout;

pub mod weather;
pub mod workouts;

/// Transport-level failures surfaced to domain access layer callers
///
/// Variants carry rendered reasons rather than source errors so a single
/// deduplicated fetch outcome can be handed to every waiting caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Network unreachable, connection reset, timeout
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response other than a mapped not-found
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The requested workout does not exist server-side
    #[error("workout {0} not found")]
    NotFound(String),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// No weather API key is configured; workout features are unaffected
    #[error("weather API key is not configured")]
    WeatherDisabled,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Transport contract for workout storage
///
/// The domain access layer is written against this trait, keeping it
/// independent of the REST wire format; [`workouts::WorkoutClient`] is the
/// production implementation.
#[async_trait]
pub trait WorkoutBackend: Send + Sync {
    /// All workouts, in backend order.
    async fn fetch_workouts(&self) -> Result<Vec<Workout>, ApiError>;

    /// A single workout; `ApiError::NotFound` when the id is absent.
    async fn fetch_workout(&self, id: &str) -> Result<Workout, ApiError>;

    /// Insert a new workout; the returned workout carries the assigned id.
    async fn create_workout(&self, workout: &Workout) -> Result<Workout, ApiError>;

    /// Full update of an existing workout.
    async fn update_workout(&self, id: &str, workout: &Workout) -> Result<Workout, ApiError>;

    /// Mark a workout completed, stamping the completion date.
    async fn set_completed(&self, id: &str, completed_date: &str) -> Result<Workout, ApiError>;

    /// Remove a workout; `ApiError::NotFound` when the id is absent.
    async fn delete_workout(&self, id: &str) -> Result<(), ApiError>;

    /// Workouts scheduled on the given `YYYY-MM-DD` date.
    async fn fetch_workouts_for_date(&self, date: &str) -> Result<Vec<Workout>, ApiError>;
}
