// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Workout backend client.
//!
//! Thin `reqwest` wrapper over the workout REST endpoints:
//!
//! | operation | request |
//! |---|---|
//! | list | `GET /workouts` |
//! | by id | `GET /workouts/:id` |
//! | create | `POST /workouts` |
//! | update | `PUT /workouts/:id` |
//! | complete | `PATCH /workouts/:id` |
//! | delete | `DELETE /workouts/:id` |
//! | by date | `GET /workouts?date=:date` |

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tracing::debug;

use super::{ApiError, WorkoutBackend};
use crate::models::Workout;

/// REST client for the workout backend
#[derive(Debug, Clone)]
pub struct WorkoutClient {
    client: Client,
    base_url: String,
}

impl WorkoutClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Map a non-success response to an error, reading the body as the
    /// failure reason. `id` drives the 404 → not-found mapping.
    async fn check(response: Response, id: Option<&str>) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ApiError::NotFound(id.to_string()));
            }
        }
        let message = response.text().await.unwrap_or_default();
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            message
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl WorkoutBackend for WorkoutClient {
    async fn fetch_workouts(&self) -> Result<Vec<Workout>, ApiError> {
        debug!("fetching all workouts");
        let response = self.client.get(self.endpoint("workouts")).send().await?;
        Ok(Self::check(response, None).await?.json().await?)
    }

    async fn fetch_workout(&self, id: &str) -> Result<Workout, ApiError> {
        debug!(id, "fetching workout");
        let response = self
            .client
            .get(self.endpoint(&format!("workouts/{id}")))
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    async fn create_workout(&self, workout: &Workout) -> Result<Workout, ApiError> {
        debug!(name = %workout.name, "creating workout");
        let response = self
            .client
            .post(self.endpoint("workouts"))
            .json(workout)
            .send()
            .await?;
        Ok(Self::check(response, None).await?.json().await?)
    }

    async fn update_workout(&self, id: &str, workout: &Workout) -> Result<Workout, ApiError> {
        debug!(id, "updating workout");
        let response = self
            .client
            .put(self.endpoint(&format!("workouts/{id}")))
            .json(workout)
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    async fn set_completed(&self, id: &str, completed_date: &str) -> Result<Workout, ApiError> {
        debug!(id, completed_date, "completing workout");
        let response = self
            .client
            .patch(self.endpoint(&format!("workouts/{id}")))
            .json(&json!({
                "completed": true,
                "completedDate": completed_date,
            }))
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    async fn delete_workout(&self, id: &str) -> Result<(), ApiError> {
        debug!(id, "deleting workout");
        let response = self
            .client
            .delete(self.endpoint(&format!("workouts/{id}")))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }

    async fn fetch_workouts_for_date(&self, date: &str) -> Result<Vec<Workout>, ApiError> {
        debug!(date, "fetching workouts for date");
        let response = self
            .client
            .get(self.endpoint("workouts"))
            .query(&[("date", date)])
            .send()
            .await?;
        Ok(Self::check(response, None).await?.json().await?)
    }
}
