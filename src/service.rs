// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Domain Access Layer
//!
//! Narrow, storage-agnostic operations presentation code calls instead of
//! touching the cache or the REST clients directly. Queries go through the
//! [`QueryCache`]; successful mutations apply their declared invalidation set
//! before reporting success, so no caller can observe a stale entry a
//! finished mutation was supposed to drop.
//!
//! Failures are propagated unchanged: no retries, no swallowing. How an
//! error is rendered (or retried) is the presentation layer's decision.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::api::weather::WeatherClient;
use crate::api::{ApiError, WorkoutBackend};
use crate::cache::{Mutation, QueryCache, QueryKey};
use crate::models::{WeatherData, WeeklySummary, Workout};
use crate::summary;
use crate::validation::validate_workout;

/// Failures surfaced by domain access layer operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Field-level validation errors, raised before any transport call
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error("invalid date {0}: expected YYYY-MM-DD")]
    InvalidDate(String),
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Workout operations over the cache and the workout backend
#[derive(Clone)]
pub struct WorkoutService {
    backend: Arc<dyn WorkoutBackend>,
    cache: Arc<QueryCache>,
}

impl WorkoutService {
    pub fn new(backend: Arc<dyn WorkoutBackend>, cache: Arc<QueryCache>) -> Self {
        Self { backend, cache }
    }

    /// All workouts, in backend order (no client-side reordering).
    pub async fn get_all_workouts(&self) -> Result<Vec<Workout>, ServiceError> {
        let value = self
            .cache
            .get_or_fetch(QueryKey::WorkoutList, || async move {
                encode(&self.backend.fetch_workouts().await?)
            })
            .await?;
        Ok(decode(value)?)
    }

    /// A single workout, or `None` when the id is absent server-side.
    pub async fn get_workout_by_id(&self, id: &str) -> Result<Option<Workout>, ServiceError> {
        let result = self
            .cache
            .get_or_fetch(QueryKey::WorkoutById(id.to_string()), || async move {
                encode(&self.backend.fetch_workout(id).await?)
            })
            .await;
        match result {
            Ok(value) => Ok(Some(decode(value)?)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert (id absent) or fully update (id present) a workout.
    ///
    /// Validation runs before any transport call; a workout that fails
    /// validation never reaches the network.
    pub async fn save_workout(&self, workout: &Workout) -> Result<(), ServiceError> {
        validate_workout(workout)?;

        match &workout.id {
            None => {
                let created = self.backend.create_workout(workout).await?;
                self.cache.apply(&Mutation::Add);
                info!(id = ?created.id, name = %created.name, "workout created");
            }
            Some(id) => {
                self.backend.update_workout(id, workout).await?;
                self.cache.apply(&Mutation::Update(id.clone()));
                info!(id = %id, "workout updated");
            }
        }
        Ok(())
    }

    /// Remove a workout; fails with not-found when the id is absent.
    pub async fn delete_workout(&self, id: &str) -> Result<(), ServiceError> {
        self.backend.delete_workout(id).await?;
        self.cache.apply(&Mutation::Delete(id.to_string()));
        info!(id = %id, "workout deleted");
        Ok(())
    }

    /// Mark a workout completed, returning the updated workout.
    pub async fn complete_workout(
        &self,
        id: &str,
        completed_date: &str,
    ) -> Result<Workout, ServiceError> {
        let updated = self.backend.set_completed(id, completed_date).await?;
        self.cache.apply(&Mutation::Complete(id.to_string()));
        info!(id = %id, completed_date = %completed_date, "workout completed");
        Ok(updated)
    }

    /// Workouts scheduled on the given date, in backend order.
    pub async fn get_workouts_for_date(&self, date: &str) -> Result<Vec<Workout>, ServiceError> {
        let value = self
            .cache
            .get_or_fetch(QueryKey::WorkoutsForDate(date.to_string()), || async move {
                encode(&self.backend.fetch_workouts_for_date(date).await?)
            })
            .await?;
        Ok(decode(value)?)
    }

    /// Workouts falling in the seven-day window starting at `start`.
    pub async fn get_workouts_for_week(&self, start: &str) -> Result<Vec<Workout>, ServiceError> {
        let first = parse_date(start)?;
        let last = first + chrono::Duration::days(6);

        let key = QueryKey::WorkoutsForRange {
            start: first.to_string(),
            end: last.to_string(),
        };
        let value = self
            .cache
            .get_or_fetch(key, || async move {
                let workouts = self.backend.fetch_workouts().await?;
                let in_week: Vec<Workout> = workouts
                    .into_iter()
                    .filter(|w| {
                        NaiveDate::parse_from_str(&w.date, "%Y-%m-%d")
                            .map(|d| d >= first && d <= last)
                            .unwrap_or(false)
                    })
                    .collect();
                encode(&in_week)
            })
            .await?;
        Ok(decode(value)?)
    }

    /// Completion summary for the seven-day window starting at `start`.
    pub async fn weekly_summary(&self, start: &str) -> Result<WeeklySummary, ServiceError> {
        let first = parse_date(start)?;
        let workouts = self.get_workouts_for_week(start).await?;
        Ok(summary::weekly_summary(first, &workouts))
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ServiceError::InvalidDate(date.to_string()))
}

/// Weather operations over the cache and the weather provider
///
/// Constructed without a client when no API key is configured; every
/// operation then fails with [`ApiError::WeatherDisabled`] while workout
/// features stay fully functional.
#[derive(Clone)]
pub struct WeatherService {
    client: Option<WeatherClient>,
    cache: Arc<QueryCache>,
}

impl WeatherService {
    pub fn new(client: Option<WeatherClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Current conditions for a location, cached per location string.
    pub async fn current(&self, location: &str) -> Result<WeatherData, ServiceError> {
        let client = self.client.as_ref().ok_or(ApiError::WeatherDisabled)?;
        let value = self
            .cache
            .get_or_fetch(QueryKey::CurrentWeather(location.to_string()), || async move {
                encode(&client.current(location).await?)
            })
            .await?;
        Ok(decode(value)?)
    }

    /// Daily forecast for a location, cached independently of the current
    /// readout.
    pub async fn forecast(&self, location: &str) -> Result<WeatherData, ServiceError> {
        let client = self.client.as_ref().ok_or(ApiError::WeatherDisabled)?;
        let value = self
            .cache
            .get_or_fetch(
                QueryKey::WeatherForecast(location.to_string()),
                || async move { encode(&client.forecast(location).await?) },
            )
            .await?;
        Ok(decode(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, WorkoutLocation, WorkoutType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory backend that records how many transport calls were made.
    struct StubBackend {
        calls: AtomicUsize,
        workouts: Vec<Workout>,
    }

    impl StubBackend {
        fn new(workouts: Vec<Workout>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                workouts,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WorkoutBackend for StubBackend {
        async fn fetch_workouts(&self) -> Result<Vec<Workout>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.workouts.clone())
        }

        async fn fetch_workout(&self, id: &str) -> Result<Workout, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.workouts
                .iter()
                .find(|w| w.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.to_string()))
        }

        async fn create_workout(&self, workout: &Workout) -> Result<Workout, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut created = workout.clone();
            created.id = Some("generated".to_string());
            Ok(created)
        }

        async fn update_workout(&self, _id: &str, workout: &Workout) -> Result<Workout, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(workout.clone())
        }

        async fn set_completed(&self, id: &str, completed_date: &str) -> Result<Workout, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut workout = self
                .workouts
                .iter()
                .find(|w| w.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
            workout.completed = true;
            workout.completed_date = Some(completed_date.to_string());
            Ok(workout)
        }

        async fn delete_workout(&self, id: &str) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.workouts.iter().any(|w| w.id.as_deref() == Some(id)) {
                Ok(())
            } else {
                Err(ApiError::NotFound(id.to_string()))
            }
        }

        async fn fetch_workouts_for_date(&self, date: &str) -> Result<Vec<Workout>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .workouts
                .iter()
                .filter(|w| w.date == date)
                .cloned()
                .collect())
        }
    }

    fn workout(id: Option<&str>, name: &str, date: &str) -> Workout {
        Workout {
            id: id.map(String::from),
            name: name.to_string(),
            date: date.to_string(),
            time: None,
            exercises: vec![Exercise::new("Running", 1, 1)],
            notes: None,
            completed: false,
            completed_date: None,
            duration: None,
            calories: None,
            workout_type: WorkoutType::Cardio,
            location: WorkoutLocation::Home,
        }
    }

    fn service(backend: Arc<StubBackend>) -> WorkoutService {
        WorkoutService::new(backend, Arc::new(QueryCache::new()))
    }

    #[tokio::test]
    async fn missing_workout_resolves_to_none() {
        let backend = Arc::new(StubBackend::new(vec![]));
        let service = service(Arc::clone(&backend));
        assert!(service.get_workout_by_id("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_list_queries_hit_the_backend_once() {
        let backend = Arc::new(StubBackend::new(vec![workout(
            Some("1"),
            "Leg Day",
            "2023-10-15",
        )]));
        let service = service(Arc::clone(&backend));

        service.get_all_workouts().await.unwrap();
        service.get_all_workouts().await.unwrap();
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn save_without_id_inserts_and_with_id_updates() {
        let backend = Arc::new(StubBackend::new(vec![]));
        let service = service(Arc::clone(&backend));

        service
            .save_workout(&workout(None, "New", "2023-10-15"))
            .await
            .unwrap();
        service
            .save_workout(&workout(Some("1"), "Existing", "2023-10-15"))
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn invalid_workout_is_rejected_before_transport() {
        let backend = Arc::new(StubBackend::new(vec![]));
        let service = service(Arc::clone(&backend));

        let mut invalid = workout(None, "", "2023-10-15");
        invalid.exercises.clear();

        let err = service.save_workout(&invalid).await.unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("exercises"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn week_window_filters_and_caches_under_range() {
        let backend = Arc::new(StubBackend::new(vec![
            workout(Some("1"), "In week", "2023-10-09"),
            workout(Some("2"), "Also in week", "2023-10-15"),
            workout(Some("3"), "Next week", "2023-10-16"),
        ]));
        let service = service(Arc::clone(&backend));

        let week = service.get_workouts_for_week("2023-10-09").await.unwrap();
        assert_eq!(week.len(), 2);

        // Served from cache under Workouts:RANGE until a mutation lands.
        service.get_workouts_for_week("2023-10-09").await.unwrap();
        assert_eq!(backend.calls(), 1);

        service.delete_workout("1").await.unwrap();
        service.get_workouts_for_week("2023-10-09").await.unwrap();
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn weekly_summary_rejects_malformed_start() {
        let backend = Arc::new(StubBackend::new(vec![]));
        let service = service(backend);
        assert!(matches!(
            service.weekly_summary("15/10/2023").await,
            Err(ServiceError::InvalidDate(_))
        ));
    }

    #[tokio::test]
    async fn disabled_weather_service_fails_without_blocking_workouts() {
        let weather = WeatherService::new(None, Arc::new(QueryCache::new()));
        assert!(!weather.enabled());
        assert!(matches!(
            weather.current("London").await,
            Err(ServiceError::Api(ApiError::WeatherDisabled))
        ));
    }
}
