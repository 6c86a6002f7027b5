// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core data structures shared by the state container, the remote resource
//! cache and the REST clients. The JSON representation matches the workout
//! backend's wire format (camelCase fields, SCREAMING_SNAKE_CASE enum values),
//! so the same types serve as API bodies and as persisted state.
//!
//! ## Core Models
//!
//! - [`Workout`]: a planned or completed exercise session
//! - [`Exercise`]: a sub-entity owned by a workout
//! - [`WeatherData`]: flattened weather readout for a location
//! - [`WeeklySummary`]: per-week completion aggregation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{completion_consistency, DATE_FORMAT, TIME_FORMAT};

/// Represents a planned or completed exercise session
///
/// A workout without an `id` has not been persisted yet; the backend assigns
/// the id on creation. A persisted workout carries at least one exercise.
///
/// # Examples
///
/// ```rust
/// use workout_companion_core::models::{Exercise, Workout, WorkoutLocation, WorkoutType};
///
/// let workout = Workout {
///     id: None,
///     name: "Morning Cardio".to_string(),
///     date: "2023-10-15".to_string(),
///     time: Some("07:30".to_string()),
///     exercises: vec![Exercise::new("Running", 1, 1)],
///     notes: None,
///     completed: false,
///     completed_date: None,
///     duration: Some(30),
///     calories: Some(250),
///     workout_type: WorkoutType::Cardio,
///     location: WorkoutLocation::Home,
/// };
/// assert!(workout.id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = completion_consistency))]
pub struct Workout {
    /// Backend-assigned identifier; absent until the workout is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable name of the workout
    #[validate(length(min = 1, message = "Workout name is required"))]
    pub name: String,
    /// Scheduled calendar date (`YYYY-MM-DD`)
    #[validate(regex(path = *DATE_FORMAT, message = "Date must be in YYYY-MM-DD format"))]
    pub date: String,
    /// Optional scheduled time (`HH:MM`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *TIME_FORMAT, message = "Time must be in HH:MM format"))]
    pub time: Option<String>,
    /// Ordered exercises making up the session
    #[validate(length(min = 1, message = "At least one exercise is required"))]
    #[validate(nested)]
    pub exercises: Vec<Exercise>,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether the workout has been completed
    #[serde(default)]
    pub completed: bool,
    /// Completion date (`YYYY-MM-DD`); present only when `completed` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
    /// Duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration: Option<u32>,
    /// Estimated calories burned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    /// Category of the workout
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Where the workout takes place
    pub location: WorkoutLocation,
}

impl Workout {
    /// Whether the backend has assigned an id to this workout
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// A single exercise within a workout
///
/// Exercises have no independent lifecycle; their ids are generated
/// client-side when the exercise is added to a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Client-generated identifier (UUID v4)
    pub id: String,
    /// Name of the exercise
    #[validate(length(min = 1, message = "Exercise name is required"))]
    pub name: String,
    /// Number of sets
    #[validate(range(min = 1, message = "At least 1 set is required"))]
    pub sets: u32,
    /// Repetitions per set
    #[validate(range(min = 1, message = "At least 1 rep is required"))]
    pub reps: u32,
    /// Weight used, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    /// Rest time between sets in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<u32>,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    /// Create a new exercise with a freshly generated client-side id
    pub fn new(name: impl Into<String>, sets: u32, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sets,
            reps,
            weight: None,
            rest_time: None,
            notes: None,
        }
    }
}

/// Category of a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Flexibility,
    Hiit,
    Custom,
}

/// Where a workout takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutLocation {
    Home,
    Gym,
    Outdoor,
    Other,
}

/// Completion filter applied to workout listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    All,
    Completed,
    Pending,
}

impl FilterType {
    /// Whether a workout with the given completion status passes this filter
    pub fn matches(self, completed: bool) -> bool {
        match self {
            FilterType::All => true,
            FilterType::Completed => completed,
            FilterType::Pending => !completed,
        }
    }
}

/// Flattened weather readout for a location
///
/// The weather provider's nested response is transformed into this shape by
/// the weather client; see [`crate::api::weather`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub location: String,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    pub condition: String,
    /// Provider icon URL for the current condition
    pub icon: String,
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Observation timestamp as reported by the provider
    pub date: String,
    /// Daily forecast entries; empty for a current-conditions readout
    #[serde(default)]
    pub forecast: Vec<WeatherForecast>,
}

/// A single day within a weather forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: String,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
}

/// Aggregated completion summary for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    /// First day of the week (`YYYY-MM-DD`)
    pub start_date: String,
    /// Last day of the week (`YYYY-MM-DD`)
    pub end_date: String,
    pub total_workouts: u32,
    pub completed_workouts: u32,
    /// Total planned duration in minutes
    pub total_duration: u32,
    pub total_calories: u32,
    pub workouts_by_type: BTreeMap<WorkoutType, u32>,
    /// One entry per day of the week, in order
    pub daily_summary: Vec<DailySummary>,
}

/// Per-day slice of a [`WeeklySummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub workouts: u32,
    pub completed: u32,
    pub duration: u32,
    pub calories: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workout() -> Workout {
        Workout {
            id: Some("1".to_string()),
            name: "Morning Cardio".to_string(),
            date: "2023-10-15".to_string(),
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

    #[test]
    fn workout_serializes_with_wire_field_names() {
        let json = serde_json::to_value(sample_workout()).unwrap();
        assert_eq!(json["type"], "CARDIO");
        assert_eq!(json["location"], "HOME");
        assert!(json.get("completedDate").is_none());
        assert!(json.get("time").is_none());
        assert_eq!(json["exercises"][0]["sets"], 1);
    }

    #[test]
    fn workout_deserializes_from_backend_shape() {
        let workout: Workout = serde_json::from_str(
            r#"{
                "id": "7",
                "name": "Leg Day",
                "date": "2023-10-16",
                "exercises": [
                    {"id": "ex1", "name": "Squat", "sets": 5, "reps": 5, "restTime": 120}
                ],
                "completed": true,
                "completedDate": "2023-10-16",
                "type": "STRENGTH",
                "location": "GYM"
            }"#,
        )
        .unwrap();
        assert_eq!(workout.id.as_deref(), Some("7"));
        assert_eq!(workout.workout_type, WorkoutType::Strength);
        assert_eq!(workout.exercises[0].rest_time, Some(120));
        assert_eq!(workout.completed_date.as_deref(), Some("2023-10-16"));
    }

    #[test]
    fn exercise_new_generates_distinct_ids() {
        let a = Exercise::new("Push-up", 3, 12);
        let b = Exercise::new("Push-up", 3, 12);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn filter_type_matches_completion_status() {
        assert!(FilterType::All.matches(true));
        assert!(FilterType::All.matches(false));
        assert!(FilterType::Completed.matches(true));
        assert!(!FilterType::Completed.matches(false));
        assert!(FilterType::Pending.matches(false));
        assert!(!FilterType::Pending.matches(true));
    }

    #[test]
    fn filter_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FilterType::Pending).unwrap(),
            "\"pending\""
        );
    }
}
