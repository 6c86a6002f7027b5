// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Field-level workout validation, applied before any transport call.
//!
//! The rules live as `validator` attributes on [`crate::models::Workout`] and
//! [`crate::models::Exercise`]; this module holds the format patterns and the
//! cross-field checks those attributes reference. Failures surface as a
//! [`validator::ValidationErrors`] set keyed by field, never as a single
//! collapsed message.

use regex::Regex;
use std::sync::LazyLock;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::Workout;

/// Calendar date pattern (`YYYY-MM-DD`)
pub static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));

/// Time-of-day pattern (`HH:MM`, 24-hour)
pub static TIME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time pattern"));

/// Cross-field rule: a completion date may only be present on a completed
/// workout.
pub fn completion_consistency(workout: &Workout) -> Result<(), ValidationError> {
    if workout.completed_date.is_some() && !workout.completed {
        return Err(ValidationError::new("completion_consistency")
            .with_message("Completion date requires the workout to be completed".into()));
    }
    Ok(())
}

/// Validate a workout against the full rule set.
pub fn validate_workout(workout: &Workout) -> Result<(), ValidationErrors> {
    workout.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, WorkoutLocation, WorkoutType};

    fn valid_workout() -> Workout {
        Workout {
            id: None,
            name: "Morning Cardio".to_string(),
            date: "2023-10-15".to_string(),
            time: Some("07:30".to_string()),
            exercises: vec![Exercise::new("Running", 1, 1)],
            notes: None,
            completed: false,
            completed_date: None,
            duration: Some(30),
            calories: Some(250),
            workout_type: WorkoutType::Cardio,
            location: WorkoutLocation::Home,
        }
    }

    #[test]
    fn accepts_a_well_formed_workout() {
        assert!(validate_workout(&valid_workout()).is_ok());
    }

    #[test]
    fn rejects_empty_name_with_field_error() {
        let mut workout = valid_workout();
        workout.name.clear();
        let errors = validate_workout(&workout).unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn rejects_malformed_date() {
        let mut workout = valid_workout();
        workout.date = "15/10/2023".to_string();
        let errors = validate_workout(&workout).unwrap_err();
        assert!(errors.field_errors().contains_key("date"));
    }

    #[test]
    fn rejects_out_of_range_time() {
        let mut workout = valid_workout();
        workout.time = Some("24:00".to_string());
        let errors = validate_workout(&workout).unwrap_err();
        assert!(errors.field_errors().contains_key("time"));
    }

    #[test]
    fn accepts_missing_time() {
        let mut workout = valid_workout();
        workout.time = None;
        assert!(validate_workout(&workout).is_ok());
    }

    #[test]
    fn rejects_workout_without_exercises() {
        let mut workout = valid_workout();
        workout.exercises.clear();
        let errors = validate_workout(&workout).unwrap_err();
        assert!(errors.field_errors().contains_key("exercises"));
    }

    #[test]
    fn rejects_zero_sets_on_nested_exercise() {
        let mut workout = valid_workout();
        workout.exercises[0].sets = 0;
        assert!(validate_workout(&workout).is_err());
    }

    #[test]
    fn rejects_zero_duration() {
        let mut workout = valid_workout();
        workout.duration = Some(0);
        let errors = validate_workout(&workout).unwrap_err();
        assert!(errors.field_errors().contains_key("duration"));
    }

    #[test]
    fn rejects_completed_date_on_pending_workout() {
        let mut workout = valid_workout();
        workout.completed = false;
        workout.completed_date = Some("2023-10-15".to_string());
        assert!(validate_workout(&workout).is_err());
    }

    #[test]
    fn accepts_completed_workout_with_completion_date() {
        let mut workout = valid_workout();
        workout.completed = true;
        workout.completed_date = Some("2023-10-15".to_string());
        assert!(validate_workout(&workout).is_ok());
    }
}
