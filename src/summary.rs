// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Weekly completion aggregation.
//!
//! Pure computation over an already-fetched workout list; fetching and
//! caching live in the domain access layer.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{DailySummary, WeeklySummary, Workout};

/// Aggregate the workouts of the seven-day window starting at `start`.
///
/// Workouts outside the window, or with unparseable dates, are ignored.
pub fn weekly_summary(start: NaiveDate, workouts: &[Workout]) -> WeeklySummary {
    let end = start + Duration::days(6);

    let mut daily: Vec<DailySummary> = (0..7)
        .map(|offset| DailySummary {
            date: (start + Duration::days(offset)).to_string(),
            workouts: 0,
            completed: 0,
            duration: 0,
            calories: 0,
        })
        .collect();

    let mut total_workouts = 0;
    let mut completed_workouts = 0;
    let mut total_duration = 0;
    let mut total_calories = 0;
    let mut workouts_by_type = BTreeMap::new();

    for workout in workouts {
        let Ok(date) = NaiveDate::parse_from_str(&workout.date, "%Y-%m-%d") else {
            continue;
        };
        if date < start || date > end {
            continue;
        }

        let day = &mut daily[(date - start).num_days() as usize];
        day.workouts += 1;
        total_workouts += 1;

        if workout.completed {
            day.completed += 1;
            completed_workouts += 1;
        }

        let duration = workout.duration.unwrap_or(0);
        let calories = workout.calories.unwrap_or(0);
        day.duration += duration;
        day.calories += calories;
        total_duration += duration;
        total_calories += calories;

        *workouts_by_type.entry(workout.workout_type).or_insert(0) += 1;
    }

    WeeklySummary {
        start_date: start.to_string(),
        end_date: end.to_string(),
        total_workouts,
        completed_workouts,
        total_duration,
        total_calories,
        workouts_by_type,
        daily_summary: daily,
    }
}
