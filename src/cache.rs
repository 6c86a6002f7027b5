// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Remote Resource Cache
//!
//! Memoizes fetch results per query key and keeps them consistent with
//! server-side mutations through tag-based invalidation. Callers never track
//! staleness themselves: queries declare which tags they provide, mutations
//! declare which tags they invalidate, and both relationships live in the
//! static tables on [`QueryKey`] and [`Mutation`].
//!
//! Weather entries are the exception to mutation-driven invalidation: they
//! have no local mutation path and instead expire on a fixed refresh
//! interval.
//!
//! Identical in-flight queries are deduplicated: concurrent callers of the
//! same key share one underlying fetch and all observe its outcome. Failures
//! are never cached.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use crate::api::ApiError;

/// How long a cached weather readout stays fresh
pub const WEATHER_REFRESH: Duration = Duration::from_secs(5 * 60);

/// Invalidation tag carried by cache entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A single workout, by id
    Workout(String),
    /// The full workout list
    WorkoutList,
    /// Any per-date workout listing
    WorkoutDate,
    /// Any date-range workout listing
    WorkoutRange,
    /// A weather readout, keyed by location (forecast entries use a
    /// `forecast-` prefix)
    Weather(String),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Workout(id) => write!(f, "Workouts:{id}"),
            Tag::WorkoutList => write!(f, "Workouts:LIST"),
            Tag::WorkoutDate => write!(f, "Workouts:DATE"),
            Tag::WorkoutRange => write!(f, "Workouts:RANGE"),
            Tag::Weather(id) => write!(f, "Weather:{id}"),
        }
    }
}

/// Identity of a cacheable query: resource kind plus parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    WorkoutList,
    WorkoutById(String),
    WorkoutsForDate(String),
    WorkoutsForRange { start: String, end: String },
    CurrentWeather(String),
    WeatherForecast(String),
}

impl QueryKey {
    /// Tags a successful result for this query is stored under.
    ///
    /// The list query additionally tags its entry with every returned
    /// workout's id, so invalidating one workout also drops any listing that
    /// contained it.
    pub fn provides(&self, result: &Value) -> Vec<Tag> {
        match self {
            QueryKey::WorkoutList => {
                let mut tags: Vec<Tag> = result
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|w| w.get("id").and_then(Value::as_str))
                    .map(|id| Tag::Workout(id.to_string()))
                    .collect();
                tags.push(Tag::WorkoutList);
                tags
            }
            QueryKey::WorkoutById(id) => vec![Tag::Workout(id.clone())],
            QueryKey::WorkoutsForDate(_) => vec![Tag::WorkoutDate],
            QueryKey::WorkoutsForRange { .. } => vec![Tag::WorkoutRange],
            QueryKey::CurrentWeather(location) => vec![Tag::Weather(location.clone())],
            QueryKey::WeatherForecast(location) => {
                vec![Tag::Weather(format!("forecast-{location}"))]
            }
        }
    }

    /// Time-based freshness limit, for resources with no mutation path.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            QueryKey::CurrentWeather(_) | QueryKey::WeatherForecast(_) => Some(WEATHER_REFRESH),
            _ => None,
        }
    }
}

/// A server-side mutation, as seen by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add,
    Update(String),
    Delete(String),
    Complete(String),
}

impl Mutation {
    /// Tags this mutation invalidates on success. `DATE` and `RANGE` are
    /// deliberately global rather than parameterized: over-invalidation is
    /// correct, and narrowing it would change observable cache-hit behavior.
    pub fn invalidates(&self) -> Vec<Tag> {
        match self {
            Mutation::Add => vec![Tag::WorkoutList, Tag::WorkoutDate, Tag::WorkoutRange],
            Mutation::Update(id) | Mutation::Delete(id) | Mutation::Complete(id) => vec![
                Tag::Workout(id.clone()),
                Tag::WorkoutList,
                Tag::WorkoutDate,
                Tag::WorkoutRange,
            ],
        }
    }
}

type FetchResult = Result<Value, ApiError>;

struct CacheEntry {
    value: Value,
    tags: Vec<Tag>,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.ttl.map_or(true, |ttl| self.stored_at.elapsed() < ttl)
    }
}

struct Inner {
    entries: HashMap<QueryKey, CacheEntry>,
    in_flight: HashMap<QueryKey, watch::Receiver<Option<FetchResult>>>,
}

/// Process-wide query cache with tag-based invalidation
pub struct QueryCache {
    inner: Mutex<Inner>,
}

enum Role {
    Hit(Value),
    Wait(watch::Receiver<Option<FetchResult>>),
    Lead(watch::Sender<Option<FetchResult>>),
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Return the cached value for `key`, or run `fetch` to produce it.
    ///
    /// While a fetch for `key` is outstanding, further callers wait on it
    /// instead of issuing their own; every waiter observes the single fetch's
    /// result. Successful results are stored under the key's provided tags;
    /// failures are returned to all callers and not stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> FetchResult
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FetchResult>,
    {
        loop {
            let role = {
                let mut inner = self.inner.lock().expect("cache lock poisoned");

                let fresh = inner.entries.get(&key).map(CacheEntry::is_fresh);
                if fresh == Some(false) {
                    debug!(key = ?key, "cache entry expired");
                    inner.entries.remove(&key);
                }

                if fresh == Some(true) {
                    debug!(key = ?key, "cache hit");
                    Role::Hit(inner.entries[&key].value.clone())
                } else if let Some(rx) = inner.in_flight.get(&key) {
                    Role::Wait(rx.clone())
                } else {
                    let (tx, rx) = watch::channel(None);
                    inner.in_flight.insert(key.clone(), rx);
                    Role::Lead(tx)
                }
            };

            match role {
                Role::Hit(value) => return Ok(value),
                Role::Wait(mut rx) => {
                    let waited = rx
                        .wait_for(|slot| slot.is_some())
                        .await
                        .map(|slot| (*slot).clone());
                    match waited {
                        Ok(result) => return result.expect("resolved fetch"),
                        Err(_) => {
                            // The leading fetch was abandoned before
                            // resolving; clear its slot and start over.
                            let mut inner = self.inner.lock().expect("cache lock poisoned");
                            if inner
                                .in_flight
                                .get(&key)
                                .is_some_and(|slot| slot.same_channel(&rx))
                            {
                                inner.in_flight.remove(&key);
                            }
                        }
                    }
                }
                Role::Lead(tx) => {
                    let result = fetch().await;
                    {
                        let mut inner = self.inner.lock().expect("cache lock poisoned");
                        inner.in_flight.remove(&key);
                        if let Ok(value) = &result {
                            inner.entries.insert(
                                key.clone(),
                                CacheEntry {
                                    value: value.clone(),
                                    tags: key.provides(value),
                                    stored_at: Instant::now(),
                                    ttl: key.ttl(),
                                },
                            );
                        }
                    }
                    let _ = tx.send(Some(result.clone()));
                    return result;
                }
            }
        }
    }

    /// Drop every entry carrying any of the given tags.
    pub fn invalidate(&self, tags: &[Tag]) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| !entry.tags.iter().any(|tag| tags.contains(tag)));
        let dropped = before - inner.entries.len();
        if dropped > 0 {
            debug!(?tags, dropped, "invalidated cache entries");
        }
    }

    /// Apply a successful mutation's invalidation set.
    pub fn apply(&self, mutation: &Mutation) {
        self.invalidate(&mutation.invalidates());
    }

    /// Whether a fresh entry for `key` is currently cached.
    pub fn contains(&self, key: &QueryKey) -> bool {
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.get(key).is_some_and(CacheEntry::is_fresh)
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &QueryKey, by: Duration) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.stored_at = entry.stored_at.checked_sub(by).expect("backdate underflow");
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn list_value() -> Value {
        json!([
            {"id": "3", "name": "Leg Day"},
            {"id": "9", "name": "Morning Run"}
        ])
    }

    #[tokio::test]
    async fn second_identical_query_is_served_from_cache() {
        let cache = QueryCache::new();
        let fetches = AtomicUsize::new(0);
        let fetches = &fetches;

        for _ in 0..3 {
            let value = cache
                .get_or_fetch(QueryKey::WorkoutList, || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(list_value())
                })
                .await
                .unwrap();
            assert_eq!(value, list_value());
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_mutation_drops_exactly_the_declared_tags() {
        let cache = QueryCache::new();

        cache
            .get_or_fetch(QueryKey::WorkoutList, || async { Ok(list_value()) })
            .await
            .unwrap();
        cache
            .get_or_fetch(QueryKey::WorkoutById("3".into()), || async {
                Ok(json!({"id": "3"}))
            })
            .await
            .unwrap();
        cache
            .get_or_fetch(QueryKey::WorkoutById("9".into()), || async {
                Ok(json!({"id": "9"}))
            })
            .await
            .unwrap();

        cache.apply(&Mutation::Update("3".into()));

        assert!(!cache.contains(&QueryKey::WorkoutList));
        assert!(!cache.contains(&QueryKey::WorkoutById("3".into())));
        // Untouched tag: still served without a fetch.
        assert!(cache.contains(&QueryKey::WorkoutById("9".into())));
    }

    #[tokio::test]
    async fn add_mutation_drops_list_date_and_range_entries() {
        let cache = QueryCache::new();

        cache
            .get_or_fetch(QueryKey::WorkoutList, || async { Ok(list_value()) })
            .await
            .unwrap();
        cache
            .get_or_fetch(QueryKey::WorkoutsForDate("2023-10-15".into()), || async {
                Ok(json!([]))
            })
            .await
            .unwrap();
        cache
            .get_or_fetch(
                QueryKey::WorkoutsForRange {
                    start: "2023-10-09".into(),
                    end: "2023-10-15".into(),
                },
                || async { Ok(json!([])) },
            )
            .await
            .unwrap();

        cache.apply(&Mutation::Add);

        assert!(!cache.contains(&QueryKey::WorkoutList));
        assert!(!cache.contains(&QueryKey::WorkoutsForDate("2023-10-15".into())));
        assert!(!cache.contains(&QueryKey::WorkoutsForRange {
            start: "2023-10-09".into(),
            end: "2023-10-15".into(),
        }));
    }

    #[tokio::test]
    async fn list_entry_is_dropped_when_a_contained_id_is_invalidated() {
        let cache = QueryCache::new();
        cache
            .get_or_fetch(QueryKey::WorkoutList, || async { Ok(list_value()) })
            .await
            .unwrap();

        // Only the per-id tag, not LIST: the listing still contained id 9.
        cache.invalidate(&[Tag::Workout("9".into())]);
        assert!(!cache.contains(&QueryKey::WorkoutList));
    }

    #[tokio::test]
    async fn failed_mutation_invalidates_nothing() {
        let cache = QueryCache::new();
        cache
            .get_or_fetch(QueryKey::WorkoutList, || async { Ok(list_value()) })
            .await
            .unwrap();

        // A failed mutation never reaches `apply`; the entry stays.
        assert!(cache.contains(&QueryKey::WorkoutList));
    }

    #[tokio::test]
    async fn concurrent_identical_queries_share_one_fetch() {
        let cache = Arc::new(QueryCache::new());
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(QueryKey::WorkoutList, || {
                        let fetches = Arc::clone(&fetches);
                        async move {
                            fetches.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(list_value())
                        }
                    })
                    .await
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), list_value());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deduplicated_callers_share_a_failure_and_it_is_not_cached() {
        let cache = Arc::new(QueryCache::new());
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..3 {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(QueryKey::WorkoutList, || {
                        let fetches = Arc::clone(&fetches);
                        async move {
                            fetches.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Err(ApiError::Network("connection refused".into()))
                        }
                    })
                    .await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().is_err());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(!cache.contains(&QueryKey::WorkoutList));
    }

    #[tokio::test]
    async fn weather_entries_expire_after_the_refresh_interval() {
        let cache = QueryCache::new();
        let fetches = AtomicUsize::new(0);
        let fetches = &fetches;
        let key = QueryKey::CurrentWeather("London".into());

        let fetch = || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"location": "London", "temperature": 11.5}))
        };

        cache.get_or_fetch(key.clone(), fetch).await.unwrap();
        cache.get_or_fetch(key.clone(), fetch).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        cache.backdate(&key, WEATHER_REFRESH + Duration::from_secs(1));
        cache.get_or_fetch(key.clone(), fetch).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn weather_locations_are_cached_independently() {
        let cache = QueryCache::new();

        cache
            .get_or_fetch(QueryKey::CurrentWeather("London".into()), || async {
                Ok(json!({"location": "London"}))
            })
            .await
            .unwrap();
        cache
            .get_or_fetch(QueryKey::WeatherForecast("London".into()), || async {
                Ok(json!({"location": "London", "forecast": []}))
            })
            .await
            .unwrap();

        cache.invalidate(&[Tag::Weather("London".into())]);
        assert!(!cache.contains(&QueryKey::CurrentWeather("London".into())));
        // The forecast entry has its own tag.
        assert!(cache.contains(&QueryKey::WeatherForecast("London".into())));
    }

    #[test]
    fn mutation_tag_table_matches_the_declared_policy() {
        assert_eq!(
            Mutation::Add.invalidates(),
            vec![Tag::WorkoutList, Tag::WorkoutDate, Tag::WorkoutRange]
        );
        for mutation in [
            Mutation::Update("7".into()),
            Mutation::Delete("7".into()),
            Mutation::Complete("7".into()),
        ] {
            assert_eq!(
                mutation.invalidates(),
                vec![
                    Tag::Workout("7".into()),
                    Tag::WorkoutList,
                    Tag::WorkoutDate,
                    Tag::WorkoutRange,
                ]
            );
        }
    }

    #[test]
    fn tags_render_in_the_wire_vocabulary() {
        assert_eq!(Tag::Workout("7".into()).to_string(), "Workouts:7");
        assert_eq!(Tag::WorkoutList.to_string(), "Workouts:LIST");
        assert_eq!(Tag::WorkoutDate.to_string(), "Workouts:DATE");
        assert_eq!(Tag::WorkoutRange.to_string(), "Workouts:RANGE");
        assert_eq!(
            Tag::Weather("forecast-London".into()).to_string(),
            "Weather:forecast-London"
        );
    }
}
