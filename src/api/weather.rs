// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Weather provider client.
//!
//! Wraps the provider's `current.json` and `forecast.json` endpoints (keyed
//! by API key and location query parameter) and flattens the nested response
//! into [`WeatherData`], the shape the rest of the app consumes.
//!
//! # API Documentation
//! - [WeatherAPI realtime](https://www.weatherapi.com/docs/#apis-realtime)
//! - [WeatherAPI forecast](https://www.weatherapi.com/docs/#apis-forecast)

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::ApiError;
use crate::models::{WeatherData, WeatherForecast};

/// Forecast days requested from the provider
const FORECAST_DAYS: u32 = 5;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    location: LocationInfo,
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: LocationInfo,
    current: CurrentConditions,
    forecast: ForecastDays,
}

#[derive(Debug, Deserialize)]
struct LocationInfo {
    name: String,
    localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
    condition: Condition,
    humidity: f64,
    wind_kph: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastDays {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    day: DayConditions,
}

#[derive(Debug, Deserialize)]
struct DayConditions {
    avgtemp_c: f64,
    condition: Condition,
}

/// Client for the external weather provider
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str, location: &str, days: Option<u32>) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| ApiError::Network(format!("invalid weather URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            pairs.append_pair("q", location);
            if let Some(days) = days {
                pairs.append_pair("days", &days.to_string());
            }
        }
        Ok(url)
    }

    /// Current conditions for a location.
    pub async fn current(&self, location: &str) -> Result<WeatherData, ApiError> {
        debug!(location, "fetching current weather");
        let url = self.endpoint("current.json", location, None)?;
        let response = self.client.get(url.as_str()).send().await?;
        let response = check(response).await?;
        Ok(flatten_current(response.json().await?))
    }

    /// Current conditions plus the daily forecast for a location.
    pub async fn forecast(&self, location: &str) -> Result<WeatherData, ApiError> {
        debug!(location, "fetching weather forecast");
        let url = self.endpoint("forecast.json", location, Some(FORECAST_DAYS))?;
        let response = self.client.get(url.as_str()).send().await?;
        let response = check(response).await?;
        Ok(flatten_forecast(response.json().await?))
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
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

fn flatten_current(response: CurrentResponse) -> WeatherData {
    WeatherData {
        location: response.location.name,
        temperature: response.current.temp_c,
        condition: response.current.condition.text,
        icon: response.current.condition.icon,
        humidity: response.current.humidity,
        wind_speed: response.current.wind_kph,
        date: response
            .location
            .localtime
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
        forecast: Vec::new(),
    }
}

fn flatten_forecast(response: ForecastResponse) -> WeatherData {
    WeatherData {
        location: response.location.name,
        temperature: response.current.temp_c,
        condition: response.current.condition.text,
        icon: response.current.condition.icon,
        humidity: response.current.humidity,
        wind_speed: response.current.wind_kph,
        date: Utc::now().to_rfc3339(),
        forecast: response
            .forecast
            .forecastday
            .into_iter()
            .map(|day| WeatherForecast {
                date: day.date,
                temperature: day.day.avgtemp_c,
                condition: day.day.condition.text,
                icon: day.day.condition.icon,
            })
            .collect(),
    }
}
