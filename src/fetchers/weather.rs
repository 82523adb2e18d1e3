//! Open-Meteo weather client (no API key required)
//!
//! Two-step lookup: geocode the configured ZIP code unless explicit
//! coordinates are present, then fetch current conditions. The forecast
//! response names an IANA timezone, which stamps the report with the
//! location's local time.

use crate::config::LocationConfig;
use crate::fetchers::WeatherFetcher;
use crate::types::{DaybriefError, Result, WeatherReport};
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 5;

pub struct OpenMeteoClient {
    geocoding_url: String,
    forecast_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    timezone: Option<String>,
    current: Option<CurrentConditions>,
}

#[derive(Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    weather_code: Option<i64>,
    relative_humidity_2m: Option<f64>,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self> {
        Self::with_urls(GEOCODING_URL, FORECAST_URL)
    }

    pub fn with_urls(geocoding_url: &str, forecast_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DaybriefError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            geocoding_url: geocoding_url.to_string(),
            forecast_url: forecast_url.to_string(),
            client,
        })
    }

    /// Explicit coordinates win; otherwise geocode the ZIP code.
    fn resolve_location(&self, location: &LocationConfig) -> Result<(f64, f64, String)> {
        if let (Ok(lat), Ok(lon)) = (location.lat.parse::<f64>(), location.lon.parse::<f64>()) {
            return Ok((lat, lon, String::new()));
        }
        if location.zip_code.is_empty() {
            return Err(DaybriefError::Config("no location configured".into()));
        }

        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", location.zip_code.as_str()),
                ("count", "1"),
                ("language", "en"),
            ])
            .send()
            .map_err(|e| DaybriefError::Fetch(format!("geocoding failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(DaybriefError::Fetch(format!(
                "geocoding HTTP {}",
                response.status()
            )));
        }
        let geo: GeocodeResponse = response
            .json()
            .map_err(|e| DaybriefError::Parse(format!("geocoding body: {}", e)))?;

        let first = geo
            .results
            .into_iter()
            .next()
            .ok_or_else(|| DaybriefError::Fetch("location not found".into()))?;
        Ok((first.latitude, first.longitude, first.name))
    }
}

impl WeatherFetcher for OpenMeteoClient {
    fn current(&self, location: &LocationConfig) -> Result<WeatherReport> {
        let (lat, lon, place) = self.resolve_location(location)?;

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string().as_str()),
                ("longitude", lon.to_string().as_str()),
                ("current", "temperature_2m,weather_code,relative_humidity_2m"),
                ("temperature_unit", "fahrenheit"),
                ("timezone", "auto"),
            ])
            .send()
            .map_err(|e| DaybriefError::Fetch(format!("forecast failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(DaybriefError::Fetch(format!(
                "forecast HTTP {}",
                response.status()
            )));
        }
        let forecast: ForecastResponse = response
            .json()
            .map_err(|e| DaybriefError::Parse(format!("forecast body: {}", e)))?;

        let current = forecast
            .current
            .ok_or_else(|| DaybriefError::Parse("forecast missing current conditions".into()))?;

        Ok(WeatherReport {
            temp: current.temperature_2m.map(|t| t.round() as i64),
            condition: current
                .weather_code
                .map(weather_code_to_text)
                .unwrap_or("Unknown")
                .to_string(),
            humidity: current.relative_humidity_2m,
            location: place,
            timezone: forecast.timezone.clone(),
            local_time: local_time_in(forecast.timezone.as_deref()),
        })
    }
}

/// Now, rendered in the named IANA zone; UTC when the zone is absent or
/// unknown.
fn local_time_in(tz_name: Option<&str>) -> String {
    match tz_name.and_then(|name| name.parse::<Tz>().ok()) {
        Some(tz) => Utc::now().with_timezone(&tz).to_rfc3339(),
        None => Utc::now().to_rfc3339(),
    }
}

/// WMO weather interpretation codes, as documented by Open-Meteo
pub fn weather_code_to_text(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Drizzle",
        55 => "Dense drizzle",
        56 | 57 => "Freezing drizzle",
        61 => "Slight rain",
        63 => "Rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 => "Slight snow",
        73 => "Snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 | 81 => "Rain showers",
        82 => "Violent rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}
