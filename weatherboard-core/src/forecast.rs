//! Three-day forecast retrieval.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::FetchError,
    model::{Coordinates, DailyForecast, ForecastPayload},
};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode";

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastPayload, FetchError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ForecastBody {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Option<Vec<String>>,
    #[serde(default)]
    weathercode: Vec<Option<u32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

impl OpenMeteoForecast {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoForecast {
    #[instrument(skip(self))]
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastPayload, FetchError> {
        if !(Coordinates { latitude: lat, longitude: lon }).is_valid() {
            return Err(FetchError::InvalidCoordinates);
        }

        let url = format!("{}/forecast", self.base_url);
        debug!(url = %url, "Fetching forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = res.text().await?;
        parse_forecast(&body)
    }
}

/// Decode and validate a forecast body.
///
/// The daily arrays are zipped by index, so a short array shortens the
/// forecast. At most [`ForecastPayload::DAYS`] days are kept.
pub fn parse_forecast(body: &str) -> Result<ForecastPayload, FetchError> {
    let parsed: ForecastBody =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    let daily = parsed.daily.ok_or_else(|| FetchError::Payload("missing daily block".into()))?;
    let time = daily.time.ok_or_else(|| FetchError::Payload("missing daily.time".into()))?;

    let mut days = Vec::with_capacity(ForecastPayload::DAYS);
    for (i, raw_date) in time.iter().enumerate().take(ForecastPayload::DAYS) {
        let (Some(code), Some(max), Some(min)) = (
            daily.weathercode.get(i).copied().flatten(),
            daily.temperature_2m_max.get(i).copied().flatten(),
            daily.temperature_2m_min.get(i).copied().flatten(),
        ) else {
            break;
        };

        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| FetchError::Payload(format!("invalid date '{raw_date}': {e}")))?;

        days.push(DailyForecast { date, weathercode: code, temp_max: max, temp_min: min });
    }

    if days.is_empty() {
        return Err(FetchError::Payload("empty daily series".into()));
    }

    Ok(ForecastPayload { days })
}
