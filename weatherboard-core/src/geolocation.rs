//! Best-effort device position, used to seed an empty city list.

use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::{
    config::{Config, LocatorMode},
    error::LocationError,
    model::{City, Coordinates},
};

/// Message shown when no city can be seeded from the device position.
pub const LOCATION_PROMPT: &str = "Please add a city or allow geolocation access";

/// A source of the device position.
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// No positioning capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocator;

#[async_trait]
impl Locator for NoLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Coordinates the user configured once.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    coords: Coordinates,
}

impl FixedLocator {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coords)
    }
}

/// Position from an ip-api.com compatible service (`GET {base}/json`).
#[derive(Debug, Clone)]
pub struct IpLocator {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpLocator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Lookup(e.to_string()))?;

        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl Locator for IpLocator {
    #[instrument(skip(self))]
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let url = format!("{}/json", self.base_url);
        debug!(url = %url, "Requesting IP location");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LocationError::Lookup(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Lookup(format!("HTTP {status}")));
        }

        let body: IpApiResponse =
            res.json().await.map_err(|e| LocationError::Lookup(e.to_string()))?;

        if body.status != "success" {
            debug!(message = ?body.message, "IP location refused");
            return Err(LocationError::PermissionDenied);
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(LocationError::Lookup("response carried no coordinates".to_string())),
        }
    }
}

/// Build the locator selected in config.
///
/// `fixed` without coordinates degrades to no capability.
pub fn locator_from_config(config: &Config) -> Result<Box<dyn Locator>, LocationError> {
    let boxed: Box<dyn Locator> = match config.location.mode {
        LocatorMode::None => Box::new(NoLocator),
        LocatorMode::Fixed => match config.location.coordinates() {
            Some(coords) => Box::new(FixedLocator::new(coords)),
            None => Box::new(NoLocator),
        },
        LocatorMode::Ip => Box::new(IpLocator::new(config.location.ip_url.clone(), config.timeout())?),
    };
    Ok(boxed)
}

/// Single-shot resolver: one request at a time, and the answer is a city.
#[derive(Debug)]
pub struct GeolocationResolver {
    locator: Box<dyn Locator>,
    in_flight: AtomicBool,
}

impl GeolocationResolver {
    pub fn new(locator: Box<dyn Locator>) -> Self {
        Self { locator, in_flight: AtomicBool::new(false) }
    }

    /// Resolve the device position into the synthetic "Current location" city.
    pub async fn resolve(&self) -> Result<City, LocationError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(LocationError::Busy);
        }

        let outcome = {
            let _guard = InFlight(&self.in_flight);
            self.locator.locate().await
        };

        let coords = outcome?;
        if !coords.is_valid() {
            return Err(LocationError::Lookup(format!(
                "coordinates out of range: {}, {}",
                coords.latitude, coords.longitude
            )));
        }

        info!(lat = coords.latitude, lon = coords.longitude, "Resolved device location");
        Ok(City::current_location(coords))
    }
}

/// Clears the outstanding-request flag when dropped, including when the
/// `resolve` future is cancelled mid-lookup.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
