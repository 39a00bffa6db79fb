//! Core library for the `weatherboard` dashboard.
//!
//! This crate defines:
//! - The saved city list with its active pointer, and how it is persisted
//! - City search and forecast clients for the Open-Meteo services
//! - Device-location seeding for a first run
//! - The dashboard controller that ties them together behind an output sink
//!
//! It is used by `weatherboard-cli`, but any front end that implements
//! [`OutputSink`] can drive it.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod geolocation;
pub mod latest;
pub mod model;
pub mod present;
pub mod registry;
pub mod sink;
pub mod storage;

pub use config::{Config, LocationConfig, LocatorMode};
pub use dashboard::{Dashboard, Event, Intent, Services};
pub use error::{FetchError, LocationError, RegistryError, SearchError, StorageError};
pub use forecast::{ForecastSource, OpenMeteoForecast};
pub use geocoding::{Geocoder, OpenMeteoGeocoder, SearchSession};
pub use geolocation::{GeolocationResolver, Locator};
pub use model::{City, Coordinates, DailyForecast, ForecastPayload, SearchCandidate};
pub use present::{CityRow, DayRow, ForecastView, WeatherKind};
pub use registry::CityRegistry;
pub use sink::{OutputSink, RecordingSink, SinkEvent};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
