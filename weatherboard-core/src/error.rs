use thiserror::Error;

/// Failure of the durable city store. Never escapes the persistence adapter:
/// `load` turns it into "no data" and `save` logs and drops it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read stored key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write stored key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for '{key}' could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why the device position could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("geolocation is not available on this device")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("a location request is already in progress")]
    Busy,
    #[error("location lookup failed: {0}")]
    Lookup(String),
}

/// Rejected registry mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("City already added")]
    DuplicateCity,
    #[error("Select city from the list")]
    NoSelection,
    #[error("city is not in the saved list")]
    NotMember,
}

/// Everything that can go wrong while loading a forecast. All variants are
/// shown to the user the same way.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,
    #[error("forecast request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("forecast service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid data from weather API: {0}")]
    Payload(String),
}

impl FetchError {
    /// The one message the user ever sees for a failed forecast.
    pub const USER_MESSAGE: &'static str = "Error loading weather";
}

/// Geocoding failures. Callers swallow these and show no candidates.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoding service returned status {0}")]
    Status(reqwest::StatusCode),
}
