use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name given to the city seeded from the device position.
pub const CURRENT_LOCATION: &str = "Current location";

/// A saved city. This is also the stored form, so field names must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, country: Option<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), country, lat, lon }
    }

    /// The synthetic city produced by the geolocation resolver.
    pub fn current_location(coords: Coordinates) -> Self {
        Self { name: CURRENT_LOCATION.to_string(), country: None, lat: coords.latitude, lon: coords.longitude }
    }

    pub fn is_synthetic(&self) -> bool {
        self.name == CURRENT_LOCATION && self.country.is_none()
    }

    /// Dedup identity: case-insensitive name and country.
    pub fn same_place(&self, name: &str, country: Option<&str>) -> bool {
        let country_eq = match (self.country.as_deref(), country) {
            (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            (None, None) => true,
            _ => false,
        };
        country_eq && self.name.to_lowercase() == name.to_lowercase()
    }

    /// "London, GB", or just the name when there is no country.
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One geocoding hit. Lives only until the next search or until it is added.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub index: usize,
    pub name: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl SearchCandidate {
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }

    pub fn into_city(self) -> City {
        City { name: self.name, country: self.country, lat: self.lat, lon: self.lon }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub weathercode: u32,
    pub temp_max: f64,
    pub temp_min: f64,
}

/// A validated forecast: at least one day, at most [`ForecastPayload::DAYS`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub days: Vec<DailyForecast>,
}

impl ForecastPayload {
    pub const DAYS: usize = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_place_ignores_case() {
        let city = City::new("London", Some("GB".into()), 51.5, -0.1);
        assert!(city.same_place("london", Some("gb")));
        assert!(!city.same_place("London", Some("CA")));
        assert!(!city.same_place("London", None));
    }

    #[test]
    fn current_location_has_no_country() {
        let city = City::current_location(Coordinates { latitude: 1.0, longitude: 2.0 });
        assert!(city.is_synthetic());
        assert_eq!(city.label(), "Current location");
        assert!(!city.same_place("Current location", Some("GB")));
    }

    #[test]
    fn stored_form_omits_missing_country() {
        let city = City::new("Current location", None, 1.0, 2.0);
        let json = serde_json::to_string(&city).expect("serialize");
        assert_eq!(json, r#"{"name":"Current location","lat":1.0,"lon":2.0}"#);

        let parsed: City =
            serde_json::from_str(r#"{"name":"Paris","country":"FR","lat":48.85,"lon":2.35}"#)
                .expect("decode");
        assert_eq!(parsed.label(), "Paris, FR");
    }

    #[test]
    fn coordinates_range() {
        assert!(Coordinates { latitude: 90.0, longitude: -180.0 }.is_valid());
        assert!(!Coordinates { latitude: 91.0, longitude: 0.0 }.is_valid());
        assert!(!Coordinates { latitude: 0.0, longitude: 180.5 }.is_valid());
    }
}
