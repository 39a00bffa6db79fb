//! Turning registry state and forecasts into display rows.
//!
//! Nothing here does I/O; the output sink decides how rows look on screen.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    model::{City, ForecastPayload},
    registry::CityRegistry,
};

/// Weather classes, keyed by upper bounds of the WMO code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    ClearSky,
    PartlyCloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    RainShowers,
    Thunderstorm,
    Unknown,
}

impl WeatherKind {
    /// Classify a WMO weather code. First matching bound wins.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::ClearSky,
            1..=3 => Self::PartlyCloudy,
            4..=48 => Self::Fog,
            49..=57 => Self::Drizzle,
            58..=67 => Self::Rain,
            68..=77 => Self::Snow,
            78..=82 => Self::RainShowers,
            83..=99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::RainShowers => "Rain showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }

    /// Emoji shown next to the description; empty for unknown codes.
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::ClearSky => "☀️",
            Self::PartlyCloudy => "⛅",
            Self::Fog => "🌫️",
            Self::Drizzle => "☔",
            Self::Rain => "🌦️",
            Self::Snow => "❄️",
            Self::RainShowers => "🌧️",
            Self::Thunderstorm => "⛈️",
            Self::Unknown => "",
        }
    }
}

impl std::fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub title: String,
    pub weather: WeatherKind,
    pub max: String,
    pub min: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub city: String,
    pub days: Vec<DayRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRow {
    pub index: usize,
    pub label: String,
    pub active: bool,
    pub removable: bool,
}

/// "Today, 26 Dec", "Tomorrow, 27 Dec", then "Sat, 28 Dec".
///
/// The label depends on the position in the forecast, not on the clock.
pub fn day_title(position: usize, date: NaiveDate) -> String {
    let day_month = date.format("%-d %b");
    match position {
        0 => format!("Today, {day_month}"),
        1 => format!("Tomorrow, {day_month}"),
        _ => format!("{}, {day_month}", date.format("%a")),
    }
}

/// The API value as is, with the unit appended.
pub fn temperature(value: f64) -> String {
    format!("{value} °C")
}

pub fn format_forecast(city_label: &str, payload: &ForecastPayload) -> ForecastView {
    let days = payload
        .days
        .iter()
        .take(ForecastPayload::DAYS)
        .enumerate()
        .map(|(i, day)| DayRow {
            title: day_title(i, day.date),
            weather: WeatherKind::from_code(day.weathercode),
            max: temperature(day.temp_max),
            min: temperature(day.temp_min),
        })
        .collect();

    ForecastView { city: city_label.to_string(), days }
}

/// Rows for the city list: the active city flagged, the synthetic one fixed.
pub fn city_rows(registry: &CityRegistry) -> Vec<CityRow> {
    let active = registry.active_index();
    registry
        .cities()
        .iter()
        .enumerate()
        .map(|(index, city): (usize, &City)| CityRow {
            index,
            label: city.label(),
            active: active == Some(index),
            removable: !city.is_synthetic(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, DailyForecast};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn day(d: NaiveDate, code: u32) -> DailyForecast {
        DailyForecast { date: d, weathercode: code, temp_max: 7.5, temp_min: -1.0 }
    }

    #[test]
    fn classifier_samples() {
        assert_eq!(WeatherKind::from_code(0).description(), "Clear sky");
        assert_eq!(WeatherKind::from_code(3).description(), "Partly cloudy");
        assert_eq!(WeatherKind::from_code(45).description(), "Fog");
        assert_eq!(WeatherKind::from_code(61).description(), "Rain");
        assert_eq!(WeatherKind::from_code(95).description(), "Thunderstorm");
        assert_eq!(WeatherKind::from_code(150).description(), "Unknown");
    }

    #[test]
    fn classifier_bounds_are_inclusive() {
        let cases = [
            (1, WeatherKind::PartlyCloudy),
            (4, WeatherKind::Fog),
            (48, WeatherKind::Fog),
            (49, WeatherKind::Drizzle),
            (57, WeatherKind::Drizzle),
            (58, WeatherKind::Rain),
            (67, WeatherKind::Rain),
            (68, WeatherKind::Snow),
            (77, WeatherKind::Snow),
            (78, WeatherKind::RainShowers),
            (82, WeatherKind::RainShowers),
            (83, WeatherKind::Thunderstorm),
            (99, WeatherKind::Thunderstorm),
            (100, WeatherKind::Unknown),
            (u32::MAX, WeatherKind::Unknown),
        ];
        for (code, kind) in cases {
            assert_eq!(WeatherKind::from_code(code), kind, "code {code}");
        }
    }

    #[test]
    fn icons_stay_out_of_descriptions() {
        assert_eq!(WeatherKind::ClearSky.icon(), "☀️");
        assert_eq!(WeatherKind::Unknown.icon(), "");
        assert_eq!(WeatherKind::Thunderstorm.to_string(), "Thunderstorm");
    }

    #[test]
    fn titles_follow_position_not_clock() {
        let payload = ForecastPayload {
            days: vec![day(date(2024, 12, 26), 0), day(date(2024, 12, 27), 3), day(date(2024, 12, 28), 95)],
        };
        let view = format_forecast("London, GB", &payload);

        let titles: Vec<_> = view.days.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Today, 26 Dec", "Tomorrow, 27 Dec", "Sat, 28 Dec"]);
        assert_eq!(view.city, "London, GB");
        assert_eq!(view.days[2].weather, WeatherKind::Thunderstorm);
    }

    #[test]
    fn temperatures_pass_through() {
        assert_eq!(temperature(12.0), "12 °C");
        assert_eq!(temperature(-3.5), "-3.5 °C");
        assert_eq!(temperature(7.25), "7.25 °C");
    }

    #[test]
    fn short_payload_renders_what_is_there() {
        let payload = ForecastPayload { days: vec![day(date(2025, 1, 1), 71)] };
        let view = format_forecast("Oslo, NO", &payload);
        assert_eq!(view.days.len(), 1);
        assert_eq!(view.days[0].title, "Today, 1 Jan");
        assert_eq!(view.days[0].max, "7.5 °C");
        assert_eq!(view.days[0].min, "-1 °C");
    }

    #[test]
    fn long_payload_is_cut_to_three() {
        let start = date(2025, 3, 1);
        let days = (0..5).map(|i| day(start + chrono::Days::new(i), 0)).collect();
        let view = format_forecast("x", &ForecastPayload { days });
        assert_eq!(view.days.len(), 3);
    }

    #[test]
    fn city_rows_mark_active_and_synthetic() {
        let mut reg = CityRegistry::new();
        reg.seed_located(City::current_location(Coordinates { latitude: 1.0, longitude: 2.0 }));
        reg.add(City::new("Paris", Some("FR".into()), 48.85, 2.35)).expect("add");

        let rows = city_rows(&reg);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Current location");
        assert!(!rows[0].removable);
        assert!(!rows[0].active);
        assert_eq!(rows[1].label, "Paris, FR");
        assert!(rows[1].removable && rows[1].active);
    }
}
