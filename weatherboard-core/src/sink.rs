use crate::{
    model::SearchCandidate,
    present::{CityRow, ForecastView},
};

/// Where the dashboard draws. Every call replaces what that area showed before.
pub trait OutputSink {
    fn cities(&mut self, rows: &[CityRow]);

    /// Forecast area: spinner while a fetch is outstanding.
    fn loading(&mut self);
    fn forecast(&mut self, view: &ForecastView);
    fn forecast_error(&mut self, message: &str);
    /// Forecast area: a plain message, e.g. the location prompt.
    fn notice(&mut self, message: &str);
    fn clear_forecast(&mut self);

    fn add_city_visible(&mut self, visible: bool);
    fn candidates(&mut self, candidates: &[SearchCandidate]);
    /// The confirmed candidate, echoed back into the query field.
    fn picked(&mut self, label: &str);
    /// Inline message under the add-city field; `None` clears it.
    fn inline_error(&mut self, message: Option<&str>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Cities(Vec<CityRow>),
    Loading,
    Forecast(ForecastView),
    ForecastError(String),
    Notice(String),
    ForecastCleared,
    AddCityVisible(bool),
    Candidates(Vec<SearchCandidate>),
    Picked(String),
    InlineError(Option<String>),
}

/// Sink that keeps every call, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn last_cities(&self) -> Option<&[CityRow]> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Cities(rows) => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn last_candidates(&self) -> Option<&[SearchCandidate]> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Candidates(c) => Some(c.as_slice()),
            _ => None,
        })
    }

    /// The latest event that touched the forecast area.
    pub fn forecast_area(&self) -> Option<&SinkEvent> {
        self.events.iter().rev().find(|e| {
            matches!(
                e,
                SinkEvent::Loading
                    | SinkEvent::Forecast(_)
                    | SinkEvent::ForecastError(_)
                    | SinkEvent::Notice(_)
                    | SinkEvent::ForecastCleared
            )
        })
    }

    pub fn last_inline_error(&self) -> Option<Option<&str>> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::InlineError(msg) => Some(msg.as_deref()),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl OutputSink for RecordingSink {
    fn cities(&mut self, rows: &[CityRow]) {
        self.events.push(SinkEvent::Cities(rows.to_vec()));
    }

    fn loading(&mut self) {
        self.events.push(SinkEvent::Loading);
    }

    fn forecast(&mut self, view: &ForecastView) {
        self.events.push(SinkEvent::Forecast(view.clone()));
    }

    fn forecast_error(&mut self, message: &str) {
        self.events.push(SinkEvent::ForecastError(message.to_string()));
    }

    fn notice(&mut self, message: &str) {
        self.events.push(SinkEvent::Notice(message.to_string()));
    }

    fn clear_forecast(&mut self) {
        self.events.push(SinkEvent::ForecastCleared);
    }

    fn add_city_visible(&mut self, visible: bool) {
        self.events.push(SinkEvent::AddCityVisible(visible));
    }

    fn candidates(&mut self, candidates: &[SearchCandidate]) {
        self.events.push(SinkEvent::Candidates(candidates.to_vec()));
    }

    fn picked(&mut self, label: &str) {
        self.events.push(SinkEvent::Picked(label.to_string()));
    }

    fn inline_error(&mut self, message: Option<&str>) {
        self.events.push(SinkEvent::InlineError(message.map(str::to_string)));
    }
}
