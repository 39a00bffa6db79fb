//! The dashboard controller.
//!
//! Owns the registry and every collaborator. User intents and fetch
//! completions arrive as [`Event`]s and are applied one at a time; each
//! mutation runs save, fetch and render in that order. Network calls run on
//! spawned tasks and report back through the event channel with the ticket
//! they were started under, so only the newest answer reaches the sink.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{FetchError, SearchError},
    forecast::{ForecastSource, OpenMeteoForecast},
    geocoding::{Geocoder, OpenMeteoGeocoder, SearchSession, SearchStart},
    geolocation::{GeolocationResolver, LOCATION_PROMPT, locator_from_config},
    latest::{LatestGate, Ticket},
    model::{City, ForecastPayload, SearchCandidate},
    present::{city_rows, format_forecast},
    registry::CityRegistry,
    sink::OutputSink,
    storage::{KeyValueStore, load_cities, save_cities},
};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ToggleAddCity,
    /// The search field changed.
    Query(String),
    /// A candidate of the latest search was chosen.
    Pick(usize),
    /// Add the chosen candidate.
    Add,
    Remove(usize),
    Select(usize),
    Refresh,
}

#[derive(Debug)]
pub enum Event {
    User(Intent),
    SearchCompleted {
        ticket: Ticket,
        outcome: Result<Vec<SearchCandidate>, SearchError>,
    },
    ForecastLoaded {
        ticket: Ticket,
        city: City,
        outcome: Result<ForecastPayload, FetchError>,
    },
}

/// External collaborators, injected once at startup.
pub struct Services {
    pub store: Arc<dyn KeyValueStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub forecast: Arc<dyn ForecastSource>,
    pub geolocation: GeolocationResolver,
}

impl Services {
    /// Open-Meteo clients and the configured locator around `store`.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let timeout = config.timeout();
        Ok(Self {
            store,
            geocoder: Arc::new(OpenMeteoGeocoder::new(config.geocoding_url.clone(), timeout)?),
            forecast: Arc::new(OpenMeteoForecast::new(config.forecast_url.clone(), timeout)?),
            geolocation: GeolocationResolver::new(locator_from_config(config)?),
        })
    }
}

pub struct Dashboard<S> {
    registry: CityRegistry,
    search: SearchSession,
    forecast_gate: LatestGate,
    add_city_visible: bool,
    inline_error: Option<String>,
    services: Services,
    sink: S,
    events: UnboundedSender<Event>,
    pending: usize,
}

impl<S: OutputSink> Dashboard<S> {
    pub fn new(services: Services, sink: S) -> (Self, UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let dashboard = Self {
            registry: CityRegistry::new(),
            search: SearchSession::new(),
            forecast_gate: LatestGate::new(),
            add_city_visible: false,
            inline_error: None,
            services,
            sink,
            events,
            pending: 0,
        };
        (dashboard, rx)
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    pub fn candidates(&self) -> &[SearchCandidate] {
        self.search.candidates()
    }

    pub fn add_city_visible(&self) -> bool {
        self.add_city_visible
    }

    /// The message next to the add-city controls, if one is showing.
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Number of network requests whose completion has not been handled yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Hydrate, then load the active city's forecast.
    pub async fn start(&mut self) {
        self.hydrate().await;
        self.fetch_active();
    }

    /// Restore the city list from storage, or seed it from the device position
    /// when nothing usable is stored. No forecast is requested.
    pub async fn hydrate(&mut self) {
        if let Some(saved) = load_cities(self.services.store.as_ref()).filter(|c| !c.is_empty()) {
            info!(count = saved.len(), "Restored saved cities");
            self.registry = CityRegistry::from_saved(saved);
            self.render_cities();
            return;
        }

        match self.services.geolocation.resolve().await {
            Ok(city) => {
                self.registry.seed_located(city);
                self.persist();
                self.render_cities();
            }
            Err(err) => {
                info!(reason = %err, "No device location, asking for a city");
                self.render_cities();
                self.set_add_city_visible(true);
                self.sink.notice(LOCATION_PROMPT);
            }
        }
    }

    pub fn dispatch(&mut self, intent: Intent) {
        self.handle(Event::User(intent));
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::User(intent) => self.apply(intent),
            Event::SearchCompleted { ticket, outcome } => {
                self.pending = self.pending.saturating_sub(1);
                if self.search.complete(ticket, outcome) {
                    self.sink.candidates(self.search.candidates());
                }
            }
            Event::ForecastLoaded { ticket, city, outcome } => {
                self.pending = self.pending.saturating_sub(1);
                self.forecast_loaded(ticket, &city, outcome);
            }
        }
    }

    /// Handle completions until no request is outstanding.
    pub async fn settle(&mut self, rx: &mut UnboundedReceiver<Event>) {
        while self.pending > 0 {
            match rx.recv().await {
                Some(event) => self.handle(event),
                None => break,
            }
        }
    }

    fn apply(&mut self, intent: Intent) {
        debug!(?intent, "Handling intent");
        match intent {
            Intent::ToggleAddCity => {
                let visible = !self.add_city_visible;
                self.set_add_city_visible(visible);
            }
            Intent::Query(text) => self.query(&text),
            Intent::Pick(index) => match self.search.pick(index) {
                Some(candidate) => {
                    let label = candidate.label();
                    self.sink.picked(&label);
                    self.sink.candidates(&[]);
                }
                None => warn!(index, "Ignoring pick outside the candidate list"),
            },
            Intent::Add => self.add_picked(),
            Intent::Remove(index) => self.remove(index),
            Intent::Select(index) => match self.registry.select_at(index).map(|_| ()) {
                Ok(()) => {
                    self.render_cities();
                    self.fetch_active();
                }
                Err(err) => warn!(index, error = %err, "Ignoring selection"),
            },
            Intent::Refresh => self.fetch_active(),
        }
    }

    fn query(&mut self, text: &str) {
        self.set_inline_error(None);
        self.sink.candidates(&[]);

        let SearchStart::Fetch { ticket, query } = self.search.begin(text) else {
            return;
        };

        let geocoder = Arc::clone(&self.services.geocoder);
        let events = self.events.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let outcome = geocoder.search(&query).await;
            // The receiver only goes away when the dashboard does.
            let _ = events.send(Event::SearchCompleted { ticket, outcome });
        });
    }

    fn add_picked(&mut self) {
        let city = match self.search.picked() {
            Ok(candidate) => candidate.clone().into_city(),
            Err(err) => {
                self.set_inline_error(Some(err.to_string()));
                return;
            }
        };

        if let Err(err) = self.registry.add(city) {
            self.set_inline_error(Some(err.to_string()));
            return;
        }

        self.search.reset();
        self.persist();
        self.render_cities();
        self.fetch_active();

        self.set_inline_error(None);
        self.sink.candidates(&[]);
        self.set_add_city_visible(false);
    }

    fn remove(&mut self, index: usize) {
        if self.registry.remove(index).is_none() {
            return;
        }

        self.persist();
        self.render_cities();

        if self.registry.active().is_some() {
            self.fetch_active();
        } else {
            self.forecast_gate.supersede();
            self.sink.clear_forecast();
        }
    }

    /// Start loading the active city's forecast. The spinner goes up before
    /// the request leaves.
    fn fetch_active(&mut self) {
        let Some(city) = self.registry.active().cloned() else {
            return;
        };

        let ticket = self.forecast_gate.begin();
        self.sink.loading();

        let source = Arc::clone(&self.services.forecast);
        let events = self.events.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let outcome = source.fetch(city.lat, city.lon).await;
            let _ = events.send(Event::ForecastLoaded { ticket, city, outcome });
        });
    }

    fn forecast_loaded(
        &mut self,
        ticket: Ticket,
        city: &City,
        outcome: Result<ForecastPayload, FetchError>,
    ) {
        if !self.forecast_gate.is_current(ticket) || self.registry.active() != Some(city) {
            debug!(city = %city.label(), "Dropping superseded forecast");
            return;
        }

        match outcome {
            Ok(payload) => self.sink.forecast(&format_forecast(&city.label(), &payload)),
            Err(err) => {
                warn!(city = %city.label(), error = %err, "Forecast failed");
                self.sink.forecast_error(FetchError::USER_MESSAGE);
            }
        }
    }

    fn persist(&self) {
        save_cities(self.services.store.as_ref(), self.registry.cities());
    }

    fn render_cities(&mut self) {
        let rows = city_rows(&self.registry);
        self.sink.cities(&rows);
    }

    fn set_inline_error(&mut self, message: Option<String>) {
        self.sink.inline_error(message.as_deref());
        self.inline_error = message;
    }

    fn set_add_city_visible(&mut self, visible: bool) {
        self.add_city_visible = visible;
        self.sink.add_city_visible(visible);
    }
}
