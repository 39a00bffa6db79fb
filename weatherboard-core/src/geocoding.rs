//! City-name search against the geocoding service.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    error::{RegistryError, SearchError},
    latest::{LatestGate, Ticket},
    model::SearchCandidate,
};

/// Queries shorter than this never hit the network.
pub const MIN_QUERY_CHARS: usize = 2;
/// Most candidates a search returns.
pub const MAX_CANDIDATES: usize = 5;

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SearchError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    results: Option<Vec<GeoResult>>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let count = MAX_CANDIDATES.to_string();
        debug!(url = %url, "Searching cities");

        let res = self
            .http
            .get(&url)
            .query(&[("name", query), ("count", count.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        let body: GeoResponse = res.json().await?;

        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .take(MAX_CANDIDATES)
            .enumerate()
            .map(|(index, r)| SearchCandidate {
                index,
                name: r.name,
                country: r.country,
                lat: r.latitude,
                lon: r.longitude,
            })
            .collect())
    }
}

/// What the caller should do after the input changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStart {
    /// Query too short; the candidate list is already empty.
    Skip,
    /// Run the query and report back with the ticket.
    Fetch { ticket: Ticket, query: String },
}

/// Candidate list and pick for the add-city flow.
///
/// Each input change starts a new search and drops older candidates. Only the
/// completion carrying the newest ticket is applied.
#[derive(Debug, Default)]
pub struct SearchSession {
    gate: LatestGate,
    candidates: Vec<SearchCandidate>,
    picked: Option<SearchCandidate>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, input: &str) -> SearchStart {
        self.candidates.clear();
        self.picked = None;

        let query = input.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            self.gate.supersede();
            return SearchStart::Skip;
        }

        SearchStart::Fetch { ticket: self.gate.begin(), query: query.to_string() }
    }

    /// Apply a finished search. Returns `false` when the result was stale and
    /// dropped.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<SearchCandidate>, SearchError>,
    ) -> bool {
        if !self.gate.is_current(ticket) {
            debug!(?ticket, "Dropping superseded search result");
            return false;
        }

        self.candidates = match outcome {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "City search failed");
                Vec::new()
            }
        };
        true
    }

    pub fn candidates(&self) -> &[SearchCandidate] {
        &self.candidates
    }

    /// Confirm the candidate at `index` of the latest batch.
    pub fn pick(&mut self, index: usize) -> Option<&SearchCandidate> {
        let candidate = self.candidates.get(index)?.clone();
        self.picked = Some(candidate);
        self.picked.as_ref()
    }

    pub fn picked(&self) -> Result<&SearchCandidate, RegistryError> {
        self.picked.as_ref().ok_or(RegistryError::NoSelection)
    }

    /// Forget candidates and pick, and drop any search still running.
    pub fn reset(&mut self) {
        self.gate.supersede();
        self.candidates.clear();
        self.picked = None;
    }
}
