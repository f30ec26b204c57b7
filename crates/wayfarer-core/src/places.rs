//! Places lookup: geocoding and autocomplete against the map provider
//!
//! The HTTP provider speaks the Google Maps web service JSON format
//! (`status` plus `results`/`predictions`). Transport details stay in
//! this module; callers only see [`Place`] and [`PlaceSuggestion`].

use std::future::Future;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A geocoded location
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub place_id: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// One autocomplete prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
}

/// Source of place data for location fields
pub trait PlacesProvider: Send + Sync {
    fn autocomplete(
        &self,
        input: &str,
    ) -> impl Future<Output = ClientResult<Vec<PlaceSuggestion>>> + Send;

    fn geocode(&self, address: &str) -> impl Future<Output = ClientResult<Vec<Place>>> + Send;
}

/// reqwest-backed provider
#[derive(Debug, Clone)]
pub struct HttpPlacesProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpPlacesProvider {
    /// # Errors
    ///
    /// `ClientError::Config` when no map API key is configured.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api_key = config
            .maps_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::Config("map API key is not set".into()))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.places_base_url.clone(),
            api_key,
        })
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> ClientResult<Vec<u8>> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::Places(format!("bad places URL: {e}")))?;
        debug!(%url, "Places request");

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::Places(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Places(format!("response read failed: {e}")))?;
        if !status.is_success() {
            return Err(ClientError::Places(format!("provider returned HTTP {}", status)));
        }
        Ok(body.to_vec())
    }
}

impl PlacesProvider for HttpPlacesProvider {
    async fn autocomplete(&self, input: &str) -> ClientResult<Vec<PlaceSuggestion>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let body = self
            .fetch("place/autocomplete/json", &[("input", input)])
            .await?;
        parse_autocomplete(&body)
    }

    async fn geocode(&self, address: &str) -> ClientResult<Vec<Place>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.fetch("geocode/json", &[("address", address)]).await?;
        parse_geocode(&body)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    place_id: String,
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
}

/// `OK` and `ZERO_RESULTS` are successes; anything else is a provider error
fn check_status(status: &str, error_message: Option<String>) -> ClientResult<bool> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" => Ok(false),
        other => Err(ClientError::Places(match error_message {
            Some(message) => format!("{other}: {message}"),
            None => other.to_string(),
        })),
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ClientError::Places(format!("invalid provider payload: {e}")))
}

pub fn parse_geocode(body: &[u8]) -> ClientResult<Vec<Place>> {
    let decoded: GeocodeResponse = decode(body)?;
    if !check_status(&decoded.status, decoded.error_message)? {
        return Ok(Vec::new());
    }
    Ok(decoded
        .results
        .into_iter()
        .map(|r| Place {
            place_id: r.place_id,
            address: r.formatted_address,
            lat: r.geometry.location.lat,
            lng: r.geometry.location.lng,
        })
        .collect())
}

pub fn parse_autocomplete(body: &[u8]) -> ClientResult<Vec<PlaceSuggestion>> {
    let decoded: AutocompleteResponse = decode(body)?;
    if !check_status(&decoded.status, decoded.error_message)? {
        return Ok(Vec::new());
    }
    Ok(decoded
        .predictions
        .into_iter()
        .map(|p| PlaceSuggestion {
            place_id: p.place_id,
            description: p.description,
        })
        .collect())
}
