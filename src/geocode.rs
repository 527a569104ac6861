//! # Reverse Geocoding
//!
//! Turns a coordinate into a human-readable address for display next to a
//! saved place or an alarm. Addresses are decoration only: every failure
//! path ends in "no address" and never blocks arming an alarm.
//!
//! ## Service
//! [`NominatimGeocoder`] queries an OpenStreetMap Nominatim `reverse`
//! endpoint (`format=jsonv2`). The public instance requires an identifying
//! `User-Agent`, which comes from configuration.

use crate::config::GeocodingConfig;
use crate::error::AlarmError;
use crate::Coordinate;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

/// Reverse lookup from a coordinate to an address string.
pub trait Geocoder {
    fn reverse(&self, at: Coordinate) -> impl Future<Output = Result<String, AlarmError>> + Send;
}

/// Look up an address, logging and discarding any failure.
pub async fn address_for<G: Geocoder>(geocoder: &G, at: Coordinate) -> Option<String> {
    match geocoder.reverse(at).await {
        Ok(address) => Some(address),
        Err(error) => {
            warn!(%error, position = %at, "no address for position");
            None
        }
    }
}

/// Reverse geocoder backed by a Nominatim HTTP endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>) -> Self {
        NominatimGeocoder {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self::new(config.endpoint.clone(), config.user_agent.clone())
    }
}

impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<String, AlarmError> {
        debug!(position = %at, endpoint = %self.endpoint, "reverse geocoding");
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;

        address_from(response)
    }
}

/// Extract the address from a decoded Nominatim `reverse` response.
fn address_from(response: ReverseResponse) -> Result<String, AlarmError> {
    if let Some(reason) = response.error {
        return Err(AlarmError::GeocodeUnavailable(reason));
    }
    response
        .display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AlarmError::GeocodeUnavailable("response has no display_name".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGeocoder(Option<&'static str>);

    impl Geocoder for FixedGeocoder {
        async fn reverse(&self, _at: Coordinate) -> Result<String, AlarmError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| AlarmError::GeocodeUnavailable("offline".to_string()))
        }
    }

    /// Decode a body the same way `Response::json` does, then extract.
    fn parse_reverse(body: &str) -> Result<String, AlarmError> {
        address_from(serde_json::from_str(body)?)
    }

    #[test]
    fn test_parse_display_name() {
        let body = r#"{"place_id":1,"display_name":"Pier 17, New York, United States"}"#;
        assert_eq!(parse_reverse(body).unwrap(), "Pier 17, New York, United States");
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"error":"Unable to geocode"}"#;
        assert!(matches!(
            parse_reverse(body),
            Err(AlarmError::GeocodeUnavailable(reason)) if reason == "Unable to geocode"
        ));
    }

    #[test]
    fn test_parse_blank_name_is_unavailable() {
        assert!(matches!(
            parse_reverse(r#"{"display_name":"  "}"#),
            Err(AlarmError::GeocodeUnavailable(_))
        ));
        assert!(matches!(
            parse_reverse("<html>"),
            Err(AlarmError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_http_error() {
        // Port 9 (discard) is closed on test machines, so the connect fails fast
        let geocoder = NominatimGeocoder::new("http://127.0.0.1:9/reverse", "arrival-alarm-tests");
        let at = Coordinate::new(40.0, -73.0);
        assert!(matches!(geocoder.reverse(at).await, Err(AlarmError::Http(_))));
        assert_eq!(address_for(&geocoder, at).await, None);
    }

    #[tokio::test]
    async fn test_address_for_swallows_failures() {
        let at = Coordinate::new(40.0, -73.0);
        assert_eq!(
            address_for(&FixedGeocoder(Some("Somewhere")), at).await,
            Some("Somewhere".to_string())
        );
        assert_eq!(address_for(&FixedGeocoder(None), at).await, None);
    }
}
