use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::ServiceConfig;
use crate::geo::{Bounds, Coordinate};
use crate::geocode::{
    GeocodeQuery, GeocodeReply, GeocodeResult, GeocodeStatus, GeocodingBackend, ResolveError,
};

/// Geocoding over HTTP, against a Google-geocoding-shaped JSON endpoint.
pub struct HttpGeocoder {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpGeocoder {
    pub fn new(config: &ServiceConfig) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout + Duration::from_secs(1))
            .build()
            .map_err(|err| ResolveError::Backend(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.geocode_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl GeocodingBackend for HttpGeocoder {
    async fn geocode(&self, query: GeocodeQuery) -> Result<GeocodeReply, ResolveError> {
        let mut request = self.http.get(self.endpoint.clone());
        request = match &query {
            GeocodeQuery::Forward(address) => request.query(&[("address", address.as_str())]),
            GeocodeQuery::Reverse(at) => request.query(&[("latlng", at.to_string().as_str())]),
        };
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        tracing::debug!(target: "net", query = ?query, "geocode request");
        let response = request
            .send()
            .await
            .map_err(|err| ResolveError::Backend(err.to_string()))?;
        let wire: GeocodeWire = response
            .json()
            .await
            .map_err(|err| ResolveError::Backend(err.to_string()))?;

        Ok(wire.into_reply())
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeWire {
    status: String,
    #[serde(default)]
    results: Vec<ResultWire>,
}

#[derive(Debug, Deserialize)]
struct ResultWire {
    formatted_address: String,
    geometry: GeometryWire,
}

#[derive(Debug, Deserialize)]
struct GeometryWire {
    location: LatLngWire,
    bounds: Option<BoundsWire>,
}

#[derive(Debug, Deserialize)]
struct LatLngWire {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct BoundsWire {
    northeast: LatLngWire,
    southwest: LatLngWire,
}

impl GeocodeWire {
    fn into_reply(self) -> GeocodeReply {
        let status = match self.status.as_str() {
            "OK" => GeocodeStatus::Ok,
            "ZERO_RESULTS" => GeocodeStatus::ZeroResults,
            other => GeocodeStatus::Error(other.to_string()),
        };
        let results = self
            .results
            .into_iter()
            .map(|result| GeocodeResult {
                formatted_address: result.formatted_address,
                location: Coordinate::new(result.geometry.location.lat, result.geometry.location.lng),
                bounds: result.geometry.bounds.map(|bounds| {
                    Bounds::new(
                        Coordinate::new(bounds.southwest.lat, bounds.southwest.lng),
                        Coordinate::new(bounds.northeast.lat, bounds.northeast.lng),
                    )
                }),
            })
            .collect();
        GeocodeReply { status, results }
    }
}
