use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::ServiceConfig;
use crate::directions::{
    DirectionsBackend, DirectionsReply, DirectionsStatus, Route, RouteError, RouteLeg,
    RouteRequest, RouteStep,
};

/// Walking directions over HTTP, against a Google-directions-shaped JSON
/// endpoint.
pub struct HttpDirections {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpDirections {
    pub fn new(config: &ServiceConfig) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout + Duration::from_secs(1))
            .build()
            .map_err(|err| RouteError::Backend(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.directions_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl DirectionsBackend for HttpDirections {
    async fn route(&self, request: RouteRequest) -> Result<DirectionsReply, RouteError> {
        let mut http_request = self.http.get(self.endpoint.clone()).query(&[
            ("origin", request.origin.to_string()),
            ("destination", request.destination.to_string()),
            ("mode", request.mode.as_str().to_string()),
        ]);
        if let Some(key) = &self.api_key {
            http_request = http_request.query(&[("key", key.as_str())]);
        }

        tracing::debug!(
            target: "net",
            origin = %request.origin,
            destination = %request.destination,
            "directions request"
        );
        let response = http_request
            .send()
            .await
            .map_err(|err| RouteError::Backend(err.to_string()))?;
        let wire: DirectionsWire = response
            .json()
            .await
            .map_err(|err| RouteError::Backend(err.to_string()))?;

        Ok(wire.into_reply())
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsWire {
    status: String,
    #[serde(default)]
    routes: Vec<RouteWire>,
}

#[derive(Debug, Deserialize)]
struct RouteWire {
    #[serde(default)]
    legs: Vec<LegWire>,
}

#[derive(Debug, Deserialize)]
struct LegWire {
    #[serde(default)]
    steps: Vec<StepWire>,
}

#[derive(Debug, Deserialize)]
struct StepWire {
    #[serde(default)]
    html_instructions: String,
}

impl DirectionsWire {
    fn into_reply(self) -> DirectionsReply {
        let status = match self.status.as_str() {
            "OK" => DirectionsStatus::Ok,
            "NOT_FOUND" => DirectionsStatus::NotFound,
            "ZERO_RESULTS" => DirectionsStatus::ZeroResults,
            other => DirectionsStatus::Error(other.to_string()),
        };
        let routes = self
            .routes
            .into_iter()
            .map(|route| Route {
                legs: route
                    .legs
                    .into_iter()
                    .map(|leg| RouteLeg {
                        steps: leg
                            .steps
                            .into_iter()
                            .map(|step| RouteStep {
                                instructions: step.html_instructions,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        DirectionsReply { status, routes }
    }
}
