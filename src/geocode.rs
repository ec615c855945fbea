use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::geo::{Bounds, Coordinate, PlaceSelection};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("geocoding backend error: {0}")]
    Backend(String),
    #[error("geocoding returned status {0}")]
    Status(String),
    #[error("no geocoding results for \"{0}\"")]
    NoResults(String),
    #[error("geocoding request timed out")]
    Timeout,
}

/// A single forward or reverse lookup against the geocoding service.
#[derive(Clone, Debug)]
pub enum GeocodeQuery {
    Forward(String),
    Reverse(Coordinate),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeocodeStatus {
    Ok,
    ZeroResults,
    Error(String),
}

impl GeocodeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, GeocodeStatus::Ok)
    }
}

impl std::fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeStatus::Ok => f.write_str("OK"),
            GeocodeStatus::ZeroResults => f.write_str("ZERO_RESULTS"),
            GeocodeStatus::Error(raw) => f.write_str(raw),
        }
    }
}

/// One geocoding hit, in the service's relevance order.
#[derive(Clone, Debug)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub location: Coordinate,
    pub bounds: Option<Bounds>,
}

#[derive(Clone, Debug)]
pub struct GeocodeReply {
    pub status: GeocodeStatus,
    pub results: Vec<GeocodeResult>,
}

/// The external geocoding collaborator. Implementations perform one lookup;
/// ranking and chaining live in [`GeocodeResolver`].
pub trait GeocodingBackend: Send + Sync + 'static {
    fn geocode(
        &self,
        query: GeocodeQuery,
    ) -> impl Future<Output = Result<GeocodeReply, ResolveError>> + Send;
}

/// Resolves free-text place names to [`PlaceSelection`]s. Pure lookup, no
/// side effects; every failure shape surfaces as a [`ResolveError`].
pub struct GeocodeResolver<G> {
    backend: Arc<G>,
}

impl<G> Clone for GeocodeResolver<G> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<G: GeocodingBackend> GeocodeResolver<G> {
    pub fn new(backend: Arc<G>) -> Self {
        Self { backend }
    }

    /// Candidate list for a query: forward geocode, then reverse geocode the
    /// best hit's location. The two calls are strictly sequential; the
    /// reverse pass's results become the candidates (service order kept).
    /// When the reverse pass yields nothing usable the forward hit stands in
    /// as the only candidate.
    pub async fn resolve(&self, query: &str) -> Result<Vec<PlaceSelection>, ResolveError> {
        let anchor = self.forward_best(query).await?;

        let reverse = self
            .backend
            .geocode(GeocodeQuery::Reverse(anchor.location))
            .await?;

        if reverse.status.is_ok() && !reverse.results.is_empty() {
            let candidates = reverse
                .results
                .into_iter()
                .map(|result| PlaceSelection {
                    label: result.formatted_address,
                    coordinate: result.location,
                    bounds: result.bounds,
                })
                .collect();
            return Ok(candidates);
        }

        tracing::debug!(
            target: "geocode",
            query,
            status = %reverse.status,
            "reverse pass empty, falling back to forward hit"
        );
        Ok(vec![PlaceSelection {
            label: anchor.formatted_address,
            coordinate: anchor.location,
            bounds: anchor.bounds,
        }])
    }

    /// First-match resolution: forward geocode only, best hit wins.
    pub async fn resolve_exact(&self, query: &str) -> Result<PlaceSelection, ResolveError> {
        let best = self.forward_best(query).await?;
        Ok(PlaceSelection {
            label: best.formatted_address,
            coordinate: best.location,
            bounds: best.bounds,
        })
    }

    async fn forward_best(&self, query: &str) -> Result<GeocodeResult, ResolveError> {
        let reply = self
            .backend
            .geocode(GeocodeQuery::Forward(query.to_string()))
            .await?;

        if !reply.status.is_ok() {
            return Err(ResolveError::Status(reply.status.to_string()));
        }
        reply
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoResults(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedGeocoder {
        replies: Mutex<Vec<Result<GeocodeReply, ResolveError>>>,
        queries: Mutex<Vec<GeocodeQuery>>,
    }

    impl ScriptedGeocoder {
        fn new(replies: Vec<Result<GeocodeReply, ResolveError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl GeocodingBackend for ScriptedGeocoder {
        async fn geocode(&self, query: GeocodeQuery) -> Result<GeocodeReply, ResolveError> {
            self.queries.lock().unwrap().push(query);
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn hit(address: &str, lat: f64, lng: f64) -> GeocodeResult {
        GeocodeResult {
            formatted_address: address.to_string(),
            location: Coordinate::new(lat, lng),
            bounds: None,
        }
    }

    fn ok_reply(results: Vec<GeocodeResult>) -> Result<GeocodeReply, ResolveError> {
        Ok(GeocodeReply {
            status: GeocodeStatus::Ok,
            results,
        })
    }

    #[tokio::test]
    async fn resolve_chains_forward_then_reverse() {
        let backend = Arc::new(ScriptedGeocoder::new(vec![
            ok_reply(vec![hit("Cathedral of Learning", 40.4446, -79.9533)]),
            ok_reply(vec![
                hit("4200 Fifth Ave, Pittsburgh, PA", 40.4446, -79.9533),
                hit("Oakland, Pittsburgh, PA", 40.4415, -79.9560),
            ]),
        ]));
        let resolver = GeocodeResolver::new(Arc::clone(&backend));

        let candidates = resolver.resolve("Cathedral of Learning").await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, "4200 Fifth Ave, Pittsburgh, PA");

        let queries = backend.queries.lock().unwrap();
        assert!(matches!(queries[0], GeocodeQuery::Forward(_)));
        assert!(matches!(queries[1], GeocodeQuery::Reverse(_)));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_forward_hit_when_reverse_is_empty() {
        let backend = Arc::new(ScriptedGeocoder::new(vec![
            ok_reply(vec![hit("Hillman Library", 40.4435, -79.9545)]),
            Ok(GeocodeReply {
                status: GeocodeStatus::ZeroResults,
                results: Vec::new(),
            }),
        ]));
        let resolver = GeocodeResolver::new(backend);

        let candidates = resolver.resolve("Hillman Library").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].label, "Hillman Library");
    }

    #[tokio::test]
    async fn resolve_exact_uses_only_the_forward_pass() {
        let backend = Arc::new(ScriptedGeocoder::new(vec![ok_reply(vec![hit(
            "Hillman Library",
            40.4435,
            -79.9545,
        )])]));
        let resolver = GeocodeResolver::new(Arc::clone(&backend));

        let place = resolver.resolve_exact("Hillman Library").await.unwrap();
        assert_eq!(place.coordinate, Coordinate::new(40.4435, -79.9545));
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_ok_status_surfaces_as_resolution_failure() {
        let backend = Arc::new(ScriptedGeocoder::new(vec![Ok(GeocodeReply {
            status: GeocodeStatus::Error("OVER_QUERY_LIMIT".to_string()),
            results: Vec::new(),
        })]));
        let resolver = GeocodeResolver::new(backend);

        let err = resolver.resolve_exact("anywhere").await.unwrap_err();
        assert!(matches!(err, ResolveError::Status(_)));
    }

    #[tokio::test]
    async fn empty_result_list_surfaces_as_resolution_failure() {
        let backend = Arc::new(ScriptedGeocoder::new(vec![ok_reply(Vec::new())]));
        let resolver = GeocodeResolver::new(backend);

        let err = resolver.resolve_exact("nowhere").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoResults(_)));
    }
}
