use std::future::Future;
use std::sync::Arc;

use kuchiki::parse_html;
use kuchiki::traits::*;
use thiserror::Error;

use crate::geo::Coordinate;

/// Fixed user-visible text for a failed route computation.
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Cannot find route for this request.";

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("directions backend error: {0}")]
    Backend(String),
    #[error("directions request timed out")]
    Timeout,
}

/// Either endpoint of a route request: a place name the service geocodes
/// itself, or an already-resolved coordinate.
#[derive(Clone, Debug)]
pub enum Waypoint {
    Place(String),
    Coordinate(Coordinate),
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Waypoint::Place(text) => f.write_str(text),
            Waypoint::Coordinate(at) => write!(f, "{at}"),
        }
    }
}

/// Only walking is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelMode {
    Walking,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub mode: TravelMode,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DirectionsStatus {
    Ok,
    NotFound,
    ZeroResults,
    Error(String),
}

impl DirectionsStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, DirectionsStatus::Ok)
    }
}

impl std::fmt::Display for DirectionsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionsStatus::Ok => f.write_str("OK"),
            DirectionsStatus::NotFound => f.write_str("NOT_FOUND"),
            DirectionsStatus::ZeroResults => f.write_str("ZERO_RESULTS"),
            DirectionsStatus::Error(raw) => f.write_str(raw),
        }
    }
}

/// One atomic instruction within a leg, as the provider sent it: the
/// instruction text may carry markup.
#[derive(Clone, Debug)]
pub struct RouteStep {
    pub instructions: String,
}

/// One origin-to-destination segment of a route.
#[derive(Clone, Debug)]
pub struct RouteLeg {
    pub steps: Vec<RouteStep>,
}

#[derive(Clone, Debug)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
}

#[derive(Clone, Debug)]
pub struct DirectionsReply {
    pub status: DirectionsStatus,
    pub routes: Vec<Route>,
}

/// The external routing collaborator.
pub trait DirectionsBackend: Send + Sync + 'static {
    fn route(
        &self,
        request: RouteRequest,
    ) -> impl Future<Output = Result<DirectionsReply, RouteError>> + Send;
}

/// A successfully computed route: the provider's full reply, kept for panel
/// rendering, plus the flattened plain-text steps.
#[derive(Clone, Debug)]
pub struct ComputedRoute {
    pub reply: DirectionsReply,
    pub steps: Vec<String>,
}

/// Outcome of one computation. A non-OK provider status is an expected
/// outcome, not an error; transport failures are [`RouteError`]s.
#[derive(Clone, Debug)]
pub enum RouteOutcome {
    Found(ComputedRoute),
    NotFound,
}

pub struct RouteComputer<D> {
    backend: Arc<D>,
}

impl<D> Clone for RouteComputer<D> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<D: DirectionsBackend> RouteComputer<D> {
    pub fn new(backend: Arc<D>) -> Self {
        Self { backend }
    }

    /// Request a walking route. No retries; a failure is terminal until the
    /// caller issues a new request.
    pub async fn compute_walking_route(
        &self,
        origin: Waypoint,
        destination: Waypoint,
    ) -> Result<RouteOutcome, RouteError> {
        let request = RouteRequest {
            origin,
            destination,
            mode: TravelMode::Walking,
        };
        let reply = self.backend.route(request).await?;

        if !reply.status.is_ok() {
            tracing::debug!(target: "directions", status = %reply.status, "route not found");
            return Ok(RouteOutcome::NotFound);
        }

        let steps = flatten_steps(&reply);
        Ok(RouteOutcome::Found(ComputedRoute { reply, steps }))
    }
}

/// Flatten the first route's legs into ordered plain-text instructions.
fn flatten_steps(reply: &DirectionsReply) -> Vec<String> {
    let Some(route) = reply.routes.first() else {
        return Vec::new();
    };
    route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| strip_instruction_markup(&step.instructions))
        .collect()
}

/// Extract the rendered text of a markup instruction: parse it and take the
/// text nodes only, so nested tags are fully removed and entities decode.
pub fn strip_instruction_markup(instructions: &str) -> String {
    let parsed = parse_html().one(instructions);
    parsed.text_contents().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(instructions: &[&str]) -> RouteLeg {
        RouteLeg {
            steps: instructions
                .iter()
                .map(|text| RouteStep {
                    instructions: text.to_string(),
                })
                .collect(),
        }
    }

    struct ScriptedDirections {
        reply: DirectionsReply,
    }

    impl DirectionsBackend for ScriptedDirections {
        async fn route(&self, _request: RouteRequest) -> Result<DirectionsReply, RouteError> {
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn strips_simple_tags() {
        assert_eq!(strip_instruction_markup("<b>Turn</b> left"), "Turn left");
    }

    #[test]
    fn strips_nested_tags() {
        assert_eq!(
            strip_instruction_markup("Head <b>south<wbr/> on <i>Forbes</i> Ave</b>"),
            "Head south on Forbes Ave"
        );
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            strip_instruction_markup("Fifth &amp; Forbes"),
            "Fifth & Forbes"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_instruction_markup("Head south"), "Head south");
    }

    #[test]
    fn flattens_every_leg_in_order() {
        let reply = DirectionsReply {
            status: DirectionsStatus::Ok,
            routes: vec![Route {
                legs: vec![
                    leg(&["Head south", "<b>Turn</b> left"]),
                    leg(&["Continue onto Schenley Dr"]),
                ],
            }],
        };
        let steps = flatten_steps(&reply);
        assert_eq!(
            steps,
            vec!["Head south", "Turn left", "Continue onto Schenley Dr"]
        );
    }

    #[test]
    fn only_the_first_route_is_flattened() {
        let reply = DirectionsReply {
            status: DirectionsStatus::Ok,
            routes: vec![
                Route {
                    legs: vec![leg(&["Head south"])],
                },
                Route {
                    legs: vec![leg(&["Head north"])],
                },
            ],
        };
        assert_eq!(flatten_steps(&reply), vec!["Head south"]);
    }

    #[tokio::test]
    async fn non_ok_status_yields_not_found() {
        let computer = RouteComputer::new(Arc::new(ScriptedDirections {
            reply: DirectionsReply {
                status: DirectionsStatus::NotFound,
                routes: Vec::new(),
            },
        }));
        let outcome = computer
            .compute_walking_route(
                Waypoint::Place("a".to_string()),
                Waypoint::Place("b".to_string()),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RouteOutcome::NotFound));
    }
}
