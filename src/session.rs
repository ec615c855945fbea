use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};

use crate::directions::{
    DirectionsBackend, RouteComputer, RouteError, RouteOutcome, Waypoint, ROUTE_NOT_FOUND_MESSAGE,
};
use crate::geo::{PlaceSelection, Role};
use crate::geocode::{GeocodeResolver, GeocodingBackend, ResolveError};
use crate::map::{MapSurface, MarkerManager};
use crate::voice::{VoiceCommand, VoiceOutput};

pub const PROMPT_IDLE: &str = "Say \"Set Destination\" Command.";
pub const PROMPT_SOURCE_SET: &str = "Say \"Get Path\" or \"Set Source\" or \"End Route\" Command.";
pub const PROMPT_DESTINATION_SET: &str =
    "Say \"Set Destination\" or \"Set Source\" or \"End Route\" Command.";
pub const PROMPT_ROUTE_COMPUTED: &str =
    "Say \"Start Route\" or \"Set Destination\" or \"Set Source\" or \"End Route\" Command.";
pub const PROMPT_ROUTE_ACTIVE: &str = "Say \"End Route\" or \"Start Route\" Command.";

pub const IDLE_SOURCE_LABEL: &str = "Speak a building name. Command: set source";
pub const IDLE_DESTINATION_LABEL: &str = "Speak a building name. Command: set destination";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SourceSet,
    DestinationSet,
    RouteComputed,
    RouteActive,
}

/// Rejections the session reports synchronously. Service failures never show
/// up here; they arrive later as completion events and are surfaced through
/// the map's error region.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
    #[error("unrecognized voice command: {0}")]
    UnrecognizedCommand(String),
}

/// Everything the session's event loop consumes: bridge/UI commands plus the
/// completion events posted back by in-flight service calls. Each completion
/// carries the generation captured when its request was spawned.
#[derive(Debug)]
pub enum SessionEvent {
    Command(VoiceCommand),
    ClearRoute,
    EndpointResolved {
        role: Role,
        generation: u64,
        outcome: Result<PlaceSelection, ResolveError>,
    },
    RouteReady {
        generation: u64,
        outcome: Result<RouteOutcome, RouteError>,
    },
}

/// The route-session state machine. One instance per application context;
/// collaborators are injected, never reached as globals. Geocode and route
/// calls run as spawned tasks that post [`SessionEvent`]s back through the
/// channel, so the session itself only ever mutates state on its own loop.
///
/// Superseded requests are not cancelled; instead every slot (source,
/// destination, route) carries a generation counter and stale completions
/// are discarded, so the last request wins.
pub struct RouteSession<G, D, M, V> {
    resolver: GeocodeResolver<G>,
    computer: RouteComputer<D>,
    map: M,
    markers: MarkerManager,
    voice: Option<V>,
    // Weak so the session's own spawned calls never keep the channel open;
    // the loop ends once the bridge side drops its sender.
    events: WeakUnboundedSender<SessionEvent>,
    request_timeout: Duration,
    source: Option<PlaceSelection>,
    destination: Option<PlaceSelection>,
    steps: Vec<String>,
    active: bool,
    source_generation: u64,
    destination_generation: u64,
    route_generation: u64,
}

impl<G, D, M, V> RouteSession<G, D, M, V>
where
    G: GeocodingBackend,
    D: DirectionsBackend,
    M: MapSurface,
    V: VoiceOutput,
{
    pub fn new(
        resolver: GeocodeResolver<G>,
        computer: RouteComputer<D>,
        map: M,
        voice: Option<V>,
        events: UnboundedSender<SessionEvent>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            computer,
            map,
            markers: MarkerManager::new(),
            voice,
            events: events.downgrade(),
            request_timeout,
            source: None,
            destination: None,
            steps: Vec::new(),
            active: false,
            source_generation: 0,
            destination_generation: 0,
            route_generation: 0,
        }
    }

    /// Write the idle prompts once at startup.
    pub fn announce_ready(&mut self) {
        self.map.set_building_label(Role::Source, IDLE_SOURCE_LABEL);
        self.map
            .set_building_label(Role::Destination, IDLE_DESTINATION_LABEL);
        self.map.show_help(PROMPT_IDLE);
    }

    pub fn state(&self) -> SessionState {
        if self.active {
            SessionState::RouteActive
        } else if !self.steps.is_empty() {
            SessionState::RouteComputed
        } else if self.destination.is_some() {
            SessionState::DestinationSet
        } else if self.source.is_some() {
            SessionState::SourceSet
        } else {
            SessionState::Idle
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn source(&self) -> Option<&PlaceSelection> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&PlaceSelection> {
        self.destination.as_ref()
    }

    pub fn has_marker(&self, role: Role) -> bool {
        self.markers.has_marker(role)
    }

    pub fn surface(&self) -> &M {
        &self.map
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => self.handle_command(command),
            SessionEvent::ClearRoute => self.clear_route(),
            SessionEvent::EndpointResolved {
                role,
                generation,
                outcome,
            } => self.apply_resolution(role, generation, outcome),
            SessionEvent::RouteReady {
                generation,
                outcome,
            } => self.apply_route(generation, outcome),
        }
    }

    /// Bridge/UI entry point. Programmatic misuse never crashes the session:
    /// rejected transitions land in the error region and the machine stays
    /// where it was.
    pub fn handle_command(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::SetSource { building, query } => {
                self.set_source(building.as_deref(), &query)
            }
            VoiceCommand::SetDestination { building, query } => {
                self.set_destination(building.as_deref(), &query)
            }
            VoiceCommand::GetPath => {
                if let Err(err) = self.get_path() {
                    self.surface_error(&err.to_string(), false);
                }
            }
            VoiceCommand::RouteStart => {
                if let Err(err) = self.route_start() {
                    self.surface_error(&err.to_string(), false);
                }
            }
            VoiceCommand::RouteStop => self.route_stop(),
            VoiceCommand::Unrecognized { message } => self.on_unrecognized(&message),
        }
    }

    pub fn set_source(&mut self, building: Option<&str>, query: &str) {
        self.set_endpoint(Role::Source, building, query);
    }

    pub fn set_destination(&mut self, building: Option<&str>, query: &str) {
        self.set_endpoint(Role::Destination, building, query);
    }

    fn set_endpoint(&mut self, role: Role, building: Option<&str>, query: &str) {
        self.discard_computed_route();

        self.map.set_endpoint_text(role, query);
        if let Some(building) = building {
            self.map.set_building_label(role, building);
        }
        self.map.show_help(match role {
            Role::Source => PROMPT_SOURCE_SET,
            Role::Destination => PROMPT_DESTINATION_SET,
        });

        let generation = self.bump_endpoint(role);
        let resolver = self.resolver.clone();
        let events = self.events.clone();
        let timeout = self.request_timeout;
        let query = query.to_string();
        tracing::debug!(target: "session", %role, %query, generation, "resolving endpoint");
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, resolver.resolve_exact(&query)).await
            {
                Ok(result) => result,
                Err(_) => Err(ResolveError::Timeout),
            };
            if let Some(events) = events.upgrade() {
                let _ = events.send(SessionEvent::EndpointResolved {
                    role,
                    generation,
                    outcome,
                });
            }
        });
    }

    /// Request the walking route for the current endpoints. Rejected without
    /// touching the routing service when either endpoint is missing.
    pub fn get_path(&mut self) -> Result<(), SessionError> {
        let origin = match self.source.as_ref() {
            Some(place) => Waypoint::Place(place.label.clone()),
            None => {
                return Err(SessionError::InvalidTransition(
                    "source must be set before computing a route",
                ))
            }
        };
        let destination = match self.destination.as_ref() {
            Some(place) => Waypoint::Place(place.label.clone()),
            None => {
                return Err(SessionError::InvalidTransition(
                    "destination must be set before computing a route",
                ))
            }
        };

        let generation = self.bump_route();
        let computer = self.computer.clone();
        let events = self.events.clone();
        let timeout = self.request_timeout;
        tracing::debug!(target: "session", generation, "computing walking route");
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(
                timeout,
                computer.compute_walking_route(origin, destination),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RouteError::Timeout),
            };
            if let Some(events) = events.upgrade() {
                let _ = events.send(SessionEvent::RouteReady {
                    generation,
                    outcome,
                });
            }
        });
        Ok(())
    }

    /// Deliver the computed steps through the voice collaborator, in order,
    /// then mark the route active. Repeating the command while the route is
    /// active re-speaks the steps.
    pub fn route_start(&mut self) -> Result<(), SessionError> {
        if !matches!(
            self.state(),
            SessionState::RouteComputed | SessionState::RouteActive
        ) {
            return Err(SessionError::InvalidTransition(
                "no computed route to start",
            ));
        }
        if let Some(voice) = &self.voice {
            for step in &self.steps {
                voice.speak(step);
            }
        }
        self.active = true;
        self.map.show_help(PROMPT_ROUTE_ACTIVE);
        Ok(())
    }

    /// Voice-driven stop: full reset back to the idle prompts.
    pub fn route_stop(&mut self) {
        self.reset();
        self.map.set_building_label(Role::Source, IDLE_SOURCE_LABEL);
        self.map
            .set_building_label(Role::Destination, IDLE_DESTINATION_LABEL);
        self.map.show_help(PROMPT_IDLE);
    }

    /// UI clear button: same reset, without re-announcing the idle prompts.
    pub fn clear_route(&mut self) {
        self.reset();
    }

    pub fn on_unrecognized(&mut self, message: &str) {
        tracing::warn!(target: "session", message, "unrecognized voice command");
        let error = SessionError::UnrecognizedCommand(message.to_string());
        self.surface_error(&error.to_string(), true);
    }

    fn apply_resolution(
        &mut self,
        role: Role,
        generation: u64,
        outcome: Result<PlaceSelection, ResolveError>,
    ) {
        if generation != self.endpoint_generation(role) {
            tracing::debug!(target: "session", %role, generation, "discarding stale resolution");
            return;
        }
        match outcome {
            Ok(place) => {
                self.markers.set_marker(&mut self.map, role, place.coordinate);
                let other = match role {
                    Role::Source => self.destination.as_ref(),
                    Role::Destination => self.source.as_ref(),
                }
                .map(|place| place.coordinate);
                self.markers
                    .fit_view(&mut self.map, place.bounds, place.coordinate, other);
                tracing::info!(target: "session", %role, label = %place.label, "endpoint set");
                match role {
                    Role::Source => self.source = Some(place),
                    Role::Destination => self.destination = Some(place),
                }
            }
            Err(err) => {
                tracing::warn!(target: "session", %role, error = %err, "endpoint resolution failed");
                self.surface_error(&err.to_string(), false);
            }
        }
    }

    fn apply_route(&mut self, generation: u64, outcome: Result<RouteOutcome, RouteError>) {
        if generation != self.route_generation {
            tracing::debug!(target: "session", generation, "discarding stale route");
            return;
        }
        match outcome {
            Ok(RouteOutcome::Found(route)) => {
                // Markers come off once the provider renders the route itself.
                self.markers.clear_all(&mut self.map);
                self.steps = route.steps;
                self.active = false;
                self.map.show_directions(&self.steps);
                self.map.show_help(PROMPT_ROUTE_COMPUTED);
                tracing::info!(target: "session", steps = self.steps.len(), "route computed");
            }
            Ok(RouteOutcome::NotFound) => {
                self.surface_error(ROUTE_NOT_FOUND_MESSAGE, true);
            }
            Err(err) => {
                tracing::warn!(target: "session", error = %err, "route computation failed");
                self.surface_error(&err.to_string(), false);
            }
        }
    }

    /// A new endpoint selection never inherits a previously computed route:
    /// steps are dropped, markers and panel cleared, and an in-flight
    /// computation is invalidated. Endpoint fields survive.
    fn discard_computed_route(&mut self) {
        if !self.active && self.steps.is_empty() {
            return;
        }
        self.steps.clear();
        self.active = false;
        self.markers.clear_all(&mut self.map);
        self.map.hide_directions();
        self.route_generation += 1;
    }

    fn reset(&mut self) {
        self.source = None;
        self.destination = None;
        self.steps.clear();
        self.active = false;
        self.markers.clear_all(&mut self.map);
        self.map.hide_directions();
        self.map.set_endpoint_text(Role::Source, "");
        self.map.set_endpoint_text(Role::Destination, "");
        // Invalidate anything still in flight.
        self.source_generation += 1;
        self.destination_generation += 1;
        self.route_generation += 1;
    }

    fn surface_error(&mut self, message: &str, spoken: bool) {
        self.map.show_error(message);
        if spoken {
            if let Some(voice) = &self.voice {
                voice.speak(message);
            }
        }
    }

    fn bump_endpoint(&mut self, role: Role) -> u64 {
        let slot = match role {
            Role::Source => &mut self.source_generation,
            Role::Destination => &mut self.destination_generation,
        };
        *slot += 1;
        *slot
    }

    fn endpoint_generation(&self, role: Role) -> u64 {
        match role {
            Role::Source => self.source_generation,
            Role::Destination => self.destination_generation,
        }
    }

    fn bump_route(&mut self) -> u64 {
        self.route_generation += 1;
        self.route_generation
    }
}

pub fn event_channel() -> (UnboundedSender<SessionEvent>, UnboundedReceiver<SessionEvent>) {
    mpsc::unbounded_channel()
}

/// Drive a session until every sender on its event channel is gone. The
/// session itself holds only a weak sender for its spawned service calls, so
/// the loop ends once the bridge side drops its sender. Hands the session
/// back for inspection.
pub async fn run_session<G, D, M, V>(
    mut session: RouteSession<G, D, M, V>,
    mut events: UnboundedReceiver<SessionEvent>,
) -> RouteSession<G, D, M, V>
where
    G: GeocodingBackend,
    D: DirectionsBackend,
    M: MapSurface,
    V: VoiceOutput,
{
    while let Some(event) = events.recv().await {
        session.handle_event(event);
    }
    session
}
