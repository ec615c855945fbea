// Library exports for the binary and the integration tests

pub mod config;
pub mod console;
pub mod directions;
pub mod geo;
pub mod geocode;
pub mod map;
pub mod net;
pub mod session;
pub mod voice;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use directions::{RouteComputer, RouteOutcome, ROUTE_NOT_FOUND_MESSAGE};
pub use geo::{Bounds, Coordinate, PlaceSelection, Role};
pub use geocode::GeocodeResolver;
pub use map::{MapSurface, MarkerManager};
pub use session::{RouteSession, SessionEvent, SessionState};
pub use voice::{VoiceCommand, VoiceOutput};
