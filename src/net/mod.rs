mod directions_client;
mod geocode_client;

pub use directions_client::HttpDirections;
pub use geocode_client::HttpGeocoder;
