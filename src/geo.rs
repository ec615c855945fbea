/// A point on the map in floating-point degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A rectangular viewport extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub southwest: Coordinate,
    pub northeast: Coordinate,
}

impl Bounds {
    pub fn new(southwest: Coordinate, northeast: Coordinate) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    /// Grow the extent so it contains `point`.
    pub fn extend(&mut self, point: Coordinate) {
        if point.lat < self.southwest.lat {
            self.southwest.lat = point.lat;
        }
        if point.lat > self.northeast.lat {
            self.northeast.lat = point.lat;
        }
        if point.lng < self.southwest.lng {
            self.southwest.lng = point.lng;
        }
        if point.lng > self.northeast.lng {
            self.northeast.lng = point.lng;
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.southwest.lat
            && point.lat <= self.northeast.lat
            && point.lng >= self.southwest.lng
            && point.lng <= self.northeast.lng
    }
}

/// Endpoint slot of a route. Also selects the marker icon style: "A" for the
/// source, "B" for the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Destination,
}

impl Role {
    pub fn icon_letter(&self) -> char {
        match self {
            Role::Source => 'A',
            Role::Destination => 'B',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Destination => "destination",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved place: what geocoding (or an autocomplete pick) hands back.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceSelection {
    pub label: String,
    pub coordinate: Coordinate,
    pub bounds: Option<Bounds>,
}
