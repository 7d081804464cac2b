//! Domain entities for the rail simulation.
//!
//! Everything here is an immutable value; the only mutable state in the
//! whole system is the per-route track lock, which lives in
//! [`crate::sim::TrackRegistry`] rather than inside [`Route`] itself.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// A named station. No uniqueness is enforced; two stations compare
/// equal exactly when their names match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    /// Display name, e.g. `Utrecht`.
    pub name: String,
}

impl Station {
    /// Build a station from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity of a route, used to key the track-lock registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub u32);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{:04}", self.0)
    }
}

/// A track segment between two distinct stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Registry key; one track lock exists per id.
    pub id: RouteId,
    /// Origin station.
    pub start: Station,
    /// Destination station, never equal to `start`.
    pub end: Station,
    /// Length of the segment in kilometres, always positive.
    pub distance_km: u32,
}

impl Route {
    /// Build a route. Callers (the generator) guarantee distinct endpoints
    /// and a positive distance; both are debug-asserted here.
    pub fn new(id: RouteId, start: Station, end: Station, distance_km: u32) -> Self {
        debug_assert_ne!(start, end, "route endpoints must differ");
        debug_assert!(distance_km > 0, "route distance must be positive");
        Self {
            id,
            start,
            end,
            distance_km,
        }
    }
}

/// What a train carries; decides the unit of [`Train::capacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainKind {
    /// Capacity counts passengers.
    Passenger,
    /// Capacity counts tons of cargo.
    Freight,
}

impl fmt::Display for TrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainKind::Passenger => f.write_str("passenger"),
            TrainKind::Freight => f.write_str("freight"),
        }
    }
}

/// A train with fixed speed and capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    /// Identifier, e.g. `T-4821`.
    pub id: String,
    /// Passenger or freight.
    pub kind: TrainKind,
    /// Cruising speed in km/h, always positive.
    pub speed_kmh: u32,
    /// Passengers or tons depending on `kind`.
    pub capacity: u32,
}

/// A train assigned to a route with concrete times of day.
///
/// The arrival is never stored independently of the inputs: it is always
/// `departure + travel_minutes(route.distance_km, train.speed_kmh)`,
/// wrapping past midnight.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// The assigned train.
    pub train: Train,
    /// The route travelled; shared, since many schedules may reuse one route.
    pub route: Arc<Route>,
    /// Time of day the train leaves `route.start`.
    pub departure: NaiveTime,
    /// Computed time of day the train reaches `route.end`.
    pub arrival: NaiveTime,
}

impl Schedule {
    /// Pair a train with a route, deriving the arrival from the departure.
    pub fn new(train: Train, route: Arc<Route>, departure: NaiveTime) -> Self {
        let minutes = travel_minutes(route.distance_km, train.speed_kmh);
        let arrival = departure + Duration::minutes(i64::from(minutes));
        Self {
            train,
            route,
            departure,
            arrival,
        }
    }
}

/// Discriminates the two events a schedule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The train leaves the start station and occupies the track.
    Departure,
    /// The train reaches the end station.
    Arrival,
}

/// A timestamped departure or arrival derived from a schedule.
#[derive(Debug, Clone)]
pub struct TrainEvent {
    /// Time of day the event occurs.
    pub time: NaiveTime,
    /// The schedule that produced this event.
    pub schedule: Arc<Schedule>,
    /// Departure or arrival.
    pub kind: EventKind,
}

/// Whole minutes needed to cover `distance_km` at `speed_kmh`, truncated.
pub fn travel_minutes(distance_km: u32, speed_kmh: u32) -> u32 {
    (u64::from(distance_km) * 60 / u64::from(speed_kmh)) as u32
}
