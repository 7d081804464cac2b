//! Random generation of stations, routes, trains, and schedules.
//!
//! The simulation core treats these as an external data source: any
//! structurally valid entity works. All functions are generic over
//! [`rand::Rng`] so tests can drive them with a seeded [`SmallRng`].
//!
//! [`SmallRng`]: rand::rngs::SmallRng

use std::ops::Range;
use std::sync::Arc;

use chrono::NaiveTime;
use rand::prelude::IndexedRandom;
use rand::Rng;
use thiserror::Error;

use crate::models::{Route, RouteId, Schedule, Station, Train, TrainKind};

/// Dutch main-line stations used as the default name pool.
const STATION_NAMES: &[&str] = &[
    "Amsterdam",
    "Rotterdam",
    "Utrecht",
    "Eindhoven",
    "Groningen",
    "Maastricht",
    "Den Haag",
    "Leiden",
    "Delft",
    "Arnhem",
    "Nijmegen",
    "Enschede",
    "Zwolle",
    "Breda",
    "Tilburg",
    "Almere",
    "Haarlem",
    "Leeuwarden",
    "Middelburg",
    "Lelystad",
];

/// Invalid generation bounds. The only error the library models; every
/// value produced from a valid config is valid by construction.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The station pool cannot yield two distinct endpoints.
    #[error("station pool needs at least two distinct names, got {0}")]
    TooFewStations(usize),
    /// A numeric range contains no values.
    #[error("{name} range {start}..{end} is empty")]
    EmptyRange {
        /// Which config field the range came from.
        name: &'static str,
        /// Inclusive lower bound.
        start: u32,
        /// Exclusive upper bound.
        end: u32,
    },
    /// A range that must stay positive starts at zero.
    #[error("{name} range must start above zero")]
    ZeroBound {
        /// Which config field the range came from.
        name: &'static str,
    },
}

/// Bounds for generated values. The defaults match the classic toy
/// parameters: long freight corridors, main-line speeds.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Pool of station names to draw from.
    pub station_names: Vec<String>,
    /// Route length in kilometres.
    pub distance_km: Range<u32>,
    /// Train speed in km/h.
    pub speed_kmh: Range<u32>,
    /// Seats on a passenger train.
    pub passenger_capacity: Range<u32>,
    /// Tons on a freight train.
    pub freight_capacity: Range<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            station_names: STATION_NAMES.iter().map(|s| s.to_string()).collect(),
            distance_km: 50..10_000,
            speed_kmh: 80..200,
            passenger_capacity: 100..500,
            freight_capacity: 500..2_000,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), GenerateError> {
        let mut distinct: Vec<&str> = self.station_names.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(GenerateError::TooFewStations(distinct.len()));
        }
        for (name, range) in [
            ("distance_km", &self.distance_km),
            ("speed_kmh", &self.speed_kmh),
            ("passenger_capacity", &self.passenger_capacity),
            ("freight_capacity", &self.freight_capacity),
        ] {
            if range.is_empty() {
                return Err(GenerateError::EmptyRange {
                    name,
                    start: range.start,
                    end: range.end,
                });
            }
            if range.start == 0 {
                return Err(GenerateError::ZeroBound { name });
            }
        }
        Ok(())
    }
}

/// Produces random entities within validated bounds.
pub struct Generator {
    config: GeneratorConfig,
    next_route_id: std::sync::atomic::AtomicU32,
}

impl Generator {
    /// Validate the config and build a generator.
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        config.validate()?;
        Ok(Self {
            config,
            next_route_id: std::sync::atomic::AtomicU32::new(0),
        })
    }

    /// Uniform pick from the station name pool.
    pub fn station<R: Rng + ?Sized>(&self, rng: &mut R) -> Station {
        let name = self
            .config
            .station_names
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default();
        Station::new(name)
    }

    /// A route between two distinct stations with a fresh id.
    pub fn route<R: Rng + ?Sized>(&self, rng: &mut R) -> Route {
        let start = self.station(rng);
        // Validation guarantees a second distinct name exists, so this
        // retry loop terminates.
        let mut end = self.station(rng);
        while end == start {
            end = self.station(rng);
        }
        let distance = rng.random_range(self.config.distance_km.clone());
        let id = RouteId(
            self.next_route_id
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed),
        );
        Route::new(id, start, end, distance)
    }

    /// A train with a random kind; the capacity range depends on the kind.
    pub fn train<R: Rng + ?Sized>(&self, rng: &mut R) -> Train {
        let kind = if rng.random_bool(0.5) {
            TrainKind::Passenger
        } else {
            TrainKind::Freight
        };
        let capacity_range = match kind {
            TrainKind::Passenger => self.config.passenger_capacity.clone(),
            TrainKind::Freight => self.config.freight_capacity.clone(),
        };
        Train {
            id: format!("T-{}", rng.random_range(1000..10_000)),
            kind,
            speed_kmh: rng.random_range(self.config.speed_kmh.clone()),
            capacity: rng.random_range(capacity_range),
        }
    }

    /// A schedule pairing `train` with `route` at a random departure time.
    /// The arrival is computed by [`Schedule::new`], never drawn.
    pub fn schedule<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        train: Train,
        route: Arc<Route>,
    ) -> Schedule {
        let departure = NaiveTime::from_hms_opt(
            rng.random_range(0..24),
            rng.random_range(0..60),
            0,
        )
        .unwrap_or(NaiveTime::MIN);
        Schedule::new(train, route, departure)
    }

    /// A full cast for one simulation run: `n_routes` shared routes and
    /// `n_schedules` schedules, each assigning a fresh train to a random
    /// existing route. Route sharing is the whole point; contention on the
    /// track locks only appears when schedules collide on a route.
    pub fn fleet<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n_routes: usize,
        n_schedules: usize,
    ) -> (Vec<Arc<Route>>, Vec<Arc<Schedule>>) {
        let routes: Vec<Arc<Route>> = (0..n_routes).map(|_| Arc::new(self.route(rng))).collect();
        let schedules = (0..n_schedules)
            .filter_map(|_| {
                let route = routes.choose(rng)?.clone();
                let train = self.train(rng);
                Some(Arc::new(self.schedule(rng, train, route)))
            })
            .collect();
        (routes, schedules)
    }
}
