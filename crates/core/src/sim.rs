//! Concurrent event execution with per-route track locks.
//!
//! Every event becomes an independent tokio task. A departure holds its
//! route's lock for the scaled travel time, modelling the train occupying
//! the track; an arrival takes the same lock only long enough to record
//! itself. Tasks touching different routes run fully concurrently; tasks
//! on the same route serialize through the lock. Each task acquires at
//! most one lock, so no deadlock is possible.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration, Instant};
use tracing::{info, warn};

use crate::models::{EventKind, Route, RouteId, TrainEvent};

/// Simulation-scoped arena of track locks, one per route.
///
/// Keeping the lock out of [`Route`] keeps the entities plain values; the
/// registry is the single owner of all mutable simulation state.
pub struct TrackRegistry {
    tracks: HashMap<RouteId, Arc<Mutex<()>>>,
}

impl TrackRegistry {
    /// Build one lock per route. Duplicate ids share a single lock.
    pub fn for_routes<'a, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Route>>,
    {
        let tracks = routes
            .into_iter()
            .map(|route| (route.id, Arc::new(Mutex::new(()))))
            .collect();
        Self { tracks }
    }

    /// The lock guarding `id`'s track, if the route is registered.
    pub fn track(&self, id: RouteId) -> Option<Arc<Mutex<()>>> {
        self.tracks.get(&id).cloned()
    }

    /// Number of registered tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the registry holds no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// One lock-held interval observed during a run.
#[derive(Debug, Clone)]
pub struct HoldRecord {
    /// Route whose track was held.
    pub route: RouteId,
    /// Train that held it.
    pub train: String,
    /// Departure (travel-long hold) or arrival (instantaneous hold).
    pub kind: EventKind,
    /// When the lock was granted.
    pub start: Instant,
    /// When the lock was released.
    pub end: Instant,
}

/// Trace of a completed run, in lock-grant order per route.
#[derive(Debug, Default)]
pub struct SimReport {
    /// Every lock-held interval, one per executed event.
    pub holds: Vec<HoldRecord>,
}

impl SimReport {
    /// First pair of hold intervals on the same route that overlap in
    /// time, if any. A correct run returns `None`.
    pub fn overlapping_holds(&self) -> Option<(&HoldRecord, &HoldRecord)> {
        for (i, a) in self.holds.iter().enumerate() {
            for b in &self.holds[i + 1..] {
                if a.route == b.route && a.start < b.end && b.start < a.end {
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// Hold intervals for a single route.
    pub fn holds_for(&self, route: RouteId) -> impl Iterator<Item = &HoldRecord> {
        self.holds.iter().filter(move |h| h.route == route)
    }
}

/// Runs an event sequence to completion.
pub struct Simulation {
    secs_per_hour: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        // One wall-clock second per simulated travel hour.
        Self { secs_per_hour: 1.0 }
    }
}

impl Simulation {
    /// A simulation with the default time scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how long one simulated hour of travel takes on the clock.
    pub fn with_time_scale(secs_per_hour: f64) -> Self {
        Self { secs_per_hour }
    }

    /// Wall-clock delay a departure holds its track for.
    fn travel_delay(&self, event: &TrainEvent) -> Duration {
        let route = &event.schedule.route;
        let hours = f64::from(route.distance_km) / f64::from(event.schedule.train.speed_kmh);
        Duration::from_secs_f64(hours * self.secs_per_hour)
    }

    /// Spawn one task per event and wait for all of them to finish.
    ///
    /// Events should already be time-ordered (see
    /// [`crate::events::build_events`]); beyond that spawn order, the only
    /// sequencing is the track lock itself. Events whose route is missing
    /// from the registry are logged and skipped.
    pub async fn run(&self, events: Vec<TrainEvent>, tracks: &TrackRegistry) -> SimReport {
        let trace: Arc<parking_lot::Mutex<Vec<HoldRecord>>> =
            Arc::new(parking_lot::Mutex::new(Vec::with_capacity(events.len())));
        let mut tasks = JoinSet::new();

        for event in events {
            let Some(track) = tracks.track(event.schedule.route.id) else {
                warn!(
                    "no track registered for {}; skipping {:?} of {}",
                    event.schedule.route.id, event.kind, event.schedule.train.id
                );
                continue;
            };
            let trace = trace.clone();
            let travel = self.travel_delay(&event);
            tasks.spawn(async move {
                let schedule = &event.schedule;
                let route = &schedule.route;
                match event.kind {
                    EventKind::Departure => {
                        info!(
                            "{} waiting to use track from {} to {}",
                            schedule.train.id, route.start, route.end
                        );
                        let _guard = track.lock().await;
                        let start = Instant::now();
                        info!(
                            "{} departing from {} at {}",
                            schedule.train.id, route.start, schedule.departure
                        );
                        sleep(travel).await;
                        trace.lock().push(HoldRecord {
                            route: route.id,
                            train: schedule.train.id.clone(),
                            kind: event.kind,
                            start,
                            end: Instant::now(),
                        });
                    }
                    EventKind::Arrival => {
                        let _guard = track.lock().await;
                        let start = Instant::now();
                        info!(
                            "{} arriving at {} at {}",
                            schedule.train.id, route.end, schedule.arrival
                        );
                        trace.lock().push(HoldRecord {
                            route: route.id,
                            train: schedule.train.id.clone(),
                            kind: event.kind,
                            start,
                            end: Instant::now(),
                        });
                    }
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                warn!("event task failed: {err}");
            }
        }

        let holds = std::mem::take(&mut *trace.lock());
        SimReport { holds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::build_events;
    use crate::models::{Route, Schedule, Station, Train, TrainKind};
    use chrono::NaiveTime;

    fn route(id: u32, distance_km: u32) -> Arc<Route> {
        Arc::new(Route::new(
            RouteId(id),
            Station::new("Leiden"),
            Station::new("Arnhem"),
            distance_km,
        ))
    }

    fn schedule(train_id: &str, route: Arc<Route>, speed_kmh: u32, dep: (u32, u32)) -> Arc<Schedule> {
        let train = Train {
            id: train_id.to_string(),
            kind: TrainKind::Passenger,
            speed_kmh,
            capacity: 300,
        };
        let departure = NaiveTime::from_hms_opt(dep.0, dep.1, 0).unwrap();
        Arc::new(Schedule::new(train, route, departure))
    }

    #[tokio::test]
    async fn empty_event_list_completes_immediately() {
        let no_routes: Vec<Arc<Route>> = Vec::new();
        let registry = TrackRegistry::for_routes(&no_routes);
        assert!(registry.is_empty());
        let report = Simulation::new().run(Vec::new(), &registry).await;
        assert!(report.holds.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_event_reaches_completion() {
        let shared = route(0, 100);
        let other = route(1, 200);
        let schedules = vec![
            schedule("T-1001", shared.clone(), 100, (8, 0)),
            schedule("T-1002", shared.clone(), 100, (8, 30)),
            schedule("T-1003", other.clone(), 100, (9, 0)),
        ];
        let events = build_events(&schedules);
        let registry = TrackRegistry::for_routes([&shared, &other]);

        let report = Simulation::new().run(events, &registry).await;
        // One hold per event: liveness plus the completion barrier.
        assert_eq!(report.holds.len(), schedules.len() * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn holds_on_one_route_never_overlap() {
        let shared = route(0, 150);
        let schedules: Vec<_> = (0..4)
            .map(|i| schedule(&format!("T-{}", 2000 + i), shared.clone(), 75, (7 + i, 0)))
            .collect();
        let events = build_events(&schedules);
        let registry = TrackRegistry::for_routes([&shared]);

        let report = Simulation::new().run(events, &registry).await;
        assert_eq!(report.holds.len(), 8);
        assert!(
            report.overlapping_holds().is_none(),
            "track lock admitted two holders at once"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_routes_run_concurrently() {
        let a = route(0, 100);
        let b = route(1, 100);
        let schedules = vec![
            schedule("T-3001", a.clone(), 100, (8, 0)),
            schedule("T-3002", b.clone(), 100, (8, 0)),
        ];
        let events = build_events(&schedules);
        let registry = TrackRegistry::for_routes([&a, &b]);

        let report = Simulation::new().run(events, &registry).await;
        let hold_a = report
            .holds_for(RouteId(0))
            .find(|h| h.kind == EventKind::Departure)
            .unwrap();
        let hold_b = report
            .holds_for(RouteId(1))
            .find(|h| h.kind == EventKind::Departure)
            .unwrap();
        // With the clock paused both departures take the track at the same
        // instant; nothing serializes across routes.
        assert!(hold_a.start < hold_b.end && hold_b.start < hold_a.end);
    }

    #[tokio::test(start_paused = true)]
    async fn departure_holds_track_for_scaled_travel_time() {
        let r = route(0, 100);
        let schedules = vec![schedule("T-4001", r.clone(), 100, (8, 0))];
        assert_eq!(
            schedules[0].arrival,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        let events = build_events(&schedules);
        let registry = TrackRegistry::for_routes([&r]);

        // 100 km at 100 km/h is one simulated hour; scale to 2s wall clock.
        let report = Simulation::with_time_scale(2.0).run(events, &registry).await;
        let departure = report
            .holds_for(RouteId(0))
            .find(|h| h.kind == EventKind::Departure)
            .unwrap();
        assert_eq!(departure.end - departure.start, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unregistered_route_is_skipped() {
        let r = route(0, 100);
        let schedules = vec![schedule("T-5001", r.clone(), 100, (8, 0))];
        let events = build_events(&schedules);
        let no_routes: Vec<Arc<Route>> = Vec::new();
        let registry = TrackRegistry::for_routes(&no_routes);

        let report = Simulation::with_time_scale(0.0).run(events, &registry).await;
        assert!(report.holds.is_empty());
    }
}
