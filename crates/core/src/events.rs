//! Derives the time-ordered event sequence from a set of schedules.

use std::sync::Arc;

use crate::models::{EventKind, Schedule, TrainEvent};

/// Expand schedules into departure/arrival events, ordered by time of day.
///
/// Each schedule yields exactly two events. Ties are broken by generation
/// order: all departures are emitted from the schedules sorted by departure
/// time, then all arrivals from the schedules sorted by arrival time, and
/// the concatenation is stably sorted by timestamp. The tie-break carries
/// no meaning beyond determinism, but it is kept stable so runs with equal
/// timestamps spawn tasks in a reproducible order.
///
/// Pure; an empty input yields an empty sequence.
pub fn build_events(schedules: &[Arc<Schedule>]) -> Vec<TrainEvent> {
    let mut events = Vec::with_capacity(schedules.len() * 2);

    let mut by_departure: Vec<&Arc<Schedule>> = schedules.iter().collect();
    by_departure.sort_by_key(|s| s.departure);
    events.extend(by_departure.into_iter().map(|schedule| TrainEvent {
        time: schedule.departure,
        schedule: schedule.clone(),
        kind: EventKind::Departure,
    }));

    let mut by_arrival: Vec<&Arc<Schedule>> = schedules.iter().collect();
    by_arrival.sort_by_key(|s| s.arrival);
    events.extend(by_arrival.into_iter().map(|schedule| TrainEvent {
        time: schedule.arrival,
        schedule: schedule.clone(),
        kind: EventKind::Arrival,
    }));

    // Vec::sort_by_key is stable, so equal timestamps keep the order above.
    events.sort_by_key(|event| event.time);
    events
}
