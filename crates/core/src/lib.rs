#![warn(clippy::all, missing_docs)]

//! Core logic for the rail track simulation.
//!
//! This crate hosts the entity model, the random entity generator, the
//! event builder that expands schedules into a time-ordered event
//! sequence, and the concurrent executor that simulates those events
//! under per-route track locks.

pub mod events;
pub mod generate;
pub mod models;
pub mod sim;

pub use events::build_events;
pub use generate::{GenerateError, Generator, GeneratorConfig};
pub use models::{
    EventKind, Route, RouteId, Schedule, Station, Train, TrainEvent, TrainKind,
};
pub use sim::{HoldRecord, SimReport, Simulation, TrackRegistry};
