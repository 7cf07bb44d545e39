//! Providers Module - External Collaborators
//!
//! Network edges live here: the feed transport and the simulation
//! backend. Everything behind these seams is swappable in tests.

pub mod fetch;
pub mod simulation;

pub use fetch::HttpFeedFetch;
pub use simulation::{Simulation, SimulationRequest, SkippedSimulation};
