//! Simulation collaborator seam
//!
//! The engine treats simulation as one more signal source behind a
//! trait. SKIPPED means "no additional signal", never "safe"; the
//! default backend returns exactly that.

use std::future::Future;

use crate::models::SimulationOutcome;

/// Inputs for one transaction simulation
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub network_id: u64,
    pub from: String,
    pub to: String,
    pub input_hex: String,
    pub value_hex: String,
    pub gas: Option<u64>,
}

/// External simulation backend
pub trait Simulation: Send + Sync {
    fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> impl Future<Output = SimulationOutcome> + Send;
}

/// No backend configured
#[derive(Debug, Clone, Copy, Default)]
pub struct SkippedSimulation;

impl Simulation for SkippedSimulation {
    async fn simulate(&self, _request: &SimulationRequest) -> SimulationOutcome {
        SimulationOutcome::skipped()
    }
}
