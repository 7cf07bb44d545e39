//! Core Module - Decoding, Heuristics & Policy
//!
//! The deterministic heart of the engine: calldata and typed-data
//! decoding, domain trust heuristics, the policy layer, and the
//! orchestrating analysis engine.

pub mod decoder;
pub mod domain_trust;
pub mod engine;
pub mod policy;
pub mod typed_data;

pub use engine::{EngineStats, EngineStatsSnapshot, SentryEngine};
pub use policy::{PolicyInput, PolicyOutcome};
