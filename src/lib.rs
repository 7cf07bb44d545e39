//! WalletSentry Library
//!
//! Wallet-interaction request risk engine. Evaluates page-level wallet
//! requests before the user signs:
//! - Calldata and typed-data decoding into typed intents
//! - Domain trust heuristics and impersonation signals
//! - Multi-source threat and address intel with offline snapshots
//! - Mode-scaled policy verdicts with stable reason codes

pub mod api;
pub mod core;
pub mod intel;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{EngineStatsSnapshot, SentryEngine};
pub use intel::{
    AddressIntelStore, FileSnapshotStore, MemorySnapshotStore, SnapshotStore, ThreatIntelStore,
};
pub use models::{
    AnalysisResult, Mode, Recommendation, SentrySettings, VerificationLevel, WalletRequest,
};
pub use providers::{HttpFeedFetch, Simulation, SkippedSimulation};
