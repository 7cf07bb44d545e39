//! Utils Module - Helper Functions & Shared Utilities
//!
//! Shared constants and conversion helpers used across the engine.
//! Single Source of Truth for anything two modules both need.

pub mod constants;
pub mod numeric;

pub use constants::*;
pub use numeric::*;
