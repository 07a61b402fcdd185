//! Test utilities for Rastro services.
//!
//! Provides the recording mock Conversions API server and the contract
//! fixture loader. Import in `#[cfg(test)]` blocks and the contract harness
//! only — never in production code.

pub mod capi;
pub mod fixture;
