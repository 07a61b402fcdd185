//! Domain types shared across all Rastro services.
//!
//! This crate contains only pure types and pure functions with no framework
//! dependencies. Import in `usecase/` and `domain/` layers; never in `infra/`
//! or `handlers/`.

pub mod attribution;
pub mod event_id;
pub mod normalize;
pub mod pagination;
