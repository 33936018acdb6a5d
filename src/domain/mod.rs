//! Domain layer types and invariants.

pub mod assets;
pub mod content_types;
pub mod entries;
pub mod error;
pub mod samples;
pub mod setup;
