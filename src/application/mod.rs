//! Application services layer.

pub mod cms;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod normalize;
pub mod provisioning;
pub mod setup;
pub mod site;
