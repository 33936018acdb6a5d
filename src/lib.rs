//! Personal bio and portfolio site served from a headless CMS.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
