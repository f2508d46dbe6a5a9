//! Shared types for the timed metadata gateway and console: wire records,
//! channel listings, payload normalization and configuration.

pub mod config;
pub mod payload;
pub mod platform;
pub mod protocol;
