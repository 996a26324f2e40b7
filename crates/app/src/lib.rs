//! Command line host wiring for vigil.

pub mod config;
pub mod desktop;
pub mod runtime;
