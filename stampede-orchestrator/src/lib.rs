//! Stampede Orchestrator
//!
//! Accepts load-test scripts over HTTP, runs each one through the external
//! runner and serves progress and extracted results to pollers.

pub mod api;
pub mod config;
pub mod registry;
pub mod service;
pub mod state;
pub mod supervisor;
