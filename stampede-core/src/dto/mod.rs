//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the orchestrator and its
//! clients (the dashboard, the CLI). Field names are camelCase on the wire.

pub mod job;
pub mod template;
