//! Core domain types
//!
//! This module contains the structures shared between the orchestrator
//! (which owns and mutates jobs) and its clients (which read snapshots).

pub mod job;
pub mod results;
