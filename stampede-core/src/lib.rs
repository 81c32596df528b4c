//! Stampede Core
//!
//! Core types and parsing for the Stampede load-test orchestrator.
//!
//! This crate contains:
//! - Domain types: Job lifecycle and normalized result records
//! - DTOs: Request and response bodies for the HTTP API
//! - Progress parsing for live runner output
//! - Result extraction from structured output files and console summaries

pub mod domain;
pub mod dto;
pub mod extract;
pub mod progress;
