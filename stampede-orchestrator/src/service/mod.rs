//! Service Module
//!
//! Business logic behind the HTTP handlers.

pub mod job;
pub mod template;

pub use job as job_service;
pub use template as template_service;
