//! Template DTOs

use serde::{Deserialize, Serialize};

/// A single named example script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub name: String,
    pub content: String,
}
