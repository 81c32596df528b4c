//! Template-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use stampede_core::dto::template::TemplateResponse;
use std::collections::BTreeMap;

impl OrchestratorClient {
    /// All starter scripts, keyed by name
    pub async fn list_templates(&self) -> Result<BTreeMap<String, String>> {
        let url = format!("{}/api/k6-test/templates", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// One starter script by name
    pub async fn get_template(&self, name: &str) -> Result<TemplateResponse> {
        let url = format!("{}/api/k6-test/templates/{}", self.base_url, name);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
