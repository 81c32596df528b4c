//! Template Service
//!
//! Starter scripts offered to the dashboard. A `<scripts_dir>/<name>.js`
//! file replaces the built-in text of the same name.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Built-in templates, by name
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("load-test", include_str!("../../templates/load-test.js")),
    ("stress-test", include_str!("../../templates/stress-test.js")),
    ("spike-test", include_str!("../../templates/spike-test.js")),
    ("soak-test", include_str!("../../templates/soak-test.js")),
    ("circuit-breaker", include_str!("../../templates/circuit-breaker.js")),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template {0} not found")]
    NotFound(String),
}

/// Text of one template, preferring an override file
pub async fn get_template(scripts_dir: &Path, name: &str) -> Result<String, TemplateError> {
    // Only built-in names are looked up on disk, so `name` never escapes scripts_dir.
    let builtin = BUILTIN_TEMPLATES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, content)| *content)
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

    let path = scripts_dir.join(format!("{name}.js"));
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            tracing::debug!("Template {} served from {}", name, path.display());
            Ok(content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(builtin.to_string()),
        Err(e) => {
            tracing::warn!("Error reading template override {}: {}", path.display(), e);
            Ok(builtin.to_string())
        }
    }
}

/// Every template, keyed by name
pub async fn list_templates(scripts_dir: &Path) -> BTreeMap<String, String> {
    let mut templates = BTreeMap::new();
    for (name, content) in BUILTIN_TEMPLATES {
        let text = get_template(scripts_dir, name)
            .await
            .unwrap_or_else(|_| content.to_string());
        templates.insert(name.to_string(), text);
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_templates_listed() {
        let dir = tempfile::tempdir().unwrap();
        let templates = list_templates(dir.path()).await;

        assert_eq!(templates.len(), 5);
        for name in ["load-test", "stress-test", "spike-test", "soak-test", "circuit-breaker"] {
            assert!(templates[name].contains("import http from 'k6/http'"));
        }
    }

    #[tokio::test]
    async fn test_override_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("spike-test.js"), "// custom spike").unwrap();

        let spike = get_template(dir.path(), "spike-test").await.unwrap();
        assert_eq!(spike, "// custom spike");

        let load = get_template(dir.path(), "load-test").await.unwrap();
        assert!(load.contains("RAMPUP"));
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.js"), "nope").unwrap();

        let err = get_template(dir.path(), "secret").await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "secret"));
        assert!(get_template(dir.path(), "../etc/passwd").await.is_err());
    }
}
