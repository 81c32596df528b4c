//! Template command handlers

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::config::Config;

/// List the available starter scripts
pub async fn list(config: &Config) -> Result<()> {
    let templates = config.client().list_templates().await?;

    if templates.is_empty() {
        println!("{}", "No templates found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} template(s):", templates.len()).bold());
    println!();
    for (name, content) in &templates {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            name,
            format!("({} lines)", content.lines().count()).dimmed()
        );
    }

    Ok(())
}

/// Print one template, or save it to `output`
pub async fn show(config: &Config, name: &str, output: Option<&Path>) -> Result<()> {
    let template = config.client().get_template(name).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &template.content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Saved {} to {}",
                "✓".green(),
                template.name.cyan(),
                path.display()
            );
        }
        None => print!("{}", template.content),
    }

    Ok(())
}
