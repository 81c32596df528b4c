//! Job command handlers
//!
//! Submitting scripts, showing job status and following a run to the end.

use anyhow::{Context, Result};
use colored::*;
use stampede_core::domain::results::{MetricStats, Provenance};
use stampede_core::dto::job::{JobStatusResponse, StatusView, SubmitJob};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;

/// Parse a single KEY=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    if pos == 0 {
        anyhow::bail!("invalid KEY=value: empty key in `{}`", s);
    }
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Submit a script file, optionally following it to completion
pub async fn submit(
    config: &Config,
    script_path: &Path,
    env: Vec<(String, String)>,
    watch_after: bool,
) -> Result<()> {
    let script = tokio::fs::read_to_string(script_path)
        .await
        .with_context(|| format!("Failed to read script: {}", script_path.display()))?;

    let client = config.client();
    let submitted = client
        .submit_job(SubmitJob {
            script,
            env: env.into_iter().collect(),
        })
        .await
        .context("Failed to submit job")?;

    println!("{}", "✓ Job submitted".green().bold());
    println!("  ID: {}", submitted.job_id.to_string().cyan());

    if watch_after {
        println!();
        watch(config, &submitted.job_id.to_string(), config.poll_interval).await?;
    } else {
        println!(
            "\n  Follow it with: {}",
            format!("stampede watch {}", submitted.job_id).dimmed()
        );
    }

    Ok(())
}

/// Show a single status snapshot
pub async fn status(config: &Config, id: &str) -> Result<()> {
    let snapshot = config.client().get_status(id).await?;

    if snapshot.status == StatusView::NotFound {
        anyhow::bail!("Job {} not found", id);
    }

    print_status_details(&snapshot);
    Ok(())
}

/// Poll until the job reaches a terminal state
pub async fn watch(config: &Config, id: &str, interval: Duration) -> Result<()> {
    let mut last_line = String::new();

    let done = config
        .client()
        .wait_for_job(id, interval, |snapshot| {
            let line = progress_line(snapshot);
            if line != last_line {
                println!("{}", line);
                last_line = line;
            }
        })
        .await?;

    println!();
    print_status_details(&done);

    if done.status == StatusView::Failed {
        anyhow::bail!("Job {} failed", id);
    }
    Ok(())
}

fn progress_line(snapshot: &JobStatusResponse) -> String {
    match snapshot.progress {
        Some(percent) => format!("  {} {:>5.1}%", colorize_status(snapshot.status), percent),
        None => format!("  {}", colorize_status(snapshot.status)),
    }
}

/// Print detailed job information
fn print_status_details(job: &JobStatusResponse) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.job_id.cyan());
    println!("  Status:    {}", colorize_status(job.status));

    if let Some(progress) = job.progress {
        println!("  Progress:  {:.1}%", progress);
    }

    if let Some(started) = job.start_time {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));

        if let Some(ended) = job.end_time {
            println!("  Ended:     {}", ended.format("%Y-%m-%d %H:%M:%S"));
            let seconds = ended.signed_duration_since(started).num_seconds();
            println!("  Duration:  {}s", seconds);
        }
    }

    if let Some(warning) = &job.threshold_warning {
        println!("\n{} {}", "⚠".yellow(), warning.yellow());
    }

    if let Some(metrics) = &job.metrics {
        println!("\n{}", "Metrics:".bold());
        for (name, stats) in metrics {
            println!("  {:<20} {}", name.cyan(), format_stats(stats));
        }
    }

    if let Some(series) = &job.time_series {
        let names: Vec<&str> = series.names().collect();
        println!(
            "\n  Time series: {} point(s) for {}",
            series.len(),
            names.join(", ")
        );
        if job.provenance == Some(Provenance::Synthetic) {
            println!(
                "  {}",
                "Simulated from summary averages; not measured data points.".dimmed()
            );
        }
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// `avg=12.50 min=3.00 ...` for the statistics that are present
fn format_stats(stats: &MetricStats) -> String {
    [
        ("avg", stats.avg),
        ("min", stats.min),
        ("med", stats.med),
        ("max", stats.max),
        ("p90", stats.p90),
        ("p95", stats.p95),
        ("p99", stats.p99),
        ("count", stats.count),
        ("rate", stats.rate),
        ("succeeded", stats.succeeded),
        ("total", stats.total),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| format!("{key}={v:.2}")))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Colorize job status for display
fn colorize_status(status: StatusView) -> ColoredString {
    let status_str = status.to_string();
    match status {
        StatusView::Submitted => status_str.yellow(),
        StatusView::Running => status_str.cyan(),
        StatusView::Completed => status_str.green(),
        StatusView::Failed => status_str.red(),
        StatusView::NotFound => status_str.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("VUS=10").unwrap(),
            ("VUS".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_key_val("URL=http://a/?x=1").unwrap(),
            ("URL".to_string(), "http://a/?x=1".to_string())
        );
        assert_eq!(parse_key_val("EMPTY=").unwrap().1, "");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=oops").is_err());
    }

    #[test]
    fn test_format_stats_skips_absent_values() {
        let stats = MetricStats {
            avg: Some(12.5),
            count: Some(50.0),
            ..Default::default()
        };
        assert_eq!(format_stats(&stats), "avg=12.50 count=50.00");
        assert_eq!(format_stats(&MetricStats::default()), "");
    }

    #[test]
    fn test_progress_line() {
        colored::control::set_override(false);
        let mut snapshot = JobStatusResponse::not_found("id");
        snapshot.status = StatusView::Running;
        assert_eq!(progress_line(&snapshot), "  running");

        snapshot.progress = Some(42.0);
        assert_eq!(progress_line(&snapshot), "  running  42.0%");
    }
}
