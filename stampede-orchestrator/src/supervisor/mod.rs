//! Process Supervisor
//!
//! Owns one runner process from launch to exit: streams its output into
//! progress updates, classifies the exit code and extracts results.
//! The supervising task is the only writer of its job record.

pub mod invocation;
pub mod output;

use stampede_core::domain::job::{InvalidTransition, Job, JobStatus, THRESHOLD_WARNING};
use stampede_core::domain::results::ResultRecord;
use stampede_core::{extract, progress};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::registry::SharedJob;
use invocation::RunnerInvocation;
use output::{OutputBuffer, OutputEvent, spawn_reader};

/// Output gathered from the runner's streams
struct Captured {
    buffer: OutputBuffer,
    stream_error: Option<String>,
}

/// Supervises a single job's runner process
pub struct Supervisor {
    id: Uuid,
    job: SharedJob,
    invocation: RunnerInvocation,
    output_path: PathBuf,
    threshold_exit_code: i32,
    max_output_bytes: usize,
}

impl Supervisor {
    pub fn new(job: SharedJob, invocation: RunnerInvocation, config: &Config) -> Self {
        let (id, output_path) = {
            let job = job.read();
            (job.id, job.output_path.clone())
        };

        Self {
            id,
            job,
            invocation,
            output_path,
            threshold_exit_code: config.threshold_exit_code,
            max_output_bytes: config.max_output_bytes,
        }
    }

    /// Runs the job to a terminal state on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut command = self.invocation.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Job {} failed to launch '{}': {}", self.id, self.invocation.program, e);
                self.update(|job| job.fail(format!("Failed to launch runner: {e}")));
                return;
            }
        };

        self.update(|job| job.advance(JobStatus::Running));
        info!("Job {} running (pid {:?})", self.id, child.id());

        let (tx, rx) = mpsc::channel(64);
        if let Some(stdout) = child.stdout.take() {
            spawn_reader("stdout", stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader("stderr", stderr, tx.clone());
        }
        drop(tx);

        let captured = self.collect(rx).await;

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                error!("Job {} could not be reaped: {}", self.id, e);
                self.update(|job| job.fail(format!("Failed to wait for runner: {e}")));
                return;
            }
        };

        self.conclude(status, captured).await;
    }

    /// Drains reader events until every stream has closed
    async fn collect(&self, mut rx: mpsc::Receiver<OutputEvent>) -> Captured {
        let mut captured = Captured {
            buffer: OutputBuffer::new(self.max_output_bytes),
            stream_error: None,
        };

        while let Some(event) = rx.recv().await {
            match event {
                OutputEvent::Chunk(text) => {
                    debug!("Job {} output: {}", self.id, text.trim_end());
                    if let Some(percent) = progress::parse(&text) {
                        self.job.write().set_progress(percent);
                    }
                    captured.buffer.push(&text);
                }
                OutputEvent::Failed { stream, error } => {
                    warn!("Job {} lost its {} stream: {}", self.id, stream, error);
                    if captured.stream_error.is_none() {
                        captured.stream_error =
                            Some(format!("Failed to read runner {stream}: {error}"));
                    }
                }
            }
        }

        if captured.buffer.truncated() {
            debug!("Job {} output exceeded {} bytes, kept the tail", self.id, self.max_output_bytes);
        }
        captured
    }

    /// A lost stream fails the job whatever the exit code
    async fn conclude(&self, status: ExitStatus, captured: Captured) {
        if let Some(reason) = captured.stream_error {
            self.update(|job| job.fail(reason));
            return;
        }

        self.finish(status, &captured.buffer).await;
    }

    async fn finish(&self, status: ExitStatus, buffer: &OutputBuffer) {
        let warning = match status.code() {
            Some(0) => None,
            Some(code) if code == self.threshold_exit_code => Some(THRESHOLD_WARNING),
            code => {
                let code = code.map_or_else(
                    || "none (terminated by signal)".to_string(),
                    |c| c.to_string(),
                );
                warn!("Job {} failed with exit code {}", self.id, code);
                self.update(|job| {
                    job.fail(format!("Process exited with code {code}: {}", buffer.as_str()))
                });
                return;
            }
        };

        // Extract before publishing `completed` so pollers never see a
        // finished job whose results are still pending.
        let extracted = self.extract(buffer.as_str()).await;

        self.update(|job| {
            job.advance(JobStatus::Completed)?;
            job.threshold_warning = warning.map(str::to_string);
            match extracted {
                Ok(record) => job.results = Some(record),
                Err(reason) => job.error = Some(reason),
            }
            Ok(())
        });
        info!("Job {} completed", self.id);
    }

    /// Structured output file first, console summary second
    async fn extract(&self, output: &str) -> Result<ResultRecord, String> {
        let file_problem = match tokio::fs::read(&self.output_path).await {
            Ok(bytes) => match extract::parse_structured(&bytes) {
                Ok(doc) => return Ok(extract::from_structured_output(&doc)),
                Err(e) => e.to_string(),
            },
            Err(e) => format!("cannot read {}: {}", self.output_path.display(), e),
        };

        debug!("Job {} falling back to console output: {}", self.id, file_problem);

        extract::from_raw_output(output).ok_or_else(|| {
            warn!("Job {} produced no extractable results", self.id);
            format!("Result extraction failed: {file_problem}; no summary metrics in runner output")
        })
    }

    fn update(&self, change: impl FnOnce(&mut Job) -> Result<(), InvalidTransition>) {
        let mut job = self.job.write();
        if let Err(e) = change(&mut job) {
            error!("Job {}: {}", self.id, e);
        }
    }
}
