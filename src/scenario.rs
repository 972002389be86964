//! Scenario lifecycle: acquire a session, run the steps, capture evidence on
//! failure, and always dispose of the session.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::context::SyncContext;
use crate::errors::StorecheckError;
use crate::session::Session;
use crate::steps::{Step, Steps};

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

/// What happened to one scenario run
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub status: Status,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    /// Steps that completed successfully
    pub steps_passed: usize,
    pub failure: Option<String>,
    pub screenshot: Option<PathBuf>,
}

/// File name for a failure screenshot: unsafe characters become `_`
pub fn screenshot_file_name(scenario: &str) -> String {
    let safe: String = scenario
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_failure.png", safe)
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Scenario {
            name: name.into(),
            tags: Vec::new(),
            steps,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Run the scenario on a session obtained from `acquire`.
    ///
    /// Failing to acquire a session is fatal and reported as
    /// [`StorecheckError::SessionUnavailable`]. A failing step stops the run;
    /// its error is returned alongside the report once the session is closed.
    pub async fn run<S, F, Fut>(
        &self,
        config: &Config,
        acquire: F,
    ) -> Result<(ScenarioReport, Option<StorecheckError>), StorecheckError>
    where
        S: Session,
        F: FnOnce(Config) -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(
            "Starting scenario: {} | tags: [{}]",
            self.name,
            self.tags.join(", ")
        );

        let session = acquire(config.clone())
            .await
            .map_err(|e| match StorecheckError::from(e) {
                unavailable @ StorecheckError::SessionUnavailable(_) => unavailable,
                other => StorecheckError::SessionUnavailable(format!("{:#}", other)),
            })?;
        let ctx = SyncContext::new(session, config);

        let (steps_passed, failure) = self.run_steps(&ctx, config).await;

        let screenshot = match &failure {
            Some(_) => match capture(&ctx, &config.reports_dir, &self.name).await {
                Ok(path) => {
                    info!("Saved failure screenshot to {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    warn!("Could not capture failure screenshot: {:#}", e);
                    None
                }
            },
            None => None,
        };

        if let Err(e) = ctx.into_session().close().await {
            warn!("Failed to close browser session: {}", e);
        }

        let status = if failure.is_some() {
            Status::Failed
        } else {
            Status::Passed
        };
        let report = ScenarioReport {
            name: self.name.clone(),
            status,
            started_at,
            duration_ms: start.elapsed().as_millis(),
            steps_passed,
            failure: failure.as_ref().map(|e| e.to_string()),
            screenshot,
        };
        match &failure {
            Some(e) => error!("Scenario '{}' FAILED: {}", self.name, e),
            None => info!("Scenario '{}' PASSED", self.name),
        }
        Ok((report, failure))
    }

    async fn run_steps<S: Session>(
        &self,
        ctx: &SyncContext<S>,
        config: &Config,
    ) -> (usize, Option<StorecheckError>) {
        let mut steps = Steps::new(ctx, config);
        for (index, step) in self.steps.iter().enumerate() {
            if let Err(e) = steps.run(step).await {
                warn!("Step {} failed: {}", index + 1, step);
                return (index, Some(StorecheckError::from(e)));
            }
        }
        (self.steps.len(), None)
    }
}

async fn capture<S: Session>(
    ctx: &SyncContext<S>,
    dir: &Path,
    scenario: &str,
) -> Result<PathBuf> {
    let png = ctx.screenshot().await?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create reports directory {}", dir.display()))?;
    let path = dir.join(screenshot_file_name(scenario));
    fs::write(&path, png)
        .with_context(|| format!("Failed to write screenshot to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "scenario_test.rs"]
mod scenario_test;
