//! Script and sequence runners.
//!
//! A runner opens the one browser session of a run, drives the executor over
//! every step in order, aggregates the results into a [`RunReport`], and
//! tears the session down unconditionally. Only a session-open failure
//! escapes as an error; everything step-local lands in the report.

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::browser::{BrowserSession, SessionError, SessionManager};
use crate::capability::CapabilityFlag;
use crate::config;
use crate::executor::{StepExecutor, StepResult};
use crate::script::{flatten, Script};

/// Resolved parameters for one run.
///
/// The engine performs no settings I/O itself; the caller resolves these
/// from its own configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Browser family name ("Chrome", "Edge"); validated when the session opens
    pub browser: String,
    /// Path to the driver executable for that family
    pub driver_path: PathBuf,
    /// Enabled capability flags
    pub flags: BTreeSet<CapabilityFlag>,
    /// Screenshot save directory; current working directory when unset
    pub screenshot_dir: Option<PathBuf>,
    /// Local port for the spawned driver
    pub driver_port: u16,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            browser: "Chrome".to_string(),
            driver_path: PathBuf::new(),
            flags: BTreeSet::new(),
            screenshot_dir: None,
            driver_port: config::DEFAULT_DRIVER_PORT,
        }
    }
}

/// The ordered results of one run plus its metadata
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub script_name: String,
    pub script_description: String,
    pub browser: String,
    /// Capability flags in effect, by label
    pub flags: Vec<String>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    /// One entry per executed step, in declaration order
    pub results: Vec<StepResult>,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Runs one script in one browser session
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    config: RunConfig,
}

impl ScriptRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Open a session, run every step of the script in order, and close the
    /// session.
    ///
    /// Opening is the only fatal point: on failure no step is attempted and
    /// the error surfaces to the caller with no partial report. The session
    /// is closed when the loop ends; `BrowserSession` additionally quits on
    /// drop, so teardown happens even if step execution unwinds.
    pub fn run(&self, script: &Script) -> Result<RunReport, SessionError> {
        let manager = SessionManager::new(self.config.driver_port);
        let mut session = manager.open(
            &self.config.browser,
            &self.config.driver_path,
            &self.config.flags,
        )?;
        let report = self.run_in_session(script, &mut session);
        manager.close(&mut session);
        Ok(report)
    }

    /// Run every step against an already-open session. The caller keeps
    /// ownership of the session and is responsible for closing it.
    pub fn run_in_session(&self, script: &Script, session: &mut BrowserSession) -> RunReport {
        let executor = StepExecutor::new(self.config.screenshot_dir.clone());
        let started = Utc::now();

        let mut results = Vec::with_capacity(script.steps.len());
        for step in &script.steps {
            results.push(executor.execute(session, step));
        }

        let report = RunReport {
            script_name: script.name.clone(),
            script_description: script.description.clone(),
            browser: self.config.browser.clone(),
            flags: self
                .config
                .flags
                .iter()
                .map(|f| f.label().to_string())
                .collect(),
            started,
            finished: Utc::now(),
            results,
        };
        info!(
            "Run completed: {} steps, {} passed, {} failed",
            report.results.len(),
            report.passed_count(),
            report.failed_count()
        );
        report
    }
}

/// Runs the steps of multiple scripts back-to-back in one session.
///
/// The scripts' steps are concatenated in order and executed with the same
/// single-session semantics as [`ScriptRunner::run`]; the whole sequence
/// shares one session open/close pair. Script boundaries are not observable
/// in the report other than by step content.
#[derive(Debug, Clone)]
pub struct SequenceRunner {
    runner: ScriptRunner,
}

impl SequenceRunner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            runner: ScriptRunner::new(config),
        }
    }

    pub fn run_all(&self, scripts: &[Script]) -> Result<RunReport, SessionError> {
        self.runner.run(&flatten(scripts))
    }

    /// Sequence counterpart of [`ScriptRunner::run_in_session`]
    pub fn run_all_in_session(
        &self,
        scripts: &[Script],
        session: &mut BrowserSession,
    ) -> RunReport {
        self.runner.run_in_session(&flatten(scripts), session)
    }
}
