//! Web Replay - browser automation script replay with per-step results.
//!
//! This crate provides:
//! - A typed step model with JSON script persistence
//! - Browser session management over the WebDriver protocol (plus a mock
//!   backend for testing)
//! - A step executor with best-effort semantics: step failures are recorded,
//!   never fatal
//! - Script and sequence runners producing ordered run reports
//! - Image-based visual-regression checks with annotated diff output
//!
//! # Example
//!
//! ```rust,no_run
//! use web_replay::runner::{RunConfig, ScriptRunner};
//! use web_replay::script::Script;
//!
//! let loaded = Script::load("login.json").unwrap();
//! let runner = ScriptRunner::new(RunConfig {
//!     driver_path: "/usr/local/bin/chromedriver".into(),
//!     ..RunConfig::default()
//! });
//! let report = runner.run(&loaded.script).unwrap();
//! println!("{} passed, {} failed", report.passed_count(), report.failed_count());
//! ```
//!
//! Execution is single-threaded and synchronous: each step blocks until its
//! driver call returns, and exactly one session is active per run. Hosts that
//! need a responsive front end should run the engine on a worker thread.

pub mod browser;
pub mod capability;
pub mod compare;
pub mod config;
pub mod executor;
pub mod locator;
pub mod report;
pub mod runner;
pub mod script;
pub mod step;

// Re-export step and script types
pub use script::{flatten, LoadedScript, Script, ScriptError, Sequence, SkippedStep};
pub use step::Step;

// Re-export locator resolution
pub use locator::{resolve, LocatorError, LocatorStrategy, ResolvedLocator};

// Re-export session management
pub use browser::{Browser, BrowserSession, MockBrowser, SessionError, SessionManager};
pub use capability::{BrowserFamily, CapabilityFlag};

// Re-export execution types
pub use compare::{ComparisonArtifact, CompareError, ImageComparator, Region};
pub use executor::{Outcome, StepExecutor, StepResult};
pub use runner::{RunConfig, RunReport, ScriptRunner, SequenceRunner};
