//! Step execution.
//!
//! `StepExecutor` interprets one step against an active session and produces
//! one `StepResult`. Every failure is caught at the step boundary and
//! converted into a `Failed` result carrying the error detail; execution
//! always continues with the next step. Steps are frequently independent
//! checks in the same page session, so a broken locator on one step must not
//! stop the rest.

use log::error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::browser::BrowserSession;
use crate::compare::ImageComparator;
use crate::locator;
use crate::step::{normalize_image_name, Step};

/// Pass/fail outcome of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

/// The recorded outcome of one executed step.
///
/// Produced exactly once per step, in step order, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
}

impl StepResult {
    pub fn passed(step: &Step) -> Self {
        Self {
            step: step.clone(),
            outcome: Outcome::Passed,
            error_detail: None,
        }
    }

    pub fn failed(step: &Step, detail: String) -> Self {
        Self {
            step: step.clone(),
            outcome: Outcome::Failed,
            error_detail: Some(detail),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Executes individual steps against a browser session
#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    /// Configured screenshot save directory; falls back to the current
    /// working directory when missing or invalid
    screenshot_dir: Option<PathBuf>,
}

impl StepExecutor {
    pub fn new(screenshot_dir: Option<PathBuf>) -> Self {
        Self { screenshot_dir }
    }

    /// Execute one step, converting any failure into a `Failed` result
    pub fn execute(&self, session: &mut BrowserSession, step: &Step) -> StepResult {
        match self.dispatch(session, step) {
            Ok(()) => StepResult::passed(step),
            Err(detail) => {
                error!("Error in {}: {}", step.action_name(), detail);
                StepResult::failed(step, detail)
            }
        }
    }

    fn dispatch(&self, session: &mut BrowserSession, step: &Step) -> Result<(), String> {
        match step {
            Step::Sleep { seconds } => sleep_for(seconds),
            Step::Navigate { url, .. } => session.navigate(url).map_err(|e| e.to_string()),
            Step::ClickElement {
                strategy, value, ..
            } => {
                let predicate = locator::resolve(strategy)
                    .map_err(|e| e.to_string())?
                    .predicate(value);
                session.click(&predicate).map_err(|e| e.to_string())
            }
            Step::InputText {
                strategy,
                value,
                text,
                ..
            } => {
                let predicate = locator::resolve(strategy)
                    .map_err(|e| e.to_string())?
                    .predicate(value);
                session
                    .input_text(&predicate, text)
                    .map_err(|e| e.to_string())
            }
            Step::TakeScreenshot { file_name, .. } => {
                let png = session.screenshot_png().map_err(|e| e.to_string())?;
                let path = self
                    .effective_screenshot_dir()
                    .join(normalize_image_name(file_name));
                fs::write(&path, &png)
                    .map_err(|e| format!("failed to write {}: {}", path.display(), e))
            }
            Step::ExecuteScript { code, .. } => {
                session.execute_script(code).map_err(|e| e.to_string())
            }
            Step::ExecuteHostScript { path, .. } => run_host_script(Path::new(path)),
            Step::MaximizeWindow => session.maximize_window().map_err(|e| e.to_string()),
            Step::CompareImages {
                reference_path,
                test_file_name,
                output_path,
            } => {
                let comparator = ImageComparator::new(self.effective_screenshot_dir());
                // Completing the pipeline is success regardless of whether
                // differing regions were found
                comparator
                    .compare(
                        session,
                        Path::new(reference_path),
                        test_file_name,
                        Path::new(output_path),
                    )
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        }
    }

    /// The configured screenshot directory when it exists, otherwise the
    /// current working directory
    pub(crate) fn effective_screenshot_dir(&self) -> PathBuf {
        match &self.screenshot_dir {
            Some(dir) if dir.is_dir() => dir.clone(),
            _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Suspend the calling thread for the step's duration.
///
/// The duration comes in as the raw script value; a non-numeric or negative
/// value is a step-local failure.
fn sleep_for(seconds: &str) -> Result<(), String> {
    let secs: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| format!("invalid sleep duration: {}", seconds))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("sleep duration must be a positive number: {}", seconds));
    }
    thread::sleep(Duration::from_secs_f64(secs));
    Ok(())
}

/// Run a host-side script file with full host privileges.
///
/// No sandboxing, matching the host tool's behavior. A missing file or a
/// non-zero exit status is the step failure.
fn run_host_script(path: &Path) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("host script not found: {}", path.display()));
    }
    let status = Command::new(path)
        .status()
        .map_err(|e| format!("failed to run {}: {}", path.display(), e))?;
    if !status.success() {
        return Err(format!("host script {} exited with {}", path.display(), status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserSession, MockBrowser};
    use crate::locator::LocatorStrategy;
    use pretty_assertions::assert_eq;

    fn mock_session() -> (BrowserSession, MockBrowser) {
        let mock = MockBrowser::new();
        let handle = mock.clone();
        (BrowserSession::new(Box::new(mock)), handle)
    }

    #[test]
    fn test_navigate_passes() {
        let (mut session, mock) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::Navigate {
            url: "https://example.com".to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &step);
        assert!(result.is_passed());
        assert_eq!(
            mock.state().lock().unwrap().visited,
            vec!["https://example.com"]
        );
    }

    #[test]
    fn test_click_missing_element_fails_locally() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::ClickElement {
            strategy: "ID".to_string(),
            value: "missing".to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &step);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error_detail.unwrap().contains("element not found"));
    }

    #[test]
    fn test_unknown_strategy_fails_locally() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::ClickElement {
            strategy: "Not A Strategy".to_string(),
            value: "x".to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &step);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result
            .error_detail
            .unwrap()
            .contains("Unknown locator strategy"));
    }

    #[test]
    fn test_input_text_sends_keys() {
        let (mut session, mock) = mock_session();
        mock.add_element(&LocatorStrategy::Id.predicate("user"), 1);
        let executor = StepExecutor::default();
        let step = Step::InputText {
            strategy: "ID".to_string(),
            value: "user".to_string(),
            text: "alice".to_string(),
            description: String::new(),
        };
        assert!(executor.execute(&mut session, &step).is_passed());
        assert_eq!(
            mock.state().lock().unwrap().typed,
            vec![("id:user".to_string(), "alice".to_string())]
        );
    }

    #[test]
    fn test_input_text_accepts_first_of_many_but_click_does_not() {
        // Click requires exactly one match; typing goes to the first match
        let (mut session, mock) = mock_session();
        mock.add_element(&LocatorStrategy::ClassName.predicate("field"), 3);
        let executor = StepExecutor::default();

        let input = Step::InputText {
            strategy: "Class Name".to_string(),
            value: "field".to_string(),
            text: "alice".to_string(),
            description: String::new(),
        };
        assert!(executor.execute(&mut session, &input).is_passed());

        let click = Step::ClickElement {
            strategy: "Class Name".to_string(),
            value: "field".to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &click);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result
            .error_detail
            .unwrap()
            .contains("matched 3 elements"));
    }

    #[test]
    fn test_sleep_rejects_non_numeric_duration() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::Sleep {
            seconds: "soon".to_string(),
        };
        let result = executor.execute(&mut session, &step);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error_detail.unwrap().contains("invalid sleep duration"));
    }

    #[test]
    fn test_sleep_rejects_negative_duration() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::Sleep {
            seconds: "-1".to_string(),
        };
        assert_eq!(executor.execute(&mut session, &step).outcome, Outcome::Failed);
    }

    #[test]
    fn test_short_sleep_passes() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::Sleep {
            seconds: "0.01".to_string(),
        };
        assert!(executor.execute(&mut session, &step).is_passed());
    }

    #[test]
    fn test_take_screenshot_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = mock_session();
        let executor = StepExecutor::new(Some(dir.path().to_path_buf()));
        let step = Step::TakeScreenshot {
            file_name: "landing".to_string(),
            description: String::new(),
        };
        assert!(executor.execute(&mut session, &step).is_passed());
        assert!(dir.path().join("landing.png").exists());
    }

    #[test]
    fn test_screenshot_dir_falls_back_to_cwd() {
        let executor = StepExecutor::new(Some(PathBuf::from("/definitely/not/a/dir")));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(executor.effective_screenshot_dir(), cwd);

        let dir = tempfile::tempdir().unwrap();
        let executor = StepExecutor::new(Some(dir.path().to_path_buf()));
        assert_eq!(executor.effective_screenshot_dir(), dir.path());
    }

    #[test]
    fn test_compare_images_step_passes_with_differences() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mock) = mock_session();

        // Reference differs from the mock screenshot in one block
        let mut reference = crate::browser::backend::solid_image(64, 48, [40, 40, 40]);
        for y in 10..14 {
            for x in 8..16 {
                reference.put_pixel(x, y, image::Rgb([250, 250, 250]));
            }
        }
        let reference_path = dir.path().join("reference.png");
        reference.save(&reference_path).unwrap();
        let _ = mock;

        let output_path = dir.path().join("annotated.png");
        let executor = StepExecutor::new(Some(dir.path().to_path_buf()));
        let step = Step::CompareImages {
            reference_path: reference_path.to_string_lossy().to_string(),
            test_file_name: "current".to_string(),
            output_path: output_path.to_string_lossy().to_string(),
        };

        // Differences were found, but the pipeline completed: step passes
        let result = executor.execute(&mut session, &step);
        assert!(result.is_passed(), "{:?}", result.error_detail);
        assert!(output_path.exists());
        assert!(dir.path().join("current.png").exists());
    }

    #[test]
    fn test_compare_images_step_fails_on_missing_reference() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = mock_session();
        let executor = StepExecutor::new(Some(dir.path().to_path_buf()));
        let step = Step::CompareImages {
            reference_path: dir
                .path()
                .join("nope.png")
                .to_string_lossy()
                .to_string(),
            test_file_name: "current".to_string(),
            output_path: dir.path().join("out.png").to_string_lossy().to_string(),
        };
        let result = executor.execute(&mut session, &step);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error_detail.unwrap().contains("Image load error"));
    }

    #[test]
    fn test_host_script_missing_file_fails() {
        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();
        let step = Step::ExecuteHostScript {
            path: "/definitely/not/a/script.sh".to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &step);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error_detail.unwrap().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_host_script_runs_and_reports_exit_status() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ok_path = dir.path().join("ok.sh");
        let fail_path = dir.path().join("fail.sh");
        fs::write(&ok_path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::write(&fail_path, "#!/bin/sh\nexit 3\n").unwrap();
        for p in [&ok_path, &fail_path] {
            fs::set_permissions(p, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let (mut session, _) = mock_session();
        let executor = StepExecutor::default();

        let ok = Step::ExecuteHostScript {
            path: ok_path.to_string_lossy().to_string(),
            description: String::new(),
        };
        assert!(executor.execute(&mut session, &ok).is_passed());

        let fail = Step::ExecuteHostScript {
            path: fail_path.to_string_lossy().to_string(),
            description: String::new(),
        };
        let result = executor.execute(&mut session, &fail);
        assert_eq!(result.outcome, Outcome::Failed);
        assert!(result.error_detail.unwrap().contains("exited with"));
    }
}
