//! Step representation and record encoding.
//!
//! A step is one atomic automation instruction. Script files persist steps as
//! JSON arrays (`["Navigate to URL", "https://...", "description"]`); this
//! module owns the conversion between that record format and the typed
//! [`Step`] union, plus the human-readable display text used in run
//! summaries and reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One atomic automation instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Suspend execution for the given number of seconds.
    ///
    /// The duration is kept as the raw script value and parsed when the step
    /// runs, so a non-numeric value is a step-local failure rather than a
    /// load failure.
    Sleep { seconds: String },

    /// Load a URL in the session
    Navigate { url: String, description: String },

    /// Find exactly one element by locator and click it
    ClickElement {
        strategy: String,
        value: String,
        description: String,
    },

    /// Find an element by locator and send text to it
    InputText {
        strategy: String,
        value: String,
        text: String,
        description: String,
    },

    /// Capture a screenshot and save it under the configured directory
    TakeScreenshot { file_name: String, description: String },

    /// Run code in the browser's script context
    ExecuteScript { code: String, description: String },

    /// Run a script file on the host, with full host privileges
    ExecuteHostScript { path: String, description: String },

    /// Maximize the session's window
    MaximizeWindow,

    /// Capture a screenshot and diff it against a reference image
    CompareImages {
        reference_path: String,
        test_file_name: String,
        output_path: String,
    },
}

/// Action labels as stored in script files
pub const ACTION_SLEEP: &str = "Sleep";
pub const ACTION_NAVIGATE: &str = "Navigate to URL";
pub const ACTION_CLICK: &str = "Click Element";
pub const ACTION_INPUT: &str = "Input Text";
pub const ACTION_SCREENSHOT: &str = "Take Screenshot";
pub const ACTION_SCRIPT: &str = "Execute JavaScript";
pub const ACTION_HOST_SCRIPT: &str = "Execute Host Script";
pub const ACTION_MAXIMIZE: &str = "Maximize Window";
pub const ACTION_COMPARE: &str = "Compare Images";

impl Step {
    /// The action label for this step
    pub fn action_name(&self) -> &'static str {
        match self {
            Step::Sleep { .. } => ACTION_SLEEP,
            Step::Navigate { .. } => ACTION_NAVIGATE,
            Step::ClickElement { .. } => ACTION_CLICK,
            Step::InputText { .. } => ACTION_INPUT,
            Step::TakeScreenshot { .. } => ACTION_SCREENSHOT,
            Step::ExecuteScript { .. } => ACTION_SCRIPT,
            Step::ExecuteHostScript { .. } => ACTION_HOST_SCRIPT,
            Step::MaximizeWindow => ACTION_MAXIMIZE,
            Step::CompareImages { .. } => ACTION_COMPARE,
        }
    }

    /// The free-text description carried for reporting, if the variant has one
    pub fn description(&self) -> Option<&str> {
        match self {
            Step::Navigate { description, .. }
            | Step::ClickElement { description, .. }
            | Step::InputText { description, .. }
            | Step::TakeScreenshot { description, .. }
            | Step::ExecuteScript { description, .. }
            | Step::ExecuteHostScript { description, .. } => Some(description),
            Step::Sleep { .. } | Step::MaximizeWindow | Step::CompareImages { .. } => None,
        }
    }

    /// The primary value of this step, as shown in report tables
    pub fn primary_value(&self) -> Option<&str> {
        match self {
            Step::Sleep { seconds } => Some(seconds),
            Step::Navigate { url, .. } => Some(url),
            Step::ClickElement { value, .. } => Some(value),
            Step::InputText { value, .. } => Some(value),
            Step::TakeScreenshot { file_name, .. } => Some(file_name),
            Step::ExecuteScript { code, .. } => Some(code),
            Step::ExecuteHostScript { path, .. } => Some(path),
            Step::MaximizeWindow => None,
            Step::CompareImages { reference_path, .. } => Some(reference_path),
        }
    }

    /// One-line display text for run summaries
    pub fn display_text(&self) -> String {
        match self {
            Step::Sleep { seconds } => format!("Sleep for {} seconds.", seconds),
            Step::Navigate { url, description } => {
                format!("{}: {}{}", ACTION_NAVIGATE, url, describe(description))
            }
            Step::ClickElement {
                strategy,
                value,
                description,
            } => format!(
                "{}: (By: {}, {}){}",
                ACTION_CLICK,
                strategy,
                value,
                describe(description)
            ),
            Step::InputText {
                strategy,
                value,
                text,
                description,
            } => format!(
                "{}: (By: {}, {}), Text: {}{}",
                ACTION_INPUT,
                strategy,
                value,
                text,
                describe(description)
            ),
            Step::TakeScreenshot { file_name, .. } => {
                format!("Take screenshot and save as {}", file_name)
            }
            Step::ExecuteScript { code, description } => {
                format!("{}: {}{}", ACTION_SCRIPT, code, describe(description))
            }
            Step::ExecuteHostScript { path, description } => {
                format!("{}: {}{}", ACTION_HOST_SCRIPT, path, describe(description))
            }
            Step::MaximizeWindow => ACTION_MAXIMIZE.to_string(),
            Step::CompareImages {
                reference_path,
                output_path,
                ..
            } => format!(
                "{}: reference {}, output {}",
                ACTION_COMPARE, reference_path, output_path
            ),
        }
    }

    /// Encode this step as the array record stored in script files
    pub fn to_record(&self) -> Vec<Value> {
        match self {
            Step::Sleep { seconds } => {
                vec![ACTION_SLEEP.into(), seconds.as_str().into()]
            }
            Step::Navigate { url, description } => vec![
                ACTION_NAVIGATE.into(),
                url.as_str().into(),
                description.as_str().into(),
            ],
            Step::ClickElement {
                strategy,
                value,
                description,
            } => vec![
                ACTION_CLICK.into(),
                strategy.as_str().into(),
                value.as_str().into(),
                "".into(),
                description.as_str().into(),
            ],
            Step::InputText {
                strategy,
                value,
                text,
                description,
            } => vec![
                ACTION_INPUT.into(),
                strategy.as_str().into(),
                value.as_str().into(),
                text.as_str().into(),
                description.as_str().into(),
            ],
            Step::TakeScreenshot {
                file_name,
                description,
            } => vec![
                ACTION_SCREENSHOT.into(),
                file_name.as_str().into(),
                description.as_str().into(),
            ],
            Step::ExecuteScript { code, description } => vec![
                ACTION_SCRIPT.into(),
                code.as_str().into(),
                description.as_str().into(),
            ],
            Step::ExecuteHostScript { path, description } => vec![
                ACTION_HOST_SCRIPT.into(),
                path.as_str().into(),
                description.as_str().into(),
            ],
            Step::MaximizeWindow => vec![ACTION_MAXIMIZE.into()],
            Step::CompareImages {
                reference_path,
                test_file_name,
                output_path,
            } => vec![
                ACTION_COMPARE.into(),
                reference_path.as_str().into(),
                test_file_name.as_str().into(),
                output_path.as_str().into(),
            ],
        }
    }

    /// Decode one array record into a step.
    ///
    /// Returns a human-readable error for unknown actions or wrong arity;
    /// script loading reports these per-index and skips the record.
    pub fn from_record(record: &[Value]) -> Result<Step, String> {
        let action = record
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| "step record has no action field".to_string())?;

        match action {
            ACTION_SLEEP => Ok(Step::Sleep {
                seconds: field(record, 1, action)?,
            }),
            ACTION_NAVIGATE => Ok(Step::Navigate {
                url: field(record, 1, action)?,
                description: optional_field(record, 2),
            }),
            ACTION_CLICK => Ok(Step::ClickElement {
                strategy: field(record, 1, action)?,
                value: field(record, 2, action)?,
                description: optional_field(record, 4),
            }),
            ACTION_INPUT => Ok(Step::InputText {
                strategy: field(record, 1, action)?,
                value: field(record, 2, action)?,
                text: field(record, 3, action)?,
                description: optional_field(record, 4),
            }),
            ACTION_SCREENSHOT => Ok(Step::TakeScreenshot {
                file_name: field(record, 1, action)?,
                description: optional_field(record, 2),
            }),
            ACTION_SCRIPT => Ok(Step::ExecuteScript {
                code: field(record, 1, action)?,
                description: optional_field(record, 2),
            }),
            ACTION_HOST_SCRIPT => Ok(Step::ExecuteHostScript {
                path: field(record, 1, action)?,
                description: optional_field(record, 2),
            }),
            ACTION_MAXIMIZE => Ok(Step::MaximizeWindow),
            ACTION_COMPARE => Ok(Step::CompareImages {
                reference_path: field(record, 1, action)?,
                test_file_name: field(record, 2, action)?,
                output_path: field(record, 3, action)?,
            }),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

fn describe(description: &str) -> String {
    if description.is_empty() {
        ".".to_string()
    } else {
        format!(", Description: {}", description)
    }
}

/// Required string field at `index`, stringifying bare numbers (older script
/// files stored sleep durations as JSON numbers)
fn field(record: &[Value], index: usize, action: &str) -> Result<String, String> {
    match record.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(format!(
            "{}: field {} has unexpected type: {}",
            action, index, other
        )),
        None => Err(format!("{}: missing field {}", action, index)),
    }
}

fn optional_field(record: &[Value], index: usize) -> String {
    match record.get(index) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Normalize a screenshot file name to end with a `.png` extension
pub fn normalize_image_name(file_name: &str) -> String {
    if file_name.to_lowercase().ends_with(".png") {
        file_name.to_string()
    } else {
        format!("{}.png", file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_steps() -> Vec<Step> {
        vec![
            Step::Sleep {
                seconds: "1.5".to_string(),
            },
            Step::Navigate {
                url: "https://example.com".to_string(),
                description: "open the landing page".to_string(),
            },
            Step::ClickElement {
                strategy: "ID".to_string(),
                value: "submit".to_string(),
                description: String::new(),
            },
            Step::InputText {
                strategy: "Name".to_string(),
                value: "user".to_string(),
                text: "alice".to_string(),
                description: "fill username".to_string(),
            },
            Step::TakeScreenshot {
                file_name: "landing".to_string(),
                description: String::new(),
            },
            Step::ExecuteScript {
                code: "window.scrollTo(0, 0);".to_string(),
                description: String::new(),
            },
            Step::ExecuteHostScript {
                path: "/opt/checks/cleanup.sh".to_string(),
                description: "post-run cleanup".to_string(),
            },
            Step::MaximizeWindow,
            Step::CompareImages {
                reference_path: "ref/landing.png".to_string(),
                test_file_name: "landing_now.png".to_string(),
                output_path: "out/landing_diff.png".to_string(),
            },
        ]
    }

    #[test]
    fn test_record_round_trip() {
        for step in sample_steps() {
            let record = step.to_record();
            let decoded = Step::from_record(&record).expect("decode failed");
            assert_eq!(decoded, step);
        }
    }

    #[test]
    fn test_from_record_unknown_action() {
        let record = vec![Value::from("Teleport"), Value::from("somewhere")];
        let err = Step::from_record(&record).unwrap_err();
        assert!(err.contains("unknown action"));
    }

    #[test]
    fn test_from_record_missing_field() {
        let record = vec![Value::from(ACTION_INPUT), Value::from("ID")];
        let err = Step::from_record(&record).unwrap_err();
        assert!(err.contains("missing field"));
    }

    #[test]
    fn test_from_record_numeric_sleep() {
        let record = vec![Value::from(ACTION_SLEEP), Value::from(2)];
        let step = Step::from_record(&record).unwrap();
        assert_eq!(
            step,
            Step::Sleep {
                seconds: "2".to_string()
            }
        );
    }

    #[test]
    fn test_display_text() {
        assert_eq!(
            Step::Sleep {
                seconds: "2".to_string()
            }
            .display_text(),
            "Sleep for 2 seconds."
        );
        assert_eq!(
            Step::Navigate {
                url: "https://example.com".to_string(),
                description: String::new(),
            }
            .display_text(),
            "Navigate to URL: https://example.com."
        );
        assert_eq!(
            Step::Navigate {
                url: "https://example.com".to_string(),
                description: "home".to_string(),
            }
            .display_text(),
            "Navigate to URL: https://example.com, Description: home"
        );
    }

    #[test]
    fn test_normalize_image_name() {
        assert_eq!(normalize_image_name("shot"), "shot.png");
        assert_eq!(normalize_image_name("shot.png"), "shot.png");
        assert_eq!(normalize_image_name("SHOT.PNG"), "SHOT.PNG");
    }
}
