//! Script and sequence persistence.
//!
//! A script file is a JSON object with `testName`, `testDescription` and a
//! `steps` list of array records. Malformed step records are reported
//! per-index and skipped; only a structurally invalid file (not an object,
//! `steps` missing or not a list) fails the whole load. A sequence file is a
//! JSON array of script file paths.

use log::warn;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::step::Step;

/// A named, ordered collection of steps plus descriptive metadata.
///
/// Immutable during a run; the engine reads but never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn new(name: impl Into<String>, description: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps,
        }
    }

    /// Load a script from a JSON file.
    ///
    /// Step records that fail to decode are collected in
    /// [`LoadedScript::skipped`] and logged; they do not fail the load.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedScript, ScriptError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;

        let object = value
            .as_object()
            .ok_or_else(|| ScriptError::Format("file content is not a JSON object".to_string()))?;
        let records = object
            .get("steps")
            .and_then(Value::as_array)
            .ok_or_else(|| ScriptError::Format("missing or non-list 'steps' field".to_string()))?;

        let name = object
            .get("testName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = object
            .get("testDescription")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut steps = Vec::new();
        let mut skipped = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let decoded = match record.as_array() {
                Some(fields) => Step::from_record(fields),
                None => Err("step record is not an array".to_string()),
            };
            match decoded {
                Ok(step) => steps.push(step),
                Err(reason) => {
                    warn!(
                        "Skipping invalid step at index {} in {}: {}",
                        index,
                        path.display(),
                        reason
                    );
                    skipped.push(SkippedStep { index, reason });
                }
            }
        }

        Ok(LoadedScript {
            script: Script {
                name,
                description,
                steps,
            },
            skipped,
        })
    }

    /// Save the script to a JSON file in the same record format `load` reads
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScriptError> {
        let records: Vec<Value> = self.steps.iter().map(|s| Value::from(s.to_record())).collect();
        let document = serde_json::json!({
            "testName": self.name,
            "testDescription": self.description,
            "steps": records,
        });
        fs::write(path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}

/// The result of loading a script file
#[derive(Debug, Clone)]
pub struct LoadedScript {
    pub script: Script,
    /// Step records that failed to decode, by original index
    pub skipped: Vec<SkippedStep>,
}

/// One step record that failed to decode during load
#[derive(Debug, Clone)]
pub struct SkippedStep {
    pub index: usize,
    pub reason: String,
}

/// An ordered list of script file paths, run back-to-back in one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub entries: Vec<PathBuf>,
}

impl Sequence {
    /// Load a sequence file: a JSON array of script file paths
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let entries = value
            .as_array()
            .ok_or_else(|| ScriptError::Format("sequence file is not a JSON array".to_string()))?
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(PathBuf::from)
                    .ok_or_else(|| ScriptError::Format("sequence entry is not a path".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Resolve every entry to a loaded script, in order
    pub fn resolve(&self) -> Result<Vec<LoadedScript>, ScriptError> {
        self.entries.iter().map(Script::load).collect()
    }
}

/// Flatten the steps of multiple scripts into one logical script,
/// preserving per-script and inter-script order
pub fn flatten(scripts: &[Script]) -> Script {
    let name = scripts
        .iter()
        .map(|s| s.name.as_str())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(" + ");
    let steps = scripts.iter().flat_map(|s| s.steps.iter().cloned()).collect();
    Script {
        name,
        description: String::new(),
        steps,
    }
}

/// Result type for script persistence
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Error types for script and sequence files
#[derive(Debug)]
pub enum ScriptError {
    /// I/O error
    Io(std::io::Error),

    /// The file is not valid JSON
    Parse(serde_json::Error),

    /// The file decodes but does not have the expected shape
    Format(String),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Io(err) => write!(f, "I/O error: {}", err),
            ScriptError::Parse(err) => write!(f, "Parse error: {}", err),
            ScriptError::Format(msg) => write!(f, "Format error: {}", msg),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::Io(err) => Some(err),
            ScriptError::Parse(err) => Some(err),
            ScriptError::Format(_) => None,
        }
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        ScriptError::Io(err)
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(err: serde_json::Error) -> Self {
        ScriptError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_script() -> Script {
        Script::new(
            "Login",
            "log into the demo site",
            vec![
                Step::Navigate {
                    url: "https://example.com".to_string(),
                    description: String::new(),
                },
                Step::InputText {
                    strategy: "ID".to_string(),
                    value: "user".to_string(),
                    text: "alice".to_string(),
                    description: String::new(),
                },
                Step::ClickElement {
                    strategy: "ID".to_string(),
                    value: "submit".to_string(),
                    description: String::new(),
                },
            ],
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("login.json");

        let script = sample_script();
        script.save(&path).unwrap();

        let loaded = Script::load(&path).unwrap();
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.script, script);
    }

    #[test]
    fn test_load_skips_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(
            &path,
            r#"{
                "testName": "Partial",
                "testDescription": "",
                "steps": [
                    ["Navigate to URL", "https://example.com", ""],
                    "not a record",
                    ["Teleport", "nowhere"],
                    ["Maximize Window"]
                ]
            }"#,
        )
        .unwrap();

        let loaded = Script::load(&path).unwrap();
        assert_eq!(loaded.script.steps.len(), 2);
        assert_eq!(loaded.skipped.len(), 2);
        assert_eq!(loaded.skipped[0].index, 1);
        assert_eq!(loaded.skipped[1].index, 2);
    }

    #[test]
    fn test_load_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(Script::load(&path), Err(ScriptError::Format(_))));
    }

    #[test]
    fn test_load_rejects_missing_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nosteps.json");
        fs::write(&path, r#"{"testName": "x", "steps": "oops"}"#).unwrap();
        assert!(matches!(Script::load(&path), Err(ScriptError::Format(_))));
    }

    #[test]
    fn test_sequence_load_and_flatten() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");

        let script_a = Script::new("A", "", vec![Step::MaximizeWindow]);
        let script_b = sample_script();
        script_a.save(&a).unwrap();
        script_b.save(&b).unwrap();

        let seq_path = dir.path().join("seq.json");
        fs::write(
            &seq_path,
            serde_json::to_string(&[a.to_string_lossy(), b.to_string_lossy()]).unwrap(),
        )
        .unwrap();

        let sequence = Sequence::load(&seq_path).unwrap();
        assert_eq!(sequence.entries.len(), 2);

        let scripts: Vec<Script> = sequence
            .resolve()
            .unwrap()
            .into_iter()
            .map(|l| l.script)
            .collect();
        let flat = flatten(&scripts);
        assert_eq!(flat.name, "A + Login");
        assert_eq!(flat.steps.len(), 1 + 3);
        assert_eq!(flat.steps[0], Step::MaximizeWindow);
        assert_eq!(flat.steps[1..], script_b.steps[..]);
    }
}
