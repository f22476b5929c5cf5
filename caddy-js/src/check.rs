//! Challenge checking
//!
//! Every declaration matching the attempt prefix is one attempt. An attempt's
//! body runs as a top-level script once per test case, with the case input
//! bound as the input global; the captured lines, joined with `\n`, must equal
//! the expected output exactly. The first failing case ends that attempt.

use crate::extract::{ExtractError, ExtractOptions, Extractor, FunctionMatch};
use crate::loader::{LoaderError, SourceLoader};
use crate::runner::{Bindings, Runner, RunnerOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A challenge definition, usually read from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Short code, also the usual attempt prefix
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

impl Challenge {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CheckError> {
        let loader = SourceLoader::from_path(path)?;
        Self::from_json(loader.source_ref())
    }

    pub fn from_json(text: &str) -> Result<Self, CheckError> {
        serde_json::from_str(text).map_err(|err| CheckError::Challenge(err.to_string()))
    }
}

/// Verdict for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
    pub name: String,
    /// Character count of the attempt body
    pub len: usize,
    pub passed: bool,
    /// Why the attempt failed, `None` when it passed
    pub failure: Option<String>,
}

/// Settings shared by every attempt of a check
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub prefix: String,
    pub extract: ExtractOptions,
    pub runner: RunnerOptions,
    /// Template bindings; the input is replaced per test case
    pub bindings: Bindings,
}

/// Errors that prevent checking from starting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    Load(LoaderError),
    Extract(ExtractError),
    /// The challenge file is not a valid definition
    Challenge(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Load(err) => write!(f, "{}", err),
            CheckError::Extract(err) => write!(f, "{}", err),
            CheckError::Challenge(message) => write!(f, "invalid challenge: {}", message),
        }
    }
}

impl std::error::Error for CheckError {}

impl From<LoaderError> for CheckError {
    fn from(err: LoaderError) -> Self {
        CheckError::Load(err)
    }
}

impl From<ExtractError> for CheckError {
    fn from(err: ExtractError) -> Self {
        CheckError::Extract(err)
    }
}

/// Check every attempt in the file at `path`
pub fn check_file<P: AsRef<Path>>(
    path: P,
    challenge: &Challenge,
    options: &CheckOptions,
) -> Result<Vec<AttemptReport>, CheckError> {
    let loader = SourceLoader::from_path(path)?;
    check_source(loader.source_ref(), challenge, options)
}

/// Check every attempt in `source`, in declaration order
pub fn check_source(
    source: &str,
    challenge: &Challenge,
    options: &CheckOptions,
) -> Result<Vec<AttemptReport>, CheckError> {
    let attempts = Extractor::new(options.extract).extract_source(source, &options.prefix)?;
    let runner = Runner::new(options.runner.clone());
    let reports = attempts
        .iter()
        .map(|attempt| check_attempt(&runner, attempt, challenge, &options.bindings))
        .collect();
    Ok(reports)
}

fn check_attempt(
    runner: &Runner,
    attempt: &FunctionMatch,
    challenge: &Challenge,
    template: &Bindings,
) -> AttemptReport {
    let failure = challenge
        .tests
        .iter()
        .enumerate()
        .find_map(|(index, case)| {
            let bindings = template.clone().with_input(case.input.clone());
            let case_number = index + 1;
            match runner.run_source(&attempt.body, &bindings) {
                Err(err) => Some(format!("case {}: {}", case_number, err)),
                Ok(outcome) => {
                    let actual = outcome.stdout.join("\n");
                    (actual != case.expected).then(|| {
                        format!(
                            "case {}: expected {:?}, got {:?}",
                            case_number, case.expected, actual
                        )
                    })
                }
            }
        });

    log::debug!(
        "attempt {} ({} chars): {}",
        attempt.name,
        attempt.len,
        failure.as_deref().unwrap_or("passed")
    );
    AttemptReport {
        name: attempt.name.clone(),
        len: attempt.len,
        passed: failure.is_none(),
        failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverse_challenge() -> Challenge {
        Challenge::from_json(
            r#"{
                "code": "ch1",
                "name": "Reverse",
                "tests": [
                    {"input": "abc", "expected": "cba"},
                    {"input": "xy", "expected": "yx"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn options() -> CheckOptions {
        CheckOptions {
            prefix: "ch1".to_string(),
            ..CheckOptions::default()
        }
    }

    #[test]
    fn test_passing_and_failing_attempts() {
        let source = r#"
function ch1a(s) {console.log([...s].reverse().join(''))}
function ch1b(s) {console.log(s)}
function helper() {}
"#;
        let reports = check_source(source, &reverse_challenge(), &options()).unwrap();
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].name, "ch1a");
        assert!(reports[0].passed);
        assert_eq!(reports[0].failure, None);
        assert_eq!(reports[0].len, "console.log([...s].reverse().join(''))".len());

        assert_eq!(reports[1].name, "ch1b");
        assert!(!reports[1].passed);
        assert_eq!(
            reports[1].failure.as_deref(),
            Some(r#"case 1: expected "cba", got "abc""#)
        );
    }

    #[test]
    fn test_every_case_is_checked() {
        let source = "function ch1a(s) {console.log(s == 'abc' ? 'cba' : 'nope')}";
        let reports = check_source(source, &reverse_challenge(), &options()).unwrap();
        assert_eq!(
            reports[0].failure.as_deref(),
            Some(r#"case 2: expected "yx", got "nope""#)
        );
    }

    #[test]
    fn test_runtime_error_fails_attempt() {
        let source = "function ch1a(s) {s.nope()}";
        let reports = check_source(source, &reverse_challenge(), &options()).unwrap();
        assert!(!reports[0].passed);
        assert!(reports[0]
            .failure
            .as_deref()
            .unwrap()
            .starts_with("case 1: TypeError"));
    }

    #[test]
    fn test_multi_line_output() {
        let challenge = Challenge::from_json(
            r#"{"code": "ch2", "name": "Split", "tests": [{"input": "a b", "expected": "a\nb"}]}"#,
        )
        .unwrap();
        let source = "function ch2a(s) {s.split(' ').map(w => console.log(w))}";
        let options = CheckOptions {
            prefix: "ch2".to_string(),
            ..CheckOptions::default()
        };
        let reports = check_source(source, &challenge, &options).unwrap();
        assert!(reports[0].passed);
    }

    #[test]
    fn test_invalid_challenge() {
        let err = Challenge::from_json("{\"code\": 1}").unwrap_err();
        assert!(matches!(err, CheckError::Challenge(_)));
    }

    #[test]
    fn test_parse_error_stops_check() {
        let err = check_source("function ch1a( {", &reverse_challenge(), &options()).unwrap_err();
        assert!(matches!(err, CheckError::Extract(ExtractError::Parse { .. })));
    }
}
