//! Contract verification issues and compile-time errors.
//!
//! Compilation collects every problem it can find before failing, so a broken
//! contract reports all of its missing operationIds and unregistered handlers
//! at once instead of one per restart.

use std::fmt;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Where the issue was found, e.g. `GET /pets/{id}`.
    pub location: String,
    /// Machine-readable category, e.g. `MissingHandler`.
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Print issues to stderr in a human-readable block (used by the CLI).
pub fn print_issues(issues: &[ValidationIssue]) {
    eprintln!(
        "\n❌ Contract verification failed. {} issue(s) found:\n",
        issues.len()
    );
    for issue in issues {
        eprintln!("{issue}");
    }
    eprintln!("\nPlease fix the issues in your contract before starting the server.\n");
}

/// Log every issue and turn a non-empty list into an aggregate error.
pub fn fail_if_issues(issues: Vec<ValidationIssue>) -> Result<(), CompileError> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        error!(
            location = %issue.location,
            kind = %issue.kind,
            message = %issue.message,
            "Contract verification issue"
        );
    }
    Err(CompileError::Verification(issues))
}

/// Errors raised while compiling a contract into a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// One or more operations failed verification.
    Verification(Vec<ValidationIssue>),
    /// Two path templates normalize to the same trie path.
    DuplicateRoute { first: String, second: String },
    /// A parameter or body schema could not be compiled.
    InvalidSchema { location: String, reason: String },
}

impl CompileError {
    /// Verification issues carried by this error, if any.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            CompileError::Verification(issues) => issues,
            _ => &[],
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Verification(issues) => {
                write!(f, "Failed verification ({} issue(s))", issues.len())?;
                for issue in issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
            CompileError::DuplicateRoute { first, second } => {
                write!(
                    f,
                    "Ambiguous path templates '{first}' and '{second}' resolve to the same route"
                )
            }
            CompileError::InvalidSchema { location, reason } => {
                write!(f, "Invalid schema at {location}: {reason}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_if_issues_aggregates() {
        assert!(fail_if_issues(Vec::new()).is_ok());

        let issues = vec![
            ValidationIssue::new("GET /a", "MissingOperationId", "no operationId"),
            ValidationIssue::new("POST /b", "MissingHandler", "no handler for 'addB'"),
        ];
        let err = fail_if_issues(issues).unwrap_err();
        assert_eq!(err.issues().len(), 2);
        let text = err.to_string();
        assert!(text.contains("GET /a"));
        assert!(text.contains("addB"));
    }
}
