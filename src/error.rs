use thiserror::Error;

use crate::configuration::ConfigError;
use crate::integration::RemoteError;

/// Failure raised by a rule's matcher while evaluating one event.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule {rule} failed on event {event}: {message}")]
    Matcher {
        rule: String,
        event: u64,
        message: String,
    },

    #[error("Rule {rule} referenced unknown event index {index}")]
    UnknownEvent { rule: String, index: usize },
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read file: {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse AppMap: {path}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Check {check} failed on {file}")]
    Rule {
        file: String,
        check: String,
        #[source]
        source: RuleError,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Failed to write file: {path}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Process exit code for this error.
    ///
    /// 2 is a validation error, 3 an aborted run (bad configuration), 4 everything
    /// that failed at runtime.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanError::Validation(_) | ScanError::Remote(RemoteError::AppIdUnresolved) => 2,
            ScanError::Config(_) => 3,
            _ => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_exit_code() {
        let err = ScanError::Validation("Either --appmap-dir or --appmap-file is required".into());
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "Either --appmap-dir or --appmap-file is required"
        );
    }

    #[test]
    fn test_config_exit_code() {
        let err = ScanError::from(ConfigError::UnknownScope("everything".into()));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("everything"));
    }

    #[test]
    fn test_runtime_exit_code() {
        let err = ScanError::ReadError {
            path: "missing.appmap.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "Failed to read file: missing.appmap.json");
    }

    #[test]
    fn test_rule_error_display() {
        let err = ScanError::Rule {
            file: "a.appmap.json".into(),
            check: "http-5xx".into(),
            source: RuleError::Matcher {
                rule: "http-5xx".into(),
                event: 7,
                message: "boom".into(),
            },
        };
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "Check http-5xx failed on a.appmap.json");
    }
}
