//! Configuration error types.

/// Configuration loading error. Every variant aborts the scan before any
/// AppMap is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config {path}: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON config {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config format for {0}: .{1}")]
    UnsupportedFormat(String, String),

    #[error("Unknown rule \"{0}\"")]
    UnknownRule(String),

    #[error("Invalid scope name \"{0}\"")]
    UnknownScope(String),

    #[error("Rule {rule} cannot run in scope {scope}")]
    IncompatibleScope { rule: String, scope: String },

    #[error("Invalid properties for rule {rule}: {message}")]
    InvalidProperties { rule: String, message: String },

    #[error("Invalid pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Unknown filter property \"{0}\"")]
    UnknownFilterProperty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_rule() {
        let err = ConfigError::UnknownRule("no-such-rule".into());
        assert_eq!(err.to_string(), "Unknown rule \"no-such-rule\"");
    }

    #[test]
    fn test_error_display_invalid_properties() {
        let err = ConfigError::InvalidProperties {
            rule: "slow-query".into(),
            message: "unknown field `limit`".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid properties for rule slow-query: unknown field `limit`"
        );
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = ConfigError::UnsupportedFormat("scanner.txt".into(), "txt".into());
        assert_eq!(err.to_string(), "Unsupported config format for scanner.txt: .txt");
    }
}
