use thiserror::Error;

/// One semantic validation problem, tied to the dotted field path that caused it.
///
/// `validate` never stops at the first one of these — every check runs to
/// completion and all problems found are returned together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A non-fatal finding: the seed is still usable, but the author should know.
/// Travels on a channel separate from `ValidationError` and never fails
/// validation by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: String,
    pub message: String,
}

impl Warning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every error accumulated by one `validate()` call. Always non-empty when
/// constructed; an empty result is represented as `Ok(warnings)` instead.
#[derive(Debug, Clone, Error)]
#[error("{} validation error(s): {}", .0.len(), render(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn render(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML is syntactically malformed. `serde_yaml::Error`'s `Display` already
    /// includes the line/column, so it is carried through unwrapped.
    #[error("parse error in {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation failed for {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: ValidationErrors,
    },
}
