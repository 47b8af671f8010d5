use std::path::Path;

use pctl_seed::Seed;

use crate::error::ConfigError;
use crate::validate::validate;

/// Read and parse a seed file, then run semantic validation.
///
/// Returns `Err(ConfigError::Invalid)` if validation finds any errors — the
/// seed is fully parsed at that point, but is not returned, since a caller
/// that ignored the error and used it anyway would be acting on data known
/// to violate an invariant. Warnings are logged but never block the load.
pub fn load(path: impl AsRef<Path>) -> Result<Seed, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path_str.clone(),
        source,
    })?;

    parse_and_validate(&content, &path_str)
}

/// Parse and validate an already-read seed document. Split out from `load`
/// so callers that already have the bytes (e.g. fetched from an object
/// store) don't need a round trip through the filesystem.
pub fn parse_and_validate(content: &str, path_str: &str) -> Result<Seed, ConfigError> {
    let seed: Seed = serde_yaml::from_str(content).map_err(|source| ConfigError::ParseError {
        path: path_str.to_string(),
        source,
    })?;

    let (errors, warnings) = validate(&seed);

    for warning in &warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "seed validation warning");
    }

    if !errors.is_empty() {
        return Err(ConfigError::Invalid {
            path: path_str.to_string(),
            source: crate::error::ValidationErrors(errors),
        });
    }

    Ok(seed)
}
