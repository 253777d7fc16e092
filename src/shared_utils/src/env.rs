use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but its value could not be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    pub name: String,
    pub value: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional override. Unset and blank values both count as absent.
pub fn get_env_override(name: &str) -> Option<String> {
    get_env_var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional override.
///
/// Returns `Ok(None)` when the variable is absent, and an error when it is
/// present but does not parse as `T`.
pub fn get_env_parsed<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    match get_env_override(name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| InvalidEnvVarError {
                name: name.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: &str = "SHARED_UTILS_TEST_VARIABLE_THAT_IS_NEVER_SET";

    #[test]
    fn missing_variable_reports_its_name() {
        let err = get_env_var(UNSET).unwrap_err();
        assert_eq!(err.0, UNSET);
        assert!(err.to_string().contains(UNSET));
    }

    #[test]
    fn absent_override_is_none() {
        assert!(get_env_override(UNSET).is_none());
        assert!(get_env_parsed::<u64>(UNSET).unwrap().is_none());
    }

    #[test]
    fn present_variable_is_read() {
        // PATH is set in every test environment we run in.
        assert!(get_env_var("PATH").is_ok());
    }
}
