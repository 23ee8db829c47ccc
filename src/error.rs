//! Application-wide error types using thiserror
//!
//! Stream conditions that happen while feeds are running are reported through
//! the client's error callback as `StreamError`. `AppError` covers what can go
//! wrong around that: loading configuration and building the client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("api_url cannot be empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: api_url cannot be empty");
    }

    #[test]
    fn test_runtime_error_display() {
        let err = AppError::Runtime("no reactor".to_string());
        assert_eq!(err.to_string(), "Runtime error: no reactor");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
        let err: AppError = io.into();
        assert!(err.to_string().contains("config.yaml"));
    }
}
