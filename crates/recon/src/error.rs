use thiserror::Error;

/// Failures at the engine's boundary: config files and input documents.
///
/// `reconcile` itself never fails; these only come out of parsing and
/// validation helpers.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config or option validation error (negative tolerance, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Input document is structurally invalid (missing lines array, no meta).
    #[error("input parse error: {0}")]
    InputParse(String),
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
