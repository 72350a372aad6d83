//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `MtApiError`, so functions can simply return `Result<T>`.
use crate::error::MtApiError;

/// Workspace-wide `Result` alias with `MtApiError` as the default error.
pub type Result<T, E = MtApiError> = std::result::Result<T, E>;
