//! Dispatch errors surfaced to callers of the tool server

use thiserror::Error;

/// Failures that prevent a tool from being run at all.
///
/// Failures *inside* a tool are reported in-band on `ExecuteResponse`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },
}
