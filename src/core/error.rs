//! Structured error types for the fusion kernel

use thiserror::Error;

/// Unified error type for all Weft operations.
#[derive(Debug, Error)]
pub enum WeftError {
	/// Invalid configuration (bad arguments, mismatched inputs). Rejected
	/// before any computation starts; no partial results are produced.
	#[error("configuration error: {0}")]
	Config(String),

	/// I/O error (file not found, permission denied, etc.)
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Parse error (malformed dataset or artifact data)
	#[error("parse error: {0}")]
	Parse(String),

	/// Catch-all for other errors
	#[error("{0}")]
	Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WeftError>;
