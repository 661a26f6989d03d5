//! Error types for Tierline operations.
//!
//! The layout functions themselves are total and never fail on any symbol
//! set. [`LayoutError`] covers configuration validation for callers that
//! load a [`GeometryConfig`](crate::config::GeometryConfig) from outside.

use thiserror::Error;

/// The main error type for Tierline operations.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
