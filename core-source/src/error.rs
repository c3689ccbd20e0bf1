//! # Source Node Error Types
//!
//! Error types for the media source node.
//!
//! Public node operations never return these directly: per the error contract,
//! failures during binding or playback collapse into the terminal error state
//! and surface as an `error` notification plus a log record. `SourceError` is
//! the internal currency of the bind pipeline and of construction-time
//! validation.

use bridge_media::{BridgeError, MediaFault};
use thiserror::Error;

/// Errors that can occur while binding or driving a media source.
#[derive(Error, Debug)]
pub enum SourceError {
    // ========================================================================
    // Acquisition Failures
    // ========================================================================
    /// The element pool or factory could not supply a backing element.
    #[error("Media element acquisition failed: {0}")]
    Acquisition(#[from] BridgeError),

    /// No element source (pool or factory) is configured.
    #[error("No media element source: {0}")]
    ElementUnavailable(String),

    /// The streaming backend binding could not be created or initialized.
    #[error("Streaming backend setup failed: {0}")]
    BackendSetup(String),

    // ========================================================================
    // Runtime Faults
    // ========================================================================
    /// A bound element raised a fault after a successful bind.
    #[error("Media element fault: {0}")]
    ElementFault(MediaFault),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A required collaborator was not provided at construction.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// Configuration values failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SourceError {
    /// Returns `true` if no backing resource could be obtained or bound.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            SourceError::Acquisition(_)
                | SourceError::ElementUnavailable(_)
                | SourceError::BackendSetup(_)
        )
    }

    /// Returns `true` if a bound resource failed after a successful bind.
    pub fn is_runtime_fault(&self) -> bool {
        matches!(self, SourceError::ElementFault(_))
    }

    /// Returns `true` if the error was raised before any resource was touched.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SourceError::CapabilityMissing { .. } | SourceError::InvalidConfig(_)
        )
    }
}

/// Result type for source node operations.
pub type Result<T> = std::result::Result<T, SourceError>;
