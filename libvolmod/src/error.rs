//! Error types.
//!
//! Each stage of the client has its own error enum, all deriving
//! [`thiserror::Error`]:
//!
//! * [`ConnectionError`]: the channel could not be opened, or the driver never
//!   became ready in time.
//! * [`ResolutionError`]: the controller capability query failed.
//! * [`ModificationError`]: a modification failed; remote failures carry the
//!   driver's [`tonic::Status`] verbatim.
//! * [`ConfigError`]: client configuration could not be loaded.
//!
//! [`ClientError`] joins the construction-time errors.

use std::time::Duration;

use thiserror::Error;

use crate::types::{DriverDialect, VolumeId};

/// Failure to open a channel to the driver or to see it become ready.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The endpoint string cannot be turned into a channel.
    #[error("invalid CSI endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as supplied by the caller.
        endpoint: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The readiness probe returned a non-retryable status.
    #[error("probing CSI driver at {endpoint} failed: {status}")]
    ProbeFailed {
        /// Driver endpoint.
        endpoint: String,
        /// Status returned by `Identity/Probe`.
        #[source]
        status: tonic::Status,
    },

    /// The driver did not report ready before the establishment timeout.
    #[error("CSI driver at {endpoint} not ready after {timeout:?}")]
    NotReady {
        /// Driver endpoint.
        endpoint: String,
        /// Establishment timeout that elapsed.
        timeout: Duration,
    },

    /// Establishment was cancelled by the caller.
    #[error("connecting to CSI driver at {endpoint} was cancelled")]
    Cancelled {
        /// Driver endpoint.
        endpoint: String,
    },
}

/// Failure to determine which modification dialect the driver speaks.
#[derive(Debug, Error)]
#[error("failed getting controller capabilities: {status}")]
pub struct ResolutionError {
    /// Status returned by (or synthesized for) `ControllerGetCapabilities`.
    #[source]
    pub status: tonic::Status,
}

impl From<tonic::Status> for ResolutionError {
    fn from(status: tonic::Status) -> Self {
        Self { status }
    }
}

/// Failure of a single modification or of the legacy capability probe.
#[derive(Debug, Error)]
pub enum ModificationError {
    /// The request was rejected before reaching the driver.
    #[error("invalid modification request: {0}")]
    InvalidRequest(String),

    /// The driver rejected the modification.
    #[error("modifying volume {volume_id} via {dialect} RPC failed: {status}")]
    Remote {
        /// Volume the request was issued for.
        volume_id: VolumeId,
        /// Dialect the request was issued with.
        dialect: DriverDialect,
        /// Driver status, unchanged.
        #[source]
        status: tonic::Status,
    },

    /// The legacy `GetCSIDriverModificationCapability` probe failed.
    #[error("legacy modification capability probe failed: {0}")]
    CapabilityProbe(#[source] tonic::Status),
}

impl ModificationError {
    /// The driver status behind this error, if it came from the driver.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::Remote { status, .. } | Self::CapabilityProbe(status) => Some(status),
        }
    }

    /// Consume the error and return the driver status, if any.
    pub fn into_status(self) -> Option<tonic::Status> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::Remote { status, .. } | Self::CapabilityProbe(status) => Some(status),
        }
    }
}

/// Failure to load or validate a [`crate::ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("reading config {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the config schema.
    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A field failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure to construct a [`crate::ModifyClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting to the driver failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Resolving the driver's dialect failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
