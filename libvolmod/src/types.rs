//! Core types: volume identity, modification requests and dialect decisions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Volume identity
// ---------------------------------------------------------------------------

/// Driver-scoped identifier of a volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VolumeId(pub String);

impl VolumeId {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty, which no driver accepts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VolumeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VolumeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A request to change the mutable properties of one volume.
///
/// The dispatcher only borrows the request; both maps are copied into the
/// wire message of whichever dialect is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRequest {
    /// Volume to modify.
    pub volume_id: VolumeId,
    /// Desired values of the mutable parameters, opaque to this crate.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    /// Request context (e.g. credentials) forwarded to the driver untouched.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ModificationRequest {
    /// Build a request with no context entries.
    pub fn new(volume_id: impl Into<VolumeId>, parameters: HashMap<String, String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            parameters,
            context: HashMap::new(),
        }
    }

    /// Attach request context entries.
    pub fn with_context(mut self, context: HashMap<String, String>) -> Self {
        self.context = context;
        self
    }
}

// ---------------------------------------------------------------------------
// Dialects
// ---------------------------------------------------------------------------

/// RPC dialect chosen for a client, fixed for the client's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverDialect {
    /// The driver advertises `MODIFY_VOLUME`; use `ControllerModifyVolume`.
    Standardized,
    /// No `MODIFY_VOLUME` advertisement; use `ModifyVolumeProperties`.
    Legacy,
}

impl fmt::Display for DriverDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standardized => f.write_str("standardized"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

/// Answer to "can this driver modify volumes at all, and how?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationSupport {
    /// `ControllerModifyVolume` is advertised.
    Standardized,
    /// The legacy `Modify` service answered its capability probe.
    Legacy,
    /// Neither dialect is implemented by the driver.
    Unsupported,
}

impl fmt::Display for ModificationSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standardized => f.write_str("standardized"),
            Self::Legacy => f.write_str("legacy"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}
