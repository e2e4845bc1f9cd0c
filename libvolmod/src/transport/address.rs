//! Driver endpoint parsing.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConnectionError;

/// Where the driver's gRPC server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverAddress {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// TCP `host:port`.
    Tcp(String),
}

impl DriverAddress {
    /// Parse an endpoint.
    ///
    /// Accepted forms are `unix:///path`, `unix:/path`, `/path`,
    /// `tcp://host:port`, `http://host:port` and `host:port`.
    pub fn parse(endpoint: &str) -> Result<Self, ConnectionError> {
        let invalid = |reason: &str| ConnectionError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(invalid("endpoint is empty"));
        }

        if let Some(path) = trimmed
            .strip_prefix("unix://")
            .or_else(|| trimmed.strip_prefix("unix:"))
        {
            if path.is_empty() {
                return Err(invalid("unix socket path is empty"));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if trimmed.starts_with('/') {
            return Ok(Self::Unix(PathBuf::from(trimmed)));
        }

        let host_port = match trimmed.split_once("://") {
            Some(("tcp" | "http", rest)) => rest.trim_end_matches('/'),
            Some((scheme, _)) => return Err(invalid(&format!("unsupported scheme {scheme:?}"))),
            None => trimmed,
        };
        let (host, port) = host_port
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;
        if host.is_empty() || host.contains('/') {
            return Err(invalid("host is empty or malformed"));
        }
        port.parse::<u16>()
            .map_err(|_| invalid(&format!("invalid port {port:?}")))?;

        Ok(Self::Tcp(host_port.to_owned()))
    }

    /// URI handed to tonic. Unix sockets are dialed by a custom connector, so
    /// their URI only needs to be well-formed.
    pub(crate) fn uri(&self) -> String {
        match self {
            Self::Unix(_) => "http://[::]:50051".to_owned(),
            Self::Tcp(host_port) => format!("http://{host_port}"),
        }
    }
}

impl fmt::Display for DriverAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(host_port) => write!(f, "tcp://{host_port}"),
        }
    }
}
