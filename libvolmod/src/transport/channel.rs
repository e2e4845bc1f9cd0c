//! Lazy gRPC channel to the driver.

use std::sync::Arc;

use hyper_util::rt::TokioIo;
use tokio::net::{TcpStream, UnixStream};
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::debug;

use super::address::DriverAddress;
use super::loss::{ConnectionLossHandler, DialGuard};
use crate::error::ConnectionError;

/// Open a channel to `endpoint`.
///
/// Only the endpoint is validated here; the first dial happens on the first
/// RPC, normally the readiness probe. Every later redial goes through
/// `on_loss` once the channel has been connected.
pub fn connect(
    endpoint: &str,
    on_loss: Arc<dyn ConnectionLossHandler>,
) -> Result<Channel, ConnectionError> {
    let address = DriverAddress::parse(endpoint)?;
    let grpc_endpoint =
        Endpoint::from_shared(address.uri()).map_err(|e| ConnectionError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
    let guard = Arc::new(DialGuard::new(address.to_string(), on_loss));

    let channel = match address {
        DriverAddress::Unix(path) => {
            grpc_endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| {
                let guard = Arc::clone(&guard);
                let path = path.clone();
                async move {
                    guard.before_dial()?;
                    debug!(path = %path.display(), "dialing CSI driver");
                    let stream = UnixStream::connect(&path).await?;
                    guard.dialed();
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }
            }))
        }
        DriverAddress::Tcp(host_port) => {
            grpc_endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| {
                let guard = Arc::clone(&guard);
                let host_port = host_port.clone();
                async move {
                    guard.before_dial()?;
                    debug!(%host_port, "dialing CSI driver");
                    let stream = TcpStream::connect(host_port.as_str()).await?;
                    stream.set_nodelay(true)?;
                    guard.dialed();
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }
            }))
        }
    };
    Ok(channel)
}
