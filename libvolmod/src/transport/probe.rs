//! Readiness probing.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::driver::DriverRpc;
use crate::error::ConnectionError;

/// Probe the driver until it reports ready.
///
/// The number of attempts is unbounded; the whole loop is bounded by
/// `timeout` and aborted as soon as `cancel` fires. `Unavailable`,
/// `DeadlineExceeded` and transport failures (a connection the driver
/// accepted and then dropped) mean the driver is not reachable yet and are
/// retried after `interval`. Any other status ends the loop.
#[instrument(skip(driver, cancel))]
pub async fn probe_until_ready<D>(
    driver: &D,
    endpoint: &str,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<(), ConnectionError>
where
    D: DriverRpc + ?Sized,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ConnectionError::Cancelled {
            endpoint: endpoint.to_owned(),
        }),
        result = tokio::time::timeout(timeout, probe_forever(driver, endpoint, interval)) => {
            result.unwrap_or_else(|_| {
                Err(ConnectionError::NotReady {
                    endpoint: endpoint.to_owned(),
                    timeout,
                })
            })
        }
    }
}

async fn probe_forever<D>(
    driver: &D,
    endpoint: &str,
    interval: Duration,
) -> Result<(), ConnectionError>
where
    D: DriverRpc + ?Sized,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match driver.probe().await {
            // An unset `ready` field means the driver does not report readiness.
            Ok(resp) if resp.ready.unwrap_or(true) => {
                info!(%endpoint, attempt, "CSI driver is ready");
                return Ok(());
            }
            Ok(_) => warn!(%endpoint, attempt, "CSI driver is not ready yet"),
            Err(status) if is_transient(&status) => {
                debug!(%endpoint, attempt, %status, "still connecting to CSI driver");
            }
            Err(status) => {
                return Err(ConnectionError::ProbeFailed {
                    endpoint: endpoint.to_owned(),
                    status,
                });
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Whether `status` means the driver could not be reached rather than that it
/// refused the probe.
///
/// hyper reports a connection dropped mid-request as `Unknown` with the I/O
/// error as its source.
fn is_transient(status: &tonic::Status) -> bool {
    match status.code() {
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded => true,
        tonic::Code::Unknown => {
            let mut source = std::error::Error::source(status);
            while let Some(err) = source {
                if err.is::<tonic::transport::Error>() || err.is::<std::io::Error>() {
                    return true;
                }
                source = err.source();
            }
            false
        }
        _ => false,
    }
}
