//! The volume modification client.
//!
//! A [`ModifyClient`] is built once, by probing the driver until it is ready
//! and resolving its [`DriverDialect`]. The dialect never changes afterwards,
//! so the client can be shared (e.g. in an `Arc`) and used by many tasks at
//! once without locking.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::collections::HashMap;
//! use libvolmod::{ClientConfig, ModificationRequest, ModifyClient};
//!
//! let client = ModifyClient::connect(&ClientConfig::new("unix:///csi/csi.sock")).await?;
//! client.supports_volume_modification().await?;
//! client
//!     .modify(&ModificationRequest::new(
//!         "vol-0123",
//!         HashMap::from([("iops".to_owned(), "3000".to_owned())]),
//!     ))
//!     .await?;
//! client.close();
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::capability;
use crate::config::ClientConfig;
use crate::dispatch::dispatch;
use crate::driver::{DriverRpc, GrpcDriver};
use crate::error::{ClientError, ModificationError, ResolutionError};
use crate::transport::{self, ConnectionLossHandler, ExitOnConnectionLoss};
use crate::types::{DriverDialect, ModificationRequest, ModificationSupport, VolumeId};

/// Builds a [`ModifyClient`] over gRPC.
pub struct Connector {
    config: ClientConfig,
    on_loss: Arc<dyn ConnectionLossHandler>,
    cancel: CancellationToken,
}

impl Connector {
    /// Connector for `config`. Losing the connection later terminates the
    /// process unless another handler is set.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            on_loss: Arc::new(ExitOnConnectionLoss),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the connection-loss handler.
    pub fn on_connection_loss(mut self, handler: impl ConnectionLossHandler + 'static) -> Self {
        self.on_loss = Arc::new(handler);
        self
    }

    /// Abort establishment when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Open the channel, wait for the driver and resolve its dialect.
    pub async fn connect(self) -> Result<ModifyClient<GrpcDriver>, ClientError> {
        let channel = transport::connect(&self.config.endpoint, self.on_loss)?;
        ModifyClient::establish(
            GrpcDriver::new(channel),
            &self.config.endpoint,
            self.config.timeout(),
            self.config.probe_interval(),
            &self.cancel,
        )
        .await
    }
}

/// Client for modifying volumes through one CSI driver.
#[derive(Debug)]
pub struct ModifyClient<D = GrpcDriver> {
    driver: D,
    endpoint: String,
    dialect: DriverDialect,
}

impl ModifyClient<GrpcDriver> {
    /// Connect with default hooks; see [`Connector`].
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        Connector::new(config.clone()).connect().await
    }
}

impl<D: DriverRpc> ModifyClient<D> {
    /// Probe `driver` until ready and resolve its dialect, all within
    /// `timeout`.
    ///
    /// On failure `driver` is dropped, releasing whatever channel it holds.
    #[instrument(skip(driver, cancel))]
    pub async fn establish(
        driver: D,
        endpoint: &str,
        timeout: Duration,
        probe_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<Self, ClientError> {
        // `None` when the timeout reaches past what `Instant` can represent.
        let deadline = Instant::now().checked_add(timeout);
        transport::probe_until_ready(&driver, endpoint, timeout, probe_interval, cancel).await?;

        let dialect = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, capability::resolve(&driver))
                .await
                .unwrap_or_else(|_| {
                    Err(ResolutionError::from(tonic::Status::deadline_exceeded(
                        "controller capability query did not finish before the connect timeout",
                    )))
                })?,
            None => capability::resolve(&driver).await?,
        };

        info!(%endpoint, %dialect, "connected to CSI driver");
        Ok(Self {
            driver,
            endpoint: endpoint.to_owned(),
            dialect,
        })
    }

    /// Dialect every modification is sent with.
    pub fn dialect(&self) -> DriverDialect {
        self.dialect
    }

    /// Endpoint this client is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The driver's name, from `Identity/GetPluginInfo`.
    pub async fn driver_name(&self) -> Result<String, tonic::Status> {
        Ok(self.driver.get_plugin_info().await?.name)
    }

    /// `Ok(())` if the driver can modify volumes.
    ///
    /// Standardized drivers pass without a call. Otherwise the legacy service
    /// is probed and its failure, `Unimplemented` included, is returned.
    pub async fn supports_volume_modification(&self) -> Result<(), ModificationError> {
        if self.dialect == DriverDialect::Standardized {
            return Ok(());
        }
        self.driver
            .get_modification_capability()
            .await
            .map(drop)
            .map_err(ModificationError::CapabilityProbe)
    }

    /// Like [`Self::supports_volume_modification`], but reports a driver
    /// implementing neither dialect as [`ModificationSupport::Unsupported`].
    pub async fn modification_support(&self) -> Result<ModificationSupport, ModificationError> {
        match self.dialect {
            DriverDialect::Standardized => Ok(ModificationSupport::Standardized),
            DriverDialect::Legacy => capability::legacy_support(&self.driver).await,
        }
    }

    /// Modify one volume using the resolved dialect.
    pub async fn modify(&self, request: &ModificationRequest) -> Result<(), ModificationError> {
        dispatch(&self.driver, self.dialect, request).await
    }

    /// Convenience form of [`Self::modify`] for borrowed maps.
    pub async fn modify_volume(
        &self,
        volume_id: &str,
        parameters: &HashMap<String, String>,
        context: &HashMap<String, String>,
    ) -> Result<(), ModificationError> {
        let request = ModificationRequest {
            volume_id: VolumeId::from(volume_id),
            parameters: parameters.clone(),
            context: context.clone(),
        };
        self.modify(&request).await
    }

    /// Release the channel to the driver.
    pub fn close(self) {
        debug!(endpoint = %self.endpoint, "closing CSI driver connection");
        drop(self.driver);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::error::ConnectionError;
    use crate::testing::{Call, StubDriver, init_logger};

    const TIMEOUT: Duration = Duration::from_secs(5);
    const INTERVAL: Duration = Duration::from_millis(100);

    async fn client(driver: StubDriver) -> ModifyClient<StubDriver> {
        ModifyClient::establish(driver, "stub", TIMEOUT, INTERVAL, &CancellationToken::new())
            .await
            .unwrap()
    }

    fn iops() -> HashMap<String, String> {
        HashMap::from([("iops".to_owned(), "3000".to_owned())])
    }

    #[tokio::test]
    async fn standardized_driver_gets_standardized_call_only() {
        init_logger();
        let driver = StubDriver::standardized();
        let recorder = driver.recorder();
        let client = client(driver).await;
        assert_eq!(client.dialect(), DriverDialect::Standardized);

        client
            .modify_volume("vol-1", &iops(), &HashMap::new())
            .await
            .unwrap();

        let modifies: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter(|c| c.is_modification())
            .collect();
        assert_eq!(modifies.len(), 1);
        match &modifies[0] {
            Call::ControllerModifyVolume(req) => {
                assert_eq!(req.volume_id, "vol-1");
                assert_eq!(req.mutable_parameters, iops());
                assert!(req.secrets.is_empty());
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn legacy_driver_gets_legacy_call_only() {
        let driver = StubDriver::legacy();
        let recorder = driver.recorder();
        let client = client(driver).await;
        assert_eq!(client.dialect(), DriverDialect::Legacy);

        client
            .modify_volume("vol-1", &iops(), &HashMap::new())
            .await
            .unwrap();

        let modifies: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter(|c| c.is_modification())
            .collect();
        assert_eq!(modifies.len(), 1);
        match &modifies[0] {
            Call::ModifyVolumeProperties(req) => {
                assert_eq!(req.name, "vol-1");
                assert_eq!(req.parameters, iops());
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dialect_is_resolved_once_under_concurrent_modifies() {
        let driver = StubDriver::legacy();
        let recorder = driver.recorder();
        let client = Arc::new(client(driver).await);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    client
                        .modify_volume(&format!("vol-{i}"), &iops(), &HashMap::new())
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(recorder.count(|c| matches!(c, Call::ControllerGetCapabilities)), 1);
        assert_eq!(recorder.count(|c| matches!(c, Call::ModifyVolumeProperties(_))), 16);
        assert_eq!(recorder.count(|c| matches!(c, Call::ControllerModifyVolume(_))), 0);
    }

    #[tokio::test]
    async fn standardized_failure_is_not_retried_on_legacy() {
        let status = tonic::Status::invalid_argument("unknown parameter iops");
        let driver = StubDriver::standardized().modify_error(status);
        let recorder = driver.recorder();
        let client = client(driver).await;

        let err = client
            .modify_volume("vol-1", &iops(), &HashMap::new())
            .await
            .unwrap_err();
        let status = err.into_status().unwrap();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "unknown parameter iops");
        assert_eq!(recorder.count(|c| c.is_modification()), 1);
    }

    #[tokio::test]
    async fn supports_volume_modification_skips_probe_for_standardized() {
        let driver = StubDriver::standardized();
        let recorder = driver.recorder();
        let client = client(driver).await;

        client.supports_volume_modification().await.unwrap();
        assert_eq!(
            client.modification_support().await.unwrap(),
            ModificationSupport::Standardized
        );
        assert_eq!(
            recorder.count(|c| matches!(c, Call::GetModificationCapability)),
            0
        );
    }

    #[tokio::test]
    async fn supports_volume_modification_probes_legacy_lazily() {
        let driver = StubDriver::legacy();
        let recorder = driver.recorder();
        let client = client(driver).await;
        assert_eq!(
            recorder.count(|c| matches!(c, Call::GetModificationCapability)),
            0
        );

        client.supports_volume_modification().await.unwrap();
        assert_eq!(
            client.modification_support().await.unwrap(),
            ModificationSupport::Legacy
        );
        assert_eq!(
            recorder.count(|c| matches!(c, Call::GetModificationCapability)),
            2
        );
    }

    #[tokio::test]
    async fn driver_without_either_dialect() {
        let client = client(StubDriver::unsupported()).await;

        let err = client.supports_volume_modification().await.unwrap_err();
        assert_eq!(err.status().unwrap().code(), tonic::Code::Unimplemented);
        assert_eq!(
            client.modification_support().await.unwrap(),
            ModificationSupport::Unsupported
        );
    }

    #[tokio::test]
    async fn driver_name_comes_from_plugin_info() {
        let client = client(StubDriver::standardized().with_name("ebs.csi.aws.com")).await;
        assert_eq!(client.driver_name().await.unwrap(), "ebs.csi.aws.com");
        assert_eq!(client.endpoint(), "stub");
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_driver_fails_and_is_released() {
        let driver = StubDriver::standardized().never_ready();
        let dropped = driver.dropped_flag();
        let recorder = driver.recorder();

        let err = ModifyClient::establish(
            driver,
            "stub",
            Duration::from_secs(2),
            INTERVAL,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Connection(ConnectionError::NotReady { .. })
        ));
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(recorder.count(|c| matches!(c, Call::ControllerGetCapabilities)), 0);
    }

    #[tokio::test]
    async fn capability_failure_is_a_resolution_error() {
        let driver =
            StubDriver::standardized().capabilities_error(tonic::Status::internal("boom"));
        let err = ModifyClient::establish(
            driver,
            "stub",
            TIMEOUT,
            INTERVAL,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        match err {
            ClientError::Resolution(e) => assert_eq!(e.status.code(), tonic::Code::Internal),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unbounded_timeout_is_accepted() {
        let config = ClientConfig {
            timeout_secs: u64::MAX,
            ..ClientConfig::default()
        };
        let client = ModifyClient::establish(
            StubDriver::legacy().not_ready_for(1),
            "stub",
            config.timeout(),
            Duration::from_millis(10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(client.dialect(), DriverDialect::Legacy);
    }

    #[tokio::test]
    async fn close_releases_driver() {
        let driver = StubDriver::standardized();
        let dropped = driver.dropped_flag();
        let client = client(driver).await;
        assert!(!dropped.load(Ordering::SeqCst));
        client.close();
        assert!(dropped.load(Ordering::SeqCst));
    }
}
