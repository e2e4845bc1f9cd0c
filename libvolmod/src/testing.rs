//! In-memory [`DriverRpc`] stub and test helpers.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::driver::DriverRpc;
use crate::proto::csi::controller_service_capability::{Rpc, Type as CapabilityType, rpc};
use crate::proto::csi::{
    ControllerGetCapabilitiesResponse, ControllerModifyVolumeRequest,
    ControllerModifyVolumeResponse, ControllerServiceCapability, GetPluginInfoResponse,
    ProbeResponse,
};
use crate::proto::modify::{
    GetCsiDriverModificationCapabilityResponse, ModifyVolumePropertiesRequest,
    ModifyVolumePropertiesResponse,
};

/// Install a test subscriber once; honours `RUST_LOG`.
pub(crate) fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One RPC observed by the stub.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetPluginInfo,
    ControllerGetCapabilities,
    ControllerModifyVolume(ControllerModifyVolumeRequest),
    GetModificationCapability,
    ModifyVolumeProperties(ModifyVolumePropertiesRequest),
}

impl Call {
    pub(crate) fn is_modification(&self) -> bool {
        matches!(
            self,
            Self::ControllerModifyVolume(_) | Self::ModifyVolumeProperties(_)
        )
    }
}

/// Calls observed by a [`StubDriver`], shareable after the stub is moved.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

/// A status to hand back, rebuilt on every use.
#[derive(Debug, Clone)]
struct Failure {
    code: tonic::Code,
    message: String,
}

impl Failure {
    fn from_status(status: &tonic::Status) -> Self {
        Self {
            code: status.code(),
            message: status.message().to_owned(),
        }
    }

    fn status(&self) -> tonic::Status {
        tonic::Status::new(self.code, self.message.clone())
    }
}

#[derive(Debug, Clone)]
enum ProbeBehaviour {
    /// Answer `ready = false` this many times, then ready.
    NotReadyFor(usize),
    /// Fail this many times, then ready.
    ErrorFor(usize, Failure),
    Never,
}

/// Scriptable driver double.
#[derive(Debug)]
pub(crate) struct StubDriver {
    name: String,
    advertise_modify: bool,
    legacy_probe: Option<Failure>,
    probe: ProbeBehaviour,
    capabilities_error: Option<Failure>,
    modify_error: Option<Failure>,
    probes: AtomicUsize,
    recorder: Arc<Recorder>,
    dropped: Arc<AtomicBool>,
}

impl StubDriver {
    fn base(advertise_modify: bool, legacy_probe: Option<Failure>) -> Self {
        Self {
            name: "stub.csi.rk8s.io".to_owned(),
            advertise_modify,
            legacy_probe,
            probe: ProbeBehaviour::NotReadyFor(0),
            capabilities_error: None,
            modify_error: None,
            probes: AtomicUsize::new(0),
            recorder: Arc::default(),
            dropped: Arc::default(),
        }
    }

    /// Advertises `MODIFY_VOLUME`.
    pub(crate) fn standardized() -> Self {
        Self::base(true, None)
    }

    /// No `MODIFY_VOLUME`, legacy service present.
    pub(crate) fn legacy() -> Self {
        Self::base(false, None)
    }

    /// Neither dialect.
    pub(crate) fn unsupported() -> Self {
        let unimplemented = Failure::from_status(&tonic::Status::unimplemented(
            "unknown service modify.v1alpha1.Modify",
        ));
        Self::base(false, Some(unimplemented))
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub(crate) fn not_ready_for(mut self, probes: usize) -> Self {
        self.probe = ProbeBehaviour::NotReadyFor(probes);
        self
    }

    pub(crate) fn never_ready(mut self) -> Self {
        self.probe = ProbeBehaviour::Never;
        self
    }

    pub(crate) fn probe_error_for(mut self, probes: usize, status: tonic::Status) -> Self {
        self.probe = ProbeBehaviour::ErrorFor(probes, Failure::from_status(&status));
        self
    }

    pub(crate) fn capabilities_error(mut self, status: tonic::Status) -> Self {
        self.capabilities_error = Some(Failure::from_status(&status));
        self
    }

    pub(crate) fn modify_error(mut self, status: tonic::Status) -> Self {
        self.modify_error = Some(Failure::from_status(&status));
        self
    }

    pub(crate) fn legacy_probe_error(mut self, status: tonic::Status) -> Self {
        self.legacy_probe = Some(Failure::from_status(&status));
        self
    }

    pub(crate) fn recorder(&self) -> Arc<Recorder> {
        Arc::clone(&self.recorder)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.recorder.calls()
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Set once the stub is dropped.
    pub(crate) fn dropped_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }

    fn modify_result(&self) -> Result<(), tonic::Status> {
        self.modify_error.as_ref().map_or(Ok(()), |f| Err(f.status()))
    }
}

impl Drop for StubDriver {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DriverRpc for StubDriver {
    async fn probe(&self) -> Result<ProbeResponse, tonic::Status> {
        // Probes are counted, not recorded, so call logs stay readable.
        let seen = self.probes.fetch_add(1, Ordering::SeqCst);
        match &self.probe {
            ProbeBehaviour::NotReadyFor(n) => Ok(ProbeResponse {
                ready: Some(seen >= *n),
            }),
            ProbeBehaviour::ErrorFor(n, failure) if seen < *n => Err(failure.status()),
            ProbeBehaviour::ErrorFor(..) => Ok(ProbeResponse { ready: None }),
            ProbeBehaviour::Never => Ok(ProbeResponse { ready: Some(false) }),
        }
    }

    async fn get_plugin_info(&self) -> Result<GetPluginInfoResponse, tonic::Status> {
        self.recorder.push(Call::GetPluginInfo);
        Ok(GetPluginInfoResponse {
            name: self.name.clone(),
            vendor_version: "0.1.0".to_owned(),
            manifest: Default::default(),
        })
    }

    async fn controller_get_capabilities(
        &self,
    ) -> Result<ControllerGetCapabilitiesResponse, tonic::Status> {
        self.recorder.push(Call::ControllerGetCapabilities);
        if let Some(failure) = &self.capabilities_error {
            return Err(failure.status());
        }
        let mut types = vec![rpc::Type::CreateDeleteVolume, rpc::Type::ExpandVolume];
        if self.advertise_modify {
            types.push(rpc::Type::ModifyVolume);
        }
        Ok(ControllerGetCapabilitiesResponse {
            capabilities: types
                .into_iter()
                .map(|t| ControllerServiceCapability {
                    r#type: Some(CapabilityType::Rpc(Rpc { r#type: t as i32 })),
                })
                .collect(),
        })
    }

    async fn controller_modify_volume(
        &self,
        req: ControllerModifyVolumeRequest,
    ) -> Result<ControllerModifyVolumeResponse, tonic::Status> {
        self.recorder.push(Call::ControllerModifyVolume(req));
        self.modify_result().map(|()| ControllerModifyVolumeResponse {})
    }

    async fn get_modification_capability(
        &self,
    ) -> Result<GetCsiDriverModificationCapabilityResponse, tonic::Status> {
        self.recorder.push(Call::GetModificationCapability);
        match &self.legacy_probe {
            Some(failure) => Err(failure.status()),
            None => Ok(GetCsiDriverModificationCapabilityResponse {}),
        }
    }

    async fn modify_volume_properties(
        &self,
        req: ModifyVolumePropertiesRequest,
    ) -> Result<ModifyVolumePropertiesResponse, tonic::Status> {
        self.recorder.push(Call::ModifyVolumeProperties(req));
        self.modify_result().map(|()| ModifyVolumePropertiesResponse {})
    }
}
