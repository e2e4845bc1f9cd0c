//! The RPC surface of a CSI driver, as seen by this crate.
//!
//! [`DriverRpc`] has one method per RPC the client issues. [`GrpcDriver`]
//! implements it over a tonic [`Channel`]; tests implement it with in-memory
//! stubs.

use async_trait::async_trait;
use tonic::transport::Channel;

use crate::proto::csi::controller_client::ControllerClient;
use crate::proto::csi::identity_client::IdentityClient;
use crate::proto::csi::{
    ControllerGetCapabilitiesRequest, ControllerGetCapabilitiesResponse,
    ControllerModifyVolumeRequest, ControllerModifyVolumeResponse, GetPluginInfoRequest,
    GetPluginInfoResponse, ProbeRequest, ProbeResponse,
};
use crate::proto::modify::modify_client::ModifyClient as LegacyModifyClient;
use crate::proto::modify::{
    GetCsiDriverModificationCapabilityRequest, GetCsiDriverModificationCapabilityResponse,
    ModifyVolumePropertiesRequest, ModifyVolumePropertiesResponse,
};

/// RPCs a CSI driver is asked to serve.
///
/// Every method maps to exactly one unary call and returns the driver's
/// [`tonic::Status`] untouched on failure.
#[async_trait]
pub trait DriverRpc: Send + Sync {
    /// `csi.v1.Identity/Probe`.
    async fn probe(&self) -> Result<ProbeResponse, tonic::Status>;

    /// `csi.v1.Identity/GetPluginInfo`.
    async fn get_plugin_info(&self) -> Result<GetPluginInfoResponse, tonic::Status>;

    /// `csi.v1.Controller/ControllerGetCapabilities`.
    async fn controller_get_capabilities(
        &self,
    ) -> Result<ControllerGetCapabilitiesResponse, tonic::Status>;

    /// `csi.v1.Controller/ControllerModifyVolume`.
    async fn controller_modify_volume(
        &self,
        req: ControllerModifyVolumeRequest,
    ) -> Result<ControllerModifyVolumeResponse, tonic::Status>;

    /// `modify.v1alpha1.Modify/GetCSIDriverModificationCapability`.
    async fn get_modification_capability(
        &self,
    ) -> Result<GetCsiDriverModificationCapabilityResponse, tonic::Status>;

    /// `modify.v1alpha1.Modify/ModifyVolumeProperties`.
    async fn modify_volume_properties(
        &self,
        req: ModifyVolumePropertiesRequest,
    ) -> Result<ModifyVolumePropertiesResponse, tonic::Status>;
}

/// [`DriverRpc`] over a single shared gRPC channel.
///
/// Cloning the channel is cheap and every clone multiplexes onto the same
/// HTTP/2 connection, so concurrent calls need no extra coordination.
#[derive(Debug, Clone)]
pub struct GrpcDriver {
    channel: Channel,
}

impl GrpcDriver {
    /// Wrap an existing channel.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl DriverRpc for GrpcDriver {
    async fn probe(&self) -> Result<ProbeResponse, tonic::Status> {
        let mut client = IdentityClient::new(self.channel.clone());
        Ok(client.probe(ProbeRequest {}).await?.into_inner())
    }

    async fn get_plugin_info(&self) -> Result<GetPluginInfoResponse, tonic::Status> {
        let mut client = IdentityClient::new(self.channel.clone());
        Ok(client.get_plugin_info(GetPluginInfoRequest {}).await?.into_inner())
    }

    async fn controller_get_capabilities(
        &self,
    ) -> Result<ControllerGetCapabilitiesResponse, tonic::Status> {
        let mut client = ControllerClient::new(self.channel.clone());
        Ok(client
            .controller_get_capabilities(ControllerGetCapabilitiesRequest {})
            .await?
            .into_inner())
    }

    async fn controller_modify_volume(
        &self,
        req: ControllerModifyVolumeRequest,
    ) -> Result<ControllerModifyVolumeResponse, tonic::Status> {
        let mut client = ControllerClient::new(self.channel.clone());
        Ok(client.controller_modify_volume(req).await?.into_inner())
    }

    async fn get_modification_capability(
        &self,
    ) -> Result<GetCsiDriverModificationCapabilityResponse, tonic::Status> {
        let mut client = LegacyModifyClient::new(self.channel.clone());
        Ok(client
            .get_csi_driver_modification_capability(GetCsiDriverModificationCapabilityRequest {})
            .await?
            .into_inner())
    }

    async fn modify_volume_properties(
        &self,
        req: ModifyVolumePropertiesRequest,
    ) -> Result<ModifyVolumePropertiesResponse, tonic::Status> {
        let mut client = LegacyModifyClient::new(self.channel.clone());
        Ok(client.modify_volume_properties(req).await?.into_inner())
    }
}
