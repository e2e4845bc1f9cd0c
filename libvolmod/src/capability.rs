//! Which modification dialect does the driver speak?
//!
//! [`resolve`] reads the controller capabilities once and picks
//! [`DriverDialect::Standardized`] when `MODIFY_VOLUME` is advertised, and
//! [`DriverDialect::Legacy`] otherwise. Capability advertisement says nothing
//! about the out-of-tree service, so whether a legacy driver really implements
//! it is only checked on demand by [`legacy_support`].

use tracing::{debug, instrument};

use crate::driver::DriverRpc;
use crate::error::{ModificationError, ResolutionError};
use crate::proto::csi::ControllerServiceCapability;
use crate::proto::csi::controller_service_capability::{Type as CapabilityType, rpc};
use crate::types::{DriverDialect, ModificationSupport};

/// Query the controller capabilities and pick the dialect.
#[instrument(skip(driver))]
pub async fn resolve<D>(driver: &D) -> Result<DriverDialect, ResolutionError>
where
    D: DriverRpc + ?Sized,
{
    let resp = driver.controller_get_capabilities().await?;
    let dialect = if advertises_modify_volume(&resp.capabilities) {
        DriverDialect::Standardized
    } else {
        DriverDialect::Legacy
    };
    debug!(%dialect, capabilities = resp.capabilities.len(), "resolved modification dialect");
    Ok(dialect)
}

fn advertises_modify_volume(capabilities: &[ControllerServiceCapability]) -> bool {
    capabilities.iter().any(|cap| {
        let Some(CapabilityType::Rpc(entry)) = &cap.r#type else {
            return false;
        };
        matches!(rpc::Type::try_from(entry.r#type), Ok(rpc::Type::ModifyVolume))
    })
}

/// Ask the legacy `Modify` service whether it is there.
///
/// `Unimplemented` means the driver supports neither dialect; any other
/// failure is returned as is.
#[instrument(skip(driver))]
pub async fn legacy_support<D>(driver: &D) -> Result<ModificationSupport, ModificationError>
where
    D: DriverRpc + ?Sized,
{
    match driver.get_modification_capability().await {
        Ok(_) => Ok(ModificationSupport::Legacy),
        Err(status) if status.code() == tonic::Code::Unimplemented => {
            debug!(%status, "driver does not implement the legacy modify service");
            Ok(ModificationSupport::Unsupported)
        }
        Err(status) => Err(ModificationError::CapabilityProbe(status)),
    }
}
