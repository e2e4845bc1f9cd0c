//! Routing of a single modification to the resolved dialect.
//!
//! Exactly one RPC is issued per request. A failure is returned with the
//! driver's status untouched and is never retried against the other dialect.

use tracing::{info, instrument};

use crate::driver::DriverRpc;
use crate::error::ModificationError;
use crate::proto::csi::ControllerModifyVolumeRequest;
use crate::proto::modify::ModifyVolumePropertiesRequest;
use crate::types::{DriverDialect, ModificationRequest};

/// Issue `request` to `driver` using `dialect`.
#[instrument(skip(driver, request), fields(volume_id = %request.volume_id))]
pub async fn dispatch<D>(
    driver: &D,
    dialect: DriverDialect,
    request: &ModificationRequest,
) -> Result<(), ModificationError>
where
    D: DriverRpc + ?Sized,
{
    if request.volume_id.is_empty() {
        return Err(ModificationError::InvalidRequest(
            "volume id must not be empty".to_owned(),
        ));
    }

    let result = match dialect {
        DriverDialect::Standardized => driver
            .controller_modify_volume(ControllerModifyVolumeRequest {
                volume_id: request.volume_id.0.clone(),
                secrets: request.context.clone(),
                mutable_parameters: request.parameters.clone(),
            })
            .await
            .map(drop),
        DriverDialect::Legacy => driver
            .modify_volume_properties(ModifyVolumePropertiesRequest {
                name: request.volume_id.0.clone(),
                parameters: request.parameters.clone(),
                context: request.context.clone(),
            })
            .await
            .map(drop),
    };

    match result {
        Ok(()) => {
            info!(volume_id = %request.volume_id, %dialect, "volume modification completed");
            Ok(())
        }
        Err(status) => Err(ModificationError::Remote {
            volume_id: request.volume_id.clone(),
            dialect,
            status,
        }),
    }
}
