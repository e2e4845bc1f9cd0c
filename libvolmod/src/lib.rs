//! # libvolmod — CSI volume modification client for RK8s
//!
//! `libvolmod` lets a storage sidecar change the mutable properties of a
//! volume through a remote [CSI][csi] driver without knowing up front which
//! RPC dialect the driver speaks:
//!
//! * the standardized `Controller/ControllerModifyVolume` call, advertised
//!   through the `MODIFY_VOLUME` controller capability, or
//! * the older out-of-tree `modify.v1alpha1.Modify/ModifyVolumeProperties`
//!   call.
//!
//! The dialect is resolved once, when the [`ModifyClient`] is built, and every
//! modification afterwards is routed to that dialect only.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | `VolumeId`, `ModificationRequest`, dialect enums. |
//! | [`error`] | Connection, resolution, modification and config errors. |
//! | [`config`] | [`ClientConfig`] loaded from YAML or the environment. |
//! | [`proto`] | Checked-in prost/tonic bindings for the two dialects. |
//! | [`driver`] | [`DriverRpc`] trait and its gRPC implementation. |
//! | [`transport`] | Endpoint parsing, connector, connection-loss hook, readiness probe. |
//! | [`capability`] | Dialect resolution and the lazy legacy probe. |
//! | [`dispatch`] | Routes one modification to the resolved dialect. |
//! | [`client`] | [`ModifyClient`] and its [`Connector`]. |
//!
//! [csi]: https://github.com/container-storage-interface/spec

pub mod capability;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod proto;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the most commonly used items at crate root for convenience.
pub use client::{Connector, ModifyClient};
pub use config::ClientConfig;
pub use driver::{DriverRpc, GrpcDriver};
pub use error::{ClientError, ConfigError, ConnectionError, ModificationError, ResolutionError};
pub use transport::{ConnectionLossHandler, ExitOnConnectionLoss, ReconnectOnConnectionLoss};
pub use types::*;
