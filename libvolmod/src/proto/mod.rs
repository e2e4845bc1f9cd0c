//! Protobuf bindings for the two modification dialects.
//!
//! The modules below are checked in rather than generated at build time so the
//! crate builds without `protoc`. They cover only the RPCs this crate issues:
//!
//! * [`csi`]: the `csi.v1` Identity and Controller calls used for probing,
//!   capability discovery and `ControllerModifyVolume`.
//! * [`modify`]: the out-of-tree `modify.v1alpha1.Modify` service.

#[allow(clippy::all, missing_docs)]
pub mod csi;
#[allow(clippy::all, missing_docs)]
pub mod modify;
