//! gRPC transport to the CSI driver.
//!
//! This module turns an endpoint string into a live [`tonic`] channel and
//! waits for the driver behind it to report ready:
//!
//! * [`address`]: endpoint parsing (Unix domain sockets and TCP).
//! * [`loss`]: the hook invoked when an established connection drops.
//! * [`channel`]: lazy channel over a dialer that reports connection loss.
//! * [`probe`]: the `Identity/Probe` readiness loop.

pub mod address;
pub mod channel;
pub mod loss;
pub mod probe;

pub use address::DriverAddress;
pub use channel::connect;
pub use loss::{ConnectionLossHandler, ExitOnConnectionLoss, ReconnectOnConnectionLoss};
pub use probe::probe_until_ready;
