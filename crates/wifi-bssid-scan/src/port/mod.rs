//! Port definitions for the scanning core.
//!
//! Hexagonal-architecture ports that keep the parsers and the publish loop
//! independent of process spawning and of the message transport, so that
//! host adapters and test doubles can be swapped transparently.

mod command;
mod publish;
mod scan_port;

pub use command::{CommandOutput, CommandRunner};
pub use publish::{PublishChannel, Qos};
pub use scan_port::WlanScanPort;
