mod command;
mod inbound;

pub use command::Command;
pub use inbound::{Alert, CardSwipe, DebugNote, DeviceCommand, Inbound, Telemetry};
