//! Application layer: the channel processors

pub mod standard_channel;
pub mod system_channel;

pub use standard_channel::StandardChannel;
pub use system_channel::SystemChannel;
