//! Ports module for Message Processing
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::Processor;
pub use outbound::{ConfigManager, StandardChannelSupport, SystemChannelSupport};
