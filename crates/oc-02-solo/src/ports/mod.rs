//! Ports module for Solo Sequencing
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::{Chain, Consenter};
pub use outbound::{BlockCutter, ConfigBlockObserver, ConsenterSupport};
