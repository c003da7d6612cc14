//! Application layer: chain, sequencing loop and consenter

pub mod chain;
pub mod consenter;
mod sequencer;

pub use chain::SoloChain;
pub use consenter::SoloConsenter;
