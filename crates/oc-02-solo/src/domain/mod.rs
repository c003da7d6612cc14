//! Domain module for Solo Sequencing

pub mod errors;
pub mod signal;

pub use errors::*;
pub use signal::*;
