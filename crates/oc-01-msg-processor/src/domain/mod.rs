//! Domain module for Message Processing
//!
//! Contains classification, rule filters and errors.

pub mod classification;
pub mod errors;
pub mod filters;

pub use classification::*;
pub use errors::*;
pub use filters::*;
