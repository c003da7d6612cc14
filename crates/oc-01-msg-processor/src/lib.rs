//! # Message Processing
//!
//! Classifies and validates every message submitted for ordering, and turns
//! config updates into signed CONFIG messages.
//!
//! ## Processors
//!
//! | Processor | Channel | Unknown target channel |
//! |-----------|---------|------------------------|
//! | `StandardChannel` | an existing channel | never checked |
//! | `SystemChannel` | the system channel | normal: `ChannelNotFound`, config update: channel creation |
//!
//! ## Classification
//!
//! | Header type | Class |
//! |-------------|-------|
//! | `CONFIG_UPDATE`, `CONFIG`, `ORDERER_TRANSACTION` | `ConfigUpdateMsg` |
//! | `ENDORSER_TRANSACTION`, `MESSAGE`, `PEER_RESOURCE_UPDATE` | `NormalMsg` |
//! | anything else | `MalformedMessage` |
//!
//! CONFIG and ORDERER_TRANSACTION are what config-update processing
//! produces; classing them as config keeps them in blocks of their own once
//! they reach a sequencing chain.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/    - InMemoryConfigManager, ChannelResources, ChannelTemplate
//! application/ - StandardChannel, SystemChannel
//! ports/       - Processor (inbound), *Support + ConfigManager (outbound)
//! domain/      - Classification, rule filters, ProcessorError
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{ChannelResources, ChannelTemplate, InMemoryConfigManager};
pub use application::{StandardChannel, SystemChannel};
pub use config::ProcessorConfig;
pub use domain::{classify, Classification, ProcessorError, Rule, RuleSet};
pub use ports::{ConfigManager, Processor, StandardChannelSupport, SystemChannelSupport};
