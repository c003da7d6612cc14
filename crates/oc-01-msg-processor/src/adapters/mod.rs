//! Adapters layer for message processing.
//!
//! In-memory implementations of the outbound ports, used by the node and
//! by integration tests.

pub mod config_manager;
pub mod resources;
pub mod template;

pub use config_manager::InMemoryConfigManager;
pub use resources::ChannelResources;
pub use template::{validate_channel_id, ChannelTemplate, MAX_CHANNEL_ID_LEN};
