//! Data models
//!
//! Shared between floor-server, floor-client and floor-engine (via API).
//! All IDs are `i64`.

pub mod dining_table;
pub mod floor;
pub mod order;

// Re-exports
pub use dining_table::*;
pub use floor::*;
pub use order::*;
