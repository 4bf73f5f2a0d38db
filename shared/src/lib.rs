//! Shared types for the floor-plan workspace
//!
//! Wire models and the unified error system used by floor-server,
//! floor-client and floor-engine.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
