//! Floor Client - HTTP client for the floor server
//!
//! [`HttpClient`] wraps the REST API and implements
//! [`floor_engine::TableStore`], so a [`floor_engine::FloorSession`] can run
//! directly against a remote server.
//!
//! ```no_run
//! use floor_client::{ClientConfig, HttpClient};
//! use floor_engine::{FloorSession, LayoutConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientConfig::new("http://localhost:9625"))?;
//! let mut session = FloorSession::new(client, LayoutConfig::default());
//! session.load().await?;
//! session.set_canvas(1280.0, 800.0);
//! session.join(&[1, 2]).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
