//! WhatsApp Business Cloud API Client
//!
//! HTTP client binding for the WhatsApp Business Cloud API:
//! - Route construction against the versioned Graph API base
//! - Bearer authentication with credential validation on `start`
//! - JSON, form and multipart payload encoding (media upload)
//! - Typed mapping of HTTP status codes to an error taxonomy
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use whatsapp_client::{WhatsappClient, WhatsappConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = WhatsappClient::new(WhatsappConfig::default());
//!
//!     // Validates the credentials and returns the business profile
//!     let profile = client.start("105954558954427", "EAAG...").await?;
//!     println!("profile: {}", profile);
//!
//!     let response = client
//!         .send_message(&serde_json::json!({
//!             "to": "5511999999999",
//!             "type": "text",
//!             "text": {"body": "Hello, WhatsApp!"},
//!         }))
//!         .await?;
//!     println!("sent: {}", response);
//!     Ok(())
//! }
//! ```
//!
//! The client performs exactly one HTTP exchange per call: no retries, no
//! rate-limit handling, no caching. Callers own those policies.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod client;
pub mod config;
pub mod errors;
pub mod routes;
pub mod types;

// Tests
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use client::{Payload, RequestOptions, WhatsappClient};
pub use config::{ProxyConfig, WhatsappConfig, WhatsappConfigBuilder};
pub use errors::{WhatsappError, WhatsappResult};
pub use routes::Route;
pub use types::{MediaUpload, ResponseBody};

/// Version of the Graph API this client targets
pub const API_VERSION: u32 = 15;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
