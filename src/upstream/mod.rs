//! Outbound HTTP to the wrapped APIs.
//!
//! # Data Flow
//! ```text
//! connector endpoint
//!     → Call (method, URL, query, payload)
//!     → client.rs (credentials, send, classify)
//!     → Ok(Reply) | Err(UpstreamError::{Transport, Decode, Status})
//! ```

pub mod client;
pub mod error;

pub use client::{Call, Credentials, Payload, Reply, UpstreamClient};
pub use error::UpstreamError;
