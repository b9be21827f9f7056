//! Security subsystem.
//!
//! # Responsibilities
//! - Enforce the `can_access` permission on connector endpoints (API keys)
//! - Bound request body size (configured in the server layer stack)
//!
//! # Design Decisions
//! - No keys configured means open access, for deployments behind a
//!   trusted hub
//! - The index page stays open; it exposes no credentials

pub mod access_control;

pub use access_control::{access_control_middleware, AccessControlState};
