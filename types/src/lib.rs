//! Shared types for the AMS attendance client.
//!
//! This crate contains the domain model shared between the screen
//! controllers and the remote gateway: entity kinds and their schema
//! descriptors, generic records, staged form buffers, the remote
//! response envelope, and the persisted session.

/// Default base URL of the remote AMS endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/ams_backend";

pub mod entity;
pub mod envelope;
pub mod form;
pub mod schema;
pub mod session;

// Re-export commonly used types
pub use entity::{EntityKind, EntityRecord};
pub use envelope::{Envelope, StatusFlag};
pub use form::FormBuffer;
pub use schema::{EntitySchema, RequestEncoding};
pub use session::{Role, Session};
