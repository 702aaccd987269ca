//! AMS client core.
//!
//! The reusable pieces behind every screen of the attendance client:
//! the remote gateway ([`api`]), the persisted session ([`session`]),
//! the generic per-entity screen controller ([`controller`]), the
//! role-aware navigation resolver ([`nav`]), and configuration
//! ([`config`]).

pub mod api;
pub mod config;
pub mod controller;
pub mod nav;
pub mod session;

pub use api::{ApiError, EntityGateway, HttpGateway};
pub use config::Config;
pub use controller::{Phase, ScreenController, ScreenError};
pub use nav::{MenuEntry, NavStack, NavigationRouter, Route};
pub use session::{JsonFileStore, KeyValueStore, SessionStore};
