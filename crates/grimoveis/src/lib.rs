//! Real-estate listing backend.
//!
//! Account registration and login with bearer tokens, CRUD over property
//! listings, and image uploads forwarded to an external media host. The
//! binary in `services/api` wires these modules into an HTTP server.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod listings;
pub mod media;
pub mod telemetry;
