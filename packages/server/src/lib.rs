// Basecamp Agent - API Core
//
// Backend for the Basecamp study agent: phone-number authentication with
// one-time SMS codes, an admin-managed access-control workflow backed by a
// tabular registry, and a pass-through quiz analyzer surface.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
