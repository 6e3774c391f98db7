//! Domain types of the client status engine.

pub mod auth;
pub mod client;
pub mod period;
pub mod status;
pub mod territory;
pub mod transition;
pub mod types;
