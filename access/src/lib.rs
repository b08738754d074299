//! Access rules shared by the console service and its clients
//!
//! Nothing here performs I/O: permission sets and the edge gate decisions are plain functions of
//! their inputs, so the server middleware and the client context evaluate them identically.

pub mod gate;
pub mod permissions;

pub use gate::{AUTHENTICATED_SENTINEL, Decision, Gate, GateMode};
pub use permissions::{Permissions, has_permission};

/// Name of the cookie the edge gate reads. Carries the session token unless the gate runs in
/// [`GateMode::Sentinel`].
pub const SESSION_COOKIE: &str = "admin_session";

/// Name of the cookie carrying the session token in [`GateMode::Sentinel`]
pub const SESSION_TOKEN_COOKIE: &str = "admin_session_token";
