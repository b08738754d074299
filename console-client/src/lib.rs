//! Client side of the console authentication
//!
//! [`AuthContext`] caches the identity of the signed in user for the lifetime of a page. It is an
//! owned value, created when the page mounts and dropped when it goes away, and it never navigates
//! on it's own: operations return a [`Navigation`] for the caller's router to act on.

pub mod api;
pub mod context;
pub mod user;

pub use api::{ApiError, AuthApi, HttpAuthApi};
pub use context::{AuthContext, LoginError, Navigation, Routes};
pub use user::AuthUser;
