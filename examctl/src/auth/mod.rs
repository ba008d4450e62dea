//! Authentication layer.
//!
//! examctl authenticates through a trusted proxy header: an authenticating
//! reverse proxy in front of the service injects the verified user identity
//! into each request. The [`current_user`] module provides the axum
//! extractor that resolves this header to a user record.

pub mod current_user;
