//! # API Module
//!
//! HTTP endpoints served by the short-lived local server that backs the OAuth
//! flow. Spotify redirects the user's browser here after authorization.
//!
//! - [`callback`] - receives the authorization code and completes the PKCE
//!   code-for-token exchange
//! - [`health`] - liveness probe returning status and version
//!
//! Built on [Axum](https://docs.rs/axum); see [`crate::server`] for the
//! router setup and [`crate::spotify::auth`] for the surrounding flow.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
