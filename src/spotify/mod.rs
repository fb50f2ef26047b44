//! # Spotify Integration Module
//!
//! The integration layer between shuffli and the Spotify Web API. Everything
//! that talks HTTP to Spotify lives here; higher layers (the shuffle engine,
//! the CLI) only ever see typed results.
//!
//! ## Submodules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: verifier/challenge generation, browser
//!   hand-off, local callback, code-for-token exchange
//! - [`user`] - Profile of the authenticated user
//! - [`playlists`] - Playlist enumeration, creation and contents replacement
//! - [`tracks`] - Track listings for playlists and the liked-songs library
//!
//! ## Conventions
//!
//! All listing endpoints are paginated; functions here follow the `next` URL
//! Spotify returns until it is absent, so callers always receive the complete
//! listing. Requests authenticate via [`crate::management::TokenManager`],
//! which refreshes the access token transparently.
//!
//! Transient upstream trouble is handled at this layer in two ways: 502 Bad
//! Gateway responses are retried after a 10 second delay, and 429 responses
//! are retried after the delay named in the `Retry-After` header. Every other
//! error is propagated to the caller as a `reqwest::Error`.

pub mod auth;
pub mod playlists;
pub mod tracks;
pub mod user;
