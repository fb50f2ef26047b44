//! # CLI Module
//!
//! The user-facing command layer of shuffli. Each command gathers its input,
//! wires up the real collaborators (the Spotify-backed [`crate::shuffle::WebProvider`]
//! and the file-backed exclusion store) and renders outcomes with the
//! crate's output macros.
//!
//! ## Commands
//!
//! - [`auth`] - OAuth 2.0 PKCE authentication flow against Spotify
//! - [`shuffle`] - the core operation: refill a target playlist with a
//!   random, exclusion-windowed selection from the chosen sources
//! - [`list_exclusions`] - show currently excluded playlists with how many
//!   random runs each has left
//! - [`remove_exclusion`] - release one playlist from all exclusion runs
//! - [`clear_exclusions`] - drop the whole playlist exclusion record
//!
//! ## Layering
//!
//! ```text
//! CLI Layer (this module)
//!     ↓
//! Shuffle Engine / Management Layer
//!     ↓
//! Spotify Integration Layer
//!     ↓
//! HTTP (reqwest)
//! ```
//!
//! Failure reasons coming out of the engine are already human-readable; the
//! CLI prints them and exits nonzero rather than retrying anything.

mod auth;
mod exclusions;
mod shuffle;

pub use auth::auth;
pub use exclusions::clear_exclusions;
pub use exclusions::list_exclusions;
pub use exclusions::remove_exclusion;
pub use shuffle::shuffle;
