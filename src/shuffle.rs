//! The shuffle engine: source selection, track collection and the
//! exclusion-windowed random selection itself.
//!
//! A shuffle run resolves a target playlist, picks source playlists (either
//! the ones the caller named or a random batch of the user's own playlists
//! that were not sampled recently), collects the candidate track universe,
//! filters out recently placed tracks, and replaces the target's contents
//! with a uniform random selection. The rolling exclusion state is read
//! before selection and written back after, via
//! [`crate::management::ExclusionStore`].
//!
//! The Spotify side sits behind the [`Provider`] trait so the engine can be
//! driven by a fake in tests; [`WebProvider`] is the real implementation over
//! [`crate::spotify`].

use std::{collections::HashSet, fmt};

use rand::seq::{IndexedRandom, SliceRandom};

use crate::{
    management::{self, ExclusionStore, StoreError},
    spotify,
    types::{CreatePlaylistResponse, CurrentUser, Playlist, PlaylistItem, SavedTrackItem},
};

/// Owner id of Spotify's own curated playlists. These show up in the user's
/// library but are never sampled as sources.
pub const CURATOR_ACCOUNT: &str = "spotify";

/// An upstream failure (network, auth, rate limit). Not subdivided further;
/// the message carries whatever the transport reported.
#[derive(Debug)]
pub struct ProviderError(pub String);

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError(err.to_string())
    }
}

/// Everything that can abort a shuffle run. Each variant renders as the
/// message shown to the user; none of them are retried.
#[derive(Debug)]
pub enum ShuffleError {
    NoTarget,
    NoSource,
    InsufficientPlaylists { available: usize },
    InsufficientSongs { requested: usize, available: usize },
    Provider(ProviderError),
    Store(StoreError),
}

impl fmt::Display for ShuffleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuffleError::NoTarget => write!(
                f,
                "No target playlist specified. Select an existing playlist or provide a name for a new one."
            ),
            ShuffleError::NoSource => write!(
                f,
                "No source playlists selected and liked songs are not included. Select a source."
            ),
            ShuffleError::InsufficientPlaylists { available } => write!(
                f,
                "Not enough new playlists to choose from. Only {} available.",
                available
            ),
            ShuffleError::InsufficientSongs {
                requested,
                available,
            } => write!(
                f,
                "Not enough available songs to select {}. Only found {}.",
                requested, available
            ),
            ShuffleError::Provider(e) => write!(f, "Spotify request failed: {}", e),
            ShuffleError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ShuffleError {}

impl From<ProviderError> for ShuffleError {
    fn from(err: ProviderError) -> Self {
        ShuffleError::Provider(err)
    }
}

impl From<StoreError> for ShuffleError {
    fn from(err: StoreError) -> Self {
        ShuffleError::Store(err)
    }
}

/// The capability set the engine needs from the streaming service.
///
/// Listing methods return complete listings; the implementation is expected
/// to drain continuation pages itself. `replace_tracks` swaps the playlist
/// contents wholesale, it never appends to what is there.
pub trait Provider {
    async fn current_user(&mut self) -> Result<CurrentUser, ProviderError>;
    async fn user_playlists(&mut self) -> Result<Vec<Playlist>, ProviderError>;
    async fn playlist_tracks(
        &mut self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ProviderError>;
    async fn saved_tracks(&mut self) -> Result<Vec<SavedTrackItem>, ProviderError>;
    async fn create_playlist(
        &mut self,
        user_id: &str,
        name: &str,
    ) -> Result<CreatePlaylistResponse, ProviderError>;
    async fn replace_tracks(
        &mut self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError>;
}

/// [`Provider`] backed by the Spotify Web API client in [`crate::spotify`].
pub struct WebProvider;

impl Provider for WebProvider {
    async fn current_user(&mut self) -> Result<CurrentUser, ProviderError> {
        Ok(spotify::user::get_current_user().await?)
    }

    async fn user_playlists(&mut self) -> Result<Vec<Playlist>, ProviderError> {
        Ok(spotify::playlists::get_user_playlists().await?)
    }

    async fn playlist_tracks(
        &mut self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ProviderError> {
        Ok(spotify::tracks::get_playlist_tracks(playlist_id).await?)
    }

    async fn saved_tracks(&mut self) -> Result<Vec<SavedTrackItem>, ProviderError> {
        Ok(spotify::tracks::get_saved_tracks().await?)
    }

    async fn create_playlist(
        &mut self,
        user_id: &str,
        name: &str,
    ) -> Result<CreatePlaylistResponse, ProviderError> {
        Ok(spotify::playlists::create(user_id, name).await?)
    }

    async fn replace_tracks(
        &mut self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        Ok(spotify::playlists::replace_tracks(playlist_id, track_ids).await?)
    }
}

/// Where the candidate tracks come from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Exactly these playlists, no filtering and no exclusion bookkeeping.
    Manual(Vec<String>),
    /// A random batch of this many of the user's playlists, skipping any
    /// that appear in a retained exclusion run.
    Random(usize),
}

/// Input for one shuffle run. Constructed per invocation and discarded.
#[derive(Debug, Clone)]
pub struct ShuffleRequest {
    /// Existing playlist to refill. Ignored when `new_playlist_name` is set.
    pub target_playlist: Option<String>,
    /// Name for a fresh private playlist to create and use as the target.
    pub new_playlist_name: Option<String>,
    pub source: SourceSpec,
    pub num_songs: usize,
    /// Also draw candidates from the liked-songs library.
    pub include_liked: bool,
}

#[derive(Debug, Clone)]
pub struct ShuffleOutcome {
    pub playlist_id: String,
    pub added: usize,
}

/// Runs one complete shuffle.
///
/// Resolves the target, resolves sources, collects candidates, filters the
/// song exclusion window, replaces the target's contents with a uniform
/// random pick of `num_songs` tracks and records those tracks as excluded.
/// Any failure aborts the whole run; the song exclusion record is only
/// written after the playlist replacement succeeded.
///
/// One known wrinkle, inherited deliberately: in random source mode the
/// chosen playlists are recorded as an exclusion run as soon as they are
/// picked. If a later step fails (not enough songs, replace error), that run
/// is not rolled back, so the playlists stay excluded even though nothing
/// was added.
pub async fn run_shuffle<P: Provider, S: ExclusionStore>(
    provider: &mut P,
    store: &mut S,
    request: &ShuffleRequest,
) -> Result<ShuffleOutcome, ShuffleError> {
    // A new-playlist name wins over a supplied target id.
    let target = match (&request.new_playlist_name, &request.target_playlist) {
        (Some(name), _) => {
            let user = provider.current_user().await?;
            provider.create_playlist(&user.id, name).await?.id
        }
        (None, Some(id)) => id.clone(),
        (None, None) => return Err(ShuffleError::NoTarget),
    };

    let sources = select_sources(provider, store, &request.source).await?;

    if sources.is_empty() && !request.include_liked {
        return Err(ShuffleError::NoSource);
    }

    let candidates = collect_tracks(provider, &sources, request.include_liked).await?;

    let excluded = store.load_songs().await?;
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut available: Vec<String> = candidates
        .into_iter()
        .filter(|id| !excluded.contains(id.as_str()))
        .collect();

    if available.len() < request.num_songs {
        return Err(ShuffleError::InsufficientSongs {
            requested: request.num_songs,
            available: available.len(),
        });
    }

    let mut rng = rand::rng();
    available.shuffle(&mut rng);
    available.truncate(request.num_songs);

    provider.replace_tracks(&target, &available).await?;

    management::record_selected_songs(store, &available, request.num_songs).await?;

    Ok(ShuffleOutcome {
        playlist_id: target,
        added: available.len(),
    })
}

/// Resolves the source playlists for a run.
///
/// Manual mode passes the caller's list through untouched. Random mode draws
/// an unbiased `count`-subset of the user's playlists after removing
/// curator-owned ones and anything in a retained exclusion run, then records
/// the chosen batch as a new run. A count of zero selects nothing and records
/// no run, so it never displaces a retained exclusion.
pub async fn select_sources<P: Provider, S: ExclusionStore>(
    provider: &mut P,
    store: &mut S,
    source: &SourceSpec,
) -> Result<Vec<String>, ShuffleError> {
    match source {
        SourceSpec::Manual(ids) => Ok(ids.clone()),
        SourceSpec::Random(count) => {
            if *count == 0 {
                return Ok(Vec::new());
            }

            let excluded = management::excluded_playlist_ids(store).await?;

            let playlists = provider.user_playlists().await?;
            let pool: Vec<String> = playlists
                .into_iter()
                .filter(|p| p.owner.id != CURATOR_ACCOUNT)
                .map(|p| p.id)
                .filter(|id| !excluded.contains(id))
                .collect();

            if pool.len() < *count {
                return Err(ShuffleError::InsufficientPlaylists {
                    available: pool.len(),
                });
            }

            let mut rng = rand::rng();
            let chosen: Vec<String> = pool.choose_multiple(&mut rng, *count).cloned().collect();

            management::record_playlist_run(store, chosen.clone()).await?;

            Ok(chosen)
        }
    }
}

/// Gathers the de-duplicated candidate track ids from the source playlists
/// and, when requested, the liked-songs library.
///
/// Entries without a resolvable track id (local files, removed tracks) are
/// skipped. Duplicates across sources collapse via set semantics.
pub async fn collect_tracks<P: Provider>(
    provider: &mut P,
    source_playlist_ids: &[String],
    include_liked: bool,
) -> Result<HashSet<String>, ShuffleError> {
    let mut all_track_ids: HashSet<String> = HashSet::new();

    for playlist_id in source_playlist_ids {
        let items = provider.playlist_tracks(playlist_id).await?;
        all_track_ids.extend(
            items
                .into_iter()
                .filter_map(|item| item.track.and_then(|t| t.id)),
        );
    }

    if include_liked {
        let items = provider.saved_tracks().await?;
        all_track_ids.extend(
            items
                .into_iter()
                .filter_map(|item| item.track.and_then(|t| t.id)),
        );
    }

    Ok(all_track_ids)
}
