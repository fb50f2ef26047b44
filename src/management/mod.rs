mod auth;
mod exclusions;

pub use auth::TokenManager;
pub use exclusions::ExclusionStore;
pub use exclusions::FileExclusionStore;
pub use exclusions::MemoryExclusionStore;
pub use exclusions::PLAYLIST_EXCLUSION_RUNS;
pub use exclusions::SONG_EXCLUSION_WINDOW;
pub use exclusions::StoreError;
pub use exclusions::clear_runs;
pub use exclusions::excluded_playlist_ids;
pub use exclusions::record_playlist_run;
pub use exclusions::record_selected_songs;
pub use exclusions::remove_playlist_from_runs;
pub use exclusions::runs_remaining;
