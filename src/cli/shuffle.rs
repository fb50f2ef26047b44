use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    error,
    management::FileExclusionStore,
    shuffle::{ShuffleRequest, SourceSpec, WebProvider, run_shuffle},
    success,
};

/// Runs one shuffle from the command line.
///
/// Builds the request from the parsed flags, runs the engine against the
/// live Spotify provider and the file-backed exclusion store, and reports
/// the outcome. `--random` and explicit `--source` ids are mutually
/// exclusive; clap enforces that before we get here.
pub async fn shuffle(
    num_songs: usize,
    target_playlist: Option<String>,
    new_playlist_name: Option<String>,
    source_playlists: Vec<String>,
    num_random_playlists: Option<usize>,
    include_liked: bool,
) {
    let source = match num_random_playlists {
        Some(count) => SourceSpec::Random(count),
        None => SourceSpec::Manual(source_playlists),
    };

    let request = ShuffleRequest {
        target_playlist,
        new_playlist_name,
        source,
        num_songs,
        include_liked,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message("Shuffling...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let mut provider = WebProvider;
    let mut store = FileExclusionStore::new();

    let result = run_shuffle(&mut provider, &mut store, &request).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            success!(
                "Added {} new songs to playlist {}.",
                outcome.added,
                outcome.playlist_id
            );
        }
        Err(e) => error!("{}", e),
    }
}
