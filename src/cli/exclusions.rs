use std::collections::HashMap;

use tabled::Table;

use crate::{
    error, info,
    management::{self, ExclusionStore, FileExclusionStore},
    spotify, success,
    types::{ExcludedPlaylistRow, Playlist},
};

/// Lists currently excluded playlists with their remaining exclusion runs.
///
/// Playlist details are fetched once per unique id for display. Lookups that
/// fail (deleted or otherwise unknown playlists) are simply omitted from the
/// table; the ids remain excluded until their runs age out or the user
/// removes them.
pub async fn list_exclusions() {
    let mut store = FileExclusionStore::new();
    let runs = match store.load_runs().await {
        Ok(runs) => runs,
        Err(e) => error!("Failed to load playlist exclusions: {}", e),
    };

    if runs.is_empty() {
        info!("No playlists are currently excluded.");
        return;
    }

    let mut details: HashMap<String, Playlist> = HashMap::new();
    for id in runs.iter().flatten() {
        if details.contains_key(id) {
            continue;
        }
        if let Ok(playlist) = spotify::playlists::get_playlist(id).await {
            details.insert(id.clone(), playlist);
        }
    }

    let total = runs.len();
    let mut rows: Vec<ExcludedPlaylistRow> = Vec::new();
    for (i, run) in runs.iter().enumerate() {
        let runs_remaining = management::runs_remaining(i, total);
        for id in run {
            if let Some(playlist) = details.get(id) {
                rows.push(ExcludedPlaylistRow {
                    name: playlist.name.clone(),
                    id: playlist.id.clone(),
                    runs_remaining,
                });
            }
        }
    }

    let table = Table::new(rows);
    println!("{}", table);
}

/// Removes one playlist from all exclusion runs.
pub async fn remove_exclusion(playlist_id: String) {
    let mut store = FileExclusionStore::new();
    match management::remove_playlist_from_runs(&mut store, &playlist_id).await {
        Ok(()) => success!("Playlist {} removed from exclusion list.", playlist_id),
        Err(e) => error!("Failed to update playlist exclusions: {}", e),
    }
}

/// Clears the entire playlist exclusion record.
pub async fn clear_exclusions() {
    let mut store = FileExclusionStore::new();
    match management::clear_runs(&mut store).await {
        Ok(()) => success!("Playlist exclusion list has been cleared."),
        Err(e) => error!("Failed to clear playlist exclusions: {}", e),
    }
}
