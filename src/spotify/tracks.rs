use crate::{
    config, error,
    management::TokenManager,
    spotify::playlists::get_with_retry,
    types::{PlaylistItem, PlaylistTracksPage, SavedTrackItem, SavedTracksPage},
};

/// Retrieves the full track listing of a playlist.
///
/// Follows `GET /playlists/{id}/tracks` continuation pages until exhausted.
/// Entries are returned as-is; local files and removed tracks come back with
/// a null id and it is up to the caller to skip them.
pub async fn get_playlist_tracks(
    playlist_id: &str,
) -> Result<Vec<PlaylistItem>, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let mut items: Vec<PlaylistItem> = Vec::new();
    let mut next_url = Some(format!(
        "{uri}/playlists/{id}/tracks?limit=100&fields=items(track(id,name)),next",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    ));

    while let Some(api_url) = next_url {
        let token = token_mgr.get_valid_token().await;
        let response = get_with_retry(&api_url, &token).await?;

        let page = response.json::<PlaylistTracksPage>().await?;
        items.extend(page.items);
        next_url = page.next;
    }

    Ok(items)
}

/// Retrieves the user's complete liked-songs library.
///
/// Paginates `GET /me/tracks` until the continuation URL is absent.
pub async fn get_saved_tracks() -> Result<Vec<SavedTrackItem>, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let mut items: Vec<SavedTrackItem> = Vec::new();
    let mut next_url = Some(format!(
        "{uri}/me/tracks?limit=50",
        uri = &config::spotify_apiurl()
    ));

    while let Some(api_url) = next_url {
        let token = token_mgr.get_valid_token().await;
        let response = get_with_retry(&api_url, &token).await?;

        let page = response.json::<SavedTracksPage>().await?;
        items.extend(page.items);
        next_url = page.next;
    }

    Ok(items)
}
