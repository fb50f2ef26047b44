use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{
    config, error,
    management::TokenManager,
    types::{
        CreatePlaylistRequest, CreatePlaylistResponse, Playlist, ReplaceTracksRequest,
        SnapshotResponse, UserPlaylistsPage,
    },
    warning,
};

/// Spotify caps playlist item mutations at 100 uris per request.
const TRACKS_PER_REQUEST: usize = 100;

/// Retrieves every playlist in the authenticated user's library.
///
/// Follows the `next` URL over `GET /me/playlists` until Spotify stops
/// returning one, so the result covers the complete listing regardless of
/// library size. The listing includes followed playlists; callers that only
/// want playlists the user owns filter on `owner.id`.
///
/// 502 Bad Gateway responses are retried after 10 seconds, 429 responses
/// after the `Retry-After` delay; other errors are propagated.
pub async fn get_user_playlists() -> Result<Vec<Playlist>, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let mut playlists: Vec<Playlist> = Vec::new();
    let mut next_url = Some(format!(
        "{uri}/me/playlists?limit=50",
        uri = &config::spotify_apiurl()
    ));

    while let Some(api_url) = next_url {
        let token = token_mgr.get_valid_token().await;
        let response = get_with_retry(&api_url, &token).await?;

        let page = response.json::<UserPlaylistsPage>().await?;
        playlists.extend(page.items);
        next_url = page.next;
    }

    Ok(playlists)
}

/// Retrieves a single playlist by id.
///
/// Used for display purposes when listing excluded playlists; a failure here
/// usually means the playlist was deleted since it was excluded.
pub async fn get_playlist(playlist_id: &str) -> Result<Playlist, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let api_url = format!(
        "{uri}/playlists/{id}?fields=id,name,owner(id)",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let token = token_mgr.get_valid_token().await;
    let response = get_with_retry(&api_url, &token).await?;
    let playlist = response.json::<Playlist>().await?;
    Ok(playlist)
}

/// Creates a private playlist owned by the given user and returns it.
pub async fn create(user_id: &str, name: &str) -> Result<CreatePlaylistResponse, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let api_url = format!(
        "{uri}/users/{user_id}/playlists",
        uri = &config::spotify_apiurl(),
        user_id = user_id
    );

    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: "Created by shuffli".to_string(),
        public: false,
        collaborative: false,
    };

    let token = token_mgr.get_valid_token().await;
    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let playlist = response.json::<CreatePlaylistResponse>().await?;
    Ok(playlist)
}

/// Replaces the entire contents of a playlist with the given tracks.
///
/// Anything previously in the playlist is discarded. The Web API accepts at
/// most 100 uris per mutation, so the first chunk goes through the replacing
/// `PUT` and any remaining chunks are appended with `POST` calls.
pub async fn replace_tracks(
    playlist_id: &str,
    track_ids: &[String],
) -> Result<(), reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let mut chunks = track_ids.chunks(TRACKS_PER_REQUEST);
    let first = chunks.next().unwrap_or(&[]);

    let client = Client::new();
    let token = token_mgr.get_valid_token().await;
    client
        .put(&api_url)
        .bearer_auth(&token)
        .json(&ReplaceTracksRequest {
            uris: track_uris(first),
        })
        .send()
        .await?
        .error_for_status()?;

    for chunk in chunks {
        let token = token_mgr.get_valid_token().await;
        let response = client
            .post(&api_url)
            .bearer_auth(&token)
            .json(&ReplaceTracksRequest {
                uris: track_uris(chunk),
            })
            .send()
            .await?
            .error_for_status()?;

        let _ = response.json::<SnapshotResponse>().await?;
    }

    Ok(())
}

fn track_uris(track_ids: &[String]) -> Vec<String> {
    track_ids
        .iter()
        .map(|id| format!("spotify:track:{}", id))
        .collect()
}

/// Issues a GET against the Web API, retrying 502s after 10 seconds and 429s
/// after the delay Spotify names in the `Retry-After` header.
pub(crate) async fn get_with_retry(
    api_url: &str,
    token: &str,
) -> Result<reqwest::Response, reqwest::Error> {
    loop {
        let client = Client::new();
        let response = client.get(api_url).bearer_auth(token).send().await;

        let response = match response {
            Ok(resp) => {
                if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(0);
                    if retry_after <= 120 {
                        sleep(Duration::from_secs(retry_after)).await;
                        continue; // retry
                    }
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds. Try again tomorrow.",
                        retry_after
                    );
                }

                match resp.error_for_status() {
                    Ok(valid_response) => valid_response,
                    Err(err) => {
                        if let Some(status) = err.status() {
                            if status == StatusCode::BAD_GATEWAY {
                                sleep(Duration::from_secs(10)).await;
                                continue; // retry
                            }
                        }
                        return Err(err); // propagate other errors
                    }
                }
            }
            Err(err) => {
                return Err(err);
            } // network or reqwest error
        };

        return Ok(response);
    }
}
