use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{config, error, management::TokenManager, types::CurrentUser};

/// Retrieves the profile of the authenticated user from `GET /me`.
///
/// The user id is needed for playlist creation and to tell the user's own
/// playlists apart from ones they merely follow. Loads the token from the
/// token manager; if none is stored the program terminates with a hint to
/// run `shuffli auth`.
///
/// 502 Bad Gateway responses are retried after 10 seconds; all other errors
/// are propagated.
pub async fn get_current_user() -> Result<CurrentUser, reqwest::Error> {
    let mut token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run shuffli auth\n Error: {}",
                e
            );
        }
    };

    loop {
        let token = token_mgr.get_valid_token().await;
        let api_url = format!("{uri}/me", uri = &config::spotify_apiurl());

        let client = Client::new();
        let response = client.get(&api_url).bearer_auth(token).send().await;

        let response = match response {
            Ok(resp) => match resp.error_for_status() {
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
            },
            Err(err) => {
                return Err(err);
            } // network or reqwest error
        };

        let user = response.json::<CurrentUser>().await?;
        return Ok(user);
    }
}
