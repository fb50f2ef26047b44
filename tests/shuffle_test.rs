use std::collections::{HashMap, HashSet};

use shuffli::management::{ExclusionStore, MemoryExclusionStore, record_playlist_run};
use shuffli::shuffle::{
    Provider, ProviderError, ShuffleError, ShuffleRequest, SourceSpec, collect_tracks,
    run_shuffle, select_sources,
};
use shuffli::types::{
    CreatePlaylistResponse, CurrentUser, Playlist, PlaylistItem, PlaylistOwner, SavedTrackItem,
    TrackRef,
};

/// Provider fake driving the engine from canned data while recording the
/// mutations the engine asks for.
struct FakeProvider {
    playlists: Vec<Playlist>,
    tracks: HashMap<String, Vec<PlaylistItem>>,
    liked: Vec<SavedTrackItem>,
    fail_replace: bool,
    created: Vec<String>,
    replaced: Option<(String, Vec<String>)>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            playlists: Vec::new(),
            tracks: HashMap::new(),
            liked: Vec::new(),
            fail_replace: false,
            created: Vec::new(),
            replaced: None,
        }
    }

    fn add_playlist(&mut self, id: &str, owner: &str, track_ids: &[&str]) {
        self.playlists.push(test_playlist(id, owner));
        self.tracks
            .insert(id.to_string(), track_ids.iter().map(|t| item(t)).collect());
    }
}

impl Provider for FakeProvider {
    async fn current_user(&mut self) -> Result<CurrentUser, ProviderError> {
        Ok(CurrentUser {
            id: "me".to_string(),
            display_name: None,
        })
    }

    async fn user_playlists(&mut self) -> Result<Vec<Playlist>, ProviderError> {
        Ok(self.playlists.clone())
    }

    async fn playlist_tracks(
        &mut self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ProviderError> {
        Ok(self.tracks.get(playlist_id).cloned().unwrap_or_default())
    }

    async fn saved_tracks(&mut self) -> Result<Vec<SavedTrackItem>, ProviderError> {
        Ok(self.liked.clone())
    }

    async fn create_playlist(
        &mut self,
        _user_id: &str,
        name: &str,
    ) -> Result<CreatePlaylistResponse, ProviderError> {
        let id = format!("created-{}", self.created.len());
        self.created.push(name.to_string());
        Ok(CreatePlaylistResponse {
            id,
            name: name.to_string(),
        })
    }

    async fn replace_tracks(
        &mut self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        if self.fail_replace {
            return Err(ProviderError("replace failed".to_string()));
        }
        self.replaced = Some((playlist_id.to_string(), track_ids.to_vec()));
        Ok(())
    }
}

fn test_playlist(id: &str, owner: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: format!("{} name", id),
        owner: PlaylistOwner {
            id: owner.to_string(),
        },
    }
}

fn item(track_id: &str) -> PlaylistItem {
    PlaylistItem {
        track: Some(TrackRef {
            id: Some(track_id.to_string()),
            name: None,
        }),
    }
}

fn request(source: SourceSpec, num_songs: usize) -> ShuffleRequest {
    ShuffleRequest {
        target_playlist: Some("target".to_string()),
        new_playlist_name: None,
        source,
        num_songs,
        include_liked: false,
    }
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn fails_without_a_target() {
    let mut provider = FakeProvider::new();
    let mut store = MemoryExclusionStore::new();

    let mut req = request(SourceSpec::Manual(ids(&["p1"])), 1);
    req.target_playlist = None;

    let err = run_shuffle(&mut provider, &mut store, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, ShuffleError::NoTarget));
}

#[tokio::test]
async fn new_playlist_name_wins_over_target_id() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &["t1", "t2"]);
    let mut store = MemoryExclusionStore::new();

    let mut req = request(SourceSpec::Manual(ids(&["p1"])), 2);
    req.new_playlist_name = Some("Fresh mix".to_string());

    let outcome = run_shuffle(&mut provider, &mut store, &req).await.unwrap();

    assert_eq!(provider.created, vec!["Fresh mix".to_string()]);
    assert_eq!(outcome.playlist_id, "created-0");
    let (replaced_id, _) = provider.replaced.unwrap();
    assert_eq!(replaced_id, "created-0");
}

#[tokio::test]
async fn fails_without_sources_or_liked_songs() {
    let mut provider = FakeProvider::new();
    let mut store = MemoryExclusionStore::new();

    let req = request(SourceSpec::Manual(Vec::new()), 1);

    let err = run_shuffle(&mut provider, &mut store, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, ShuffleError::NoSource));
}

#[tokio::test]
async fn liked_songs_alone_are_a_valid_source() {
    let mut provider = FakeProvider::new();
    provider.liked = vec![
        SavedTrackItem {
            track: Some(TrackRef {
                id: Some("l1".to_string()),
                name: None,
            }),
        },
        SavedTrackItem {
            track: Some(TrackRef {
                id: Some("l2".to_string()),
                name: None,
            }),
        },
    ];
    let mut store = MemoryExclusionStore::new();

    let mut req = request(SourceSpec::Manual(Vec::new()), 2);
    req.include_liked = true;

    let outcome = run_shuffle(&mut provider, &mut store, &req).await.unwrap();
    assert_eq!(outcome.added, 2);
}

#[tokio::test]
async fn random_mode_reports_available_count_when_pool_is_too_small() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &[]);
    provider.add_playlist("p2", "me", &[]);
    let mut store = MemoryExclusionStore::new();

    let err = select_sources(&mut provider, &mut store, &SourceSpec::Random(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShuffleError::InsufficientPlaylists { available: 2 }
    ));

    // A failed selection records no run
    assert!(store.load_runs().await.unwrap().is_empty());
}

#[tokio::test]
async fn random_mode_with_zero_count_records_no_run() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &["t1"]);
    let mut store = MemoryExclusionStore::new();
    record_playlist_run(&mut store, ids(&["earlier"])).await.unwrap();

    let req = request(SourceSpec::Random(0), 1);

    // Nothing to draw from, so the run fails like any other empty selection
    let err = run_shuffle(&mut provider, &mut store, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, ShuffleError::NoSource));

    // An empty run must never displace a retained exclusion
    assert_eq!(store.load_runs().await.unwrap(), vec![ids(&["earlier"])]);
}

#[tokio::test]
async fn random_mode_never_picks_excluded_or_curator_playlists() {
    let mut provider = FakeProvider::new();
    let mut store = MemoryExclusionStore::new();

    // Five retained runs of five distinct playlists each
    for run in 0..5 {
        let batch: Vec<String> = (0..5).map(|i| format!("old-{}-{}", run, i)).collect();
        for id in &batch {
            provider.add_playlist(id, "me", &[]);
        }
        record_playlist_run(&mut store, batch).await.unwrap();
    }

    // Exactly five unexcluded playlists, plus a curated one that never counts
    for i in 0..5 {
        provider.add_playlist(&format!("fresh-{}", i), "me", &[]);
    }
    provider.add_playlist("editorial", "spotify", &[]);

    let chosen = select_sources(&mut provider, &mut store, &SourceSpec::Random(5))
        .await
        .unwrap();

    let chosen_set: HashSet<&String> = chosen.iter().collect();
    assert_eq!(chosen_set.len(), 5);
    for id in &chosen {
        assert!(id.starts_with("fresh-"), "unexpected pick: {}", id);
    }

    // The batch was recorded as the newest run, window still capped at five
    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs.len(), 5);
    let newest: HashSet<&String> = runs[4].iter().collect();
    assert_eq!(newest, chosen_set);
}

#[tokio::test]
async fn collector_deduplicates_and_skips_unresolvable_tracks() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &["t1", "t2"]);
    provider.add_playlist("p2", "me", &["t2", "t3"]);
    // Local file (null id) and removed track (null track)
    provider
        .tracks
        .get_mut("p1")
        .unwrap()
        .push(PlaylistItem {
            track: Some(TrackRef {
                id: None,
                name: Some("local file".to_string()),
            }),
        });
    provider
        .tracks
        .get_mut("p2")
        .unwrap()
        .push(PlaylistItem { track: None });
    provider.liked = vec![SavedTrackItem {
        track: Some(TrackRef {
            id: Some("t3".to_string()),
            name: None,
        }),
    }];

    let candidates = collect_tracks(&mut provider, &ids(&["p1", "p2"]), true)
        .await
        .unwrap();

    let expected: HashSet<String> = ids(&["t1", "t2", "t3"]).into_iter().collect();
    assert_eq!(candidates, expected);
}

#[tokio::test]
async fn insufficient_songs_reports_counts_and_writes_nothing() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &["t1", "t2", "t3"]);
    let mut store = MemoryExclusionStore::new();

    let req = request(SourceSpec::Manual(ids(&["p1"])), 10);

    let err = run_shuffle(&mut provider, &mut store, &req)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShuffleError::InsufficientSongs {
            requested: 10,
            available: 3
        }
    ));

    assert!(provider.replaced.is_none());
    assert!(store.songs().is_empty());
}

#[tokio::test]
async fn excluded_songs_never_reach_the_target() {
    let mut provider = FakeProvider::new();
    let fresh: Vec<String> = (0..20).map(|i| format!("new{}", i)).collect();
    let fresh_refs: Vec<&str> = fresh.iter().map(String::as_str).collect();
    provider.add_playlist("p1", "me", &fresh_refs);

    let old: Vec<String> = (0..40).map(|i| format!("old{}", i)).collect();
    let mut store = MemoryExclusionStore::with_songs(old);

    let req = request(SourceSpec::Manual(ids(&["p1"])), 20);

    let outcome = run_shuffle(&mut provider, &mut store, &req).await.unwrap();
    assert_eq!(outcome.added, 20);

    let (_, placed) = provider.replaced.clone().unwrap();
    assert_eq!(placed.len(), 20);
    for id in &placed {
        assert!(id.starts_with("new"));
    }

    // All 20 join the exclusion record; 60 total stays within the 80 cap
    assert_eq!(store.songs().len(), 60);
    for id in &placed {
        assert!(store.songs().contains(id));
    }
}

#[tokio::test]
async fn replace_failure_aborts_without_song_bookkeeping() {
    let mut provider = FakeProvider::new();
    provider.add_playlist("p1", "me", &["t1", "t2"]);
    provider.fail_replace = true;
    let mut store = MemoryExclusionStore::new();

    let req = request(SourceSpec::Random(1), 2);

    let err = run_shuffle(&mut provider, &mut store, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, ShuffleError::Provider(_)));

    // No songs were recorded, but the playlist run chosen earlier stays
    // committed. Known behavior, not rolled back.
    assert!(store.songs().is_empty());
    assert_eq!(store.load_runs().await.unwrap().len(), 1);
}
