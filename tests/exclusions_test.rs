use serde_json::json;
use shuffli::management::{
    ExclusionStore, FileExclusionStore, MemoryExclusionStore, PLAYLIST_EXCLUSION_RUNS,
    SONG_EXCLUSION_WINDOW, StoreError, clear_runs, excluded_playlist_ids, record_playlist_run,
    record_selected_songs, remove_playlist_from_runs, runs_remaining,
};

// Helper to build owned id lists without to_string noise in every test
fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn fresh_store_loads_empty_records() {
    let mut store = MemoryExclusionStore::new();

    assert!(store.load_songs().await.unwrap().is_empty());
    assert!(store.load_runs().await.unwrap().is_empty());
}

#[tokio::test]
async fn legacy_flat_list_becomes_single_run() {
    let mut store = MemoryExclusionStore::with_raw_runs(json!(["a", "b", "c"]));

    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs, vec![ids(&["a", "b", "c"])]);

    // The persisted shape is rewritten immediately, not just the returned value
    assert_eq!(store.raw_runs(), &json!([["a", "b", "c"]]));
}

#[tokio::test]
async fn migration_is_idempotent() {
    let mut store = MemoryExclusionStore::with_raw_runs(json!(["a", "b", "c"]));

    let first = store.load_runs().await.unwrap();
    let second = store.load_runs().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.raw_runs(), &json!([["a", "b", "c"]]));
}

#[tokio::test]
async fn file_store_rewrites_legacy_shape_on_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("excluded-playlists.json"),
        r#"["a","b","c"]"#,
    )
    .unwrap();

    let mut store = FileExclusionStore::with_dir(dir.path().to_path_buf());
    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs, vec![ids(&["a", "b", "c"])]);

    let on_disk = std::fs::read_to_string(dir.path().join("excluded-playlists.json")).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(raw, json!([["a", "b", "c"]]));
}

#[tokio::test]
async fn file_store_round_trips_songs() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileExclusionStore::with_dir(dir.path().to_path_buf());

    assert!(store.load_songs().await.unwrap().is_empty());

    store.save_songs(&ids(&["t1", "t2"])).await.unwrap();
    assert_eq!(store.load_songs().await.unwrap(), ids(&["t1", "t2"]));
}

#[tokio::test]
async fn corrupt_runs_record_is_an_error() {
    let mut store = MemoryExclusionStore::with_raw_runs(json!({"not": "a list"}));

    let err = store.load_runs().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[tokio::test]
async fn run_record_keeps_only_the_trailing_runs() {
    let mut store = MemoryExclusionStore::new();

    for i in 0..7 {
        record_playlist_run(&mut store, vec![format!("p{}", i)])
            .await
            .unwrap();
    }

    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs.len(), PLAYLIST_EXCLUSION_RUNS);
    // Oldest runs were dropped, most recent kept in order
    assert_eq!(runs[0], ids(&["p2"]));
    assert_eq!(runs[4], ids(&["p6"]));
}

#[tokio::test]
async fn song_cap_is_recomputed_from_the_current_request() {
    let mut store = MemoryExclusionStore::new();
    let old: Vec<String> = (0..40).map(|i| format!("old{}", i)).collect();
    store.save_songs(&old).await.unwrap();

    // 40 + 20 = 60 entries, cap 20 * 4 = 80, no trimming
    let new: Vec<String> = (0..20).map(|i| format!("new{}", i)).collect();
    record_selected_songs(&mut store, &new, 20).await.unwrap();
    assert_eq!(store.songs().len(), 60);
    assert!(store.songs().len() <= 20 * SONG_EXCLUSION_WINDOW);

    // A smaller request shrinks the window: cap 5 * 4 = 20, trailing kept
    let next = ids(&["x1", "x2", "x3", "x4", "x5"]);
    record_selected_songs(&mut store, &next, 5).await.unwrap();
    assert_eq!(store.songs().len(), 20);
    assert_eq!(store.songs()[19], "x5");
    assert_eq!(store.songs()[15], "x1");
    // The oldest survivors come from the previous batch
    assert_eq!(store.songs()[0], "new5");
}

#[tokio::test]
async fn excluded_ids_are_the_union_of_retained_runs() {
    let mut store = MemoryExclusionStore::new();
    record_playlist_run(&mut store, ids(&["a", "b"])).await.unwrap();
    record_playlist_run(&mut store, ids(&["b", "c"])).await.unwrap();

    let excluded = excluded_playlist_ids(&mut store).await.unwrap();
    assert_eq!(excluded.len(), 3);
    assert!(excluded.contains("a"));
    assert!(excluded.contains("b"));
    assert!(excluded.contains("c"));
}

#[tokio::test]
async fn removing_a_playlist_drops_runs_that_become_empty() {
    let mut store = MemoryExclusionStore::new();
    record_playlist_run(&mut store, ids(&["a"])).await.unwrap();
    record_playlist_run(&mut store, ids(&["a", "b"])).await.unwrap();

    remove_playlist_from_runs(&mut store, "a").await.unwrap();

    let runs = store.load_runs().await.unwrap();
    assert_eq!(runs, vec![ids(&["b"])]);

    let excluded = excluded_playlist_ids(&mut store).await.unwrap();
    assert!(!excluded.contains("a"));
}

#[tokio::test]
async fn clearing_empties_the_run_record() {
    let mut store = MemoryExclusionStore::new();
    record_playlist_run(&mut store, ids(&["a", "b"])).await.unwrap();

    clear_runs(&mut store).await.unwrap();

    assert!(store.load_runs().await.unwrap().is_empty());
}

#[test]
fn runs_remaining_counts_down_with_age() {
    // A full window: the most recent run has all runs left, the oldest one
    assert_eq!(runs_remaining(4, 5), 5);
    assert_eq!(runs_remaining(3, 5), 4);
    assert_eq!(runs_remaining(0, 5), 1);

    // Fewer retained runs than the window
    assert_eq!(runs_remaining(1, 2), 5);
    assert_eq!(runs_remaining(0, 2), 4);
    assert_eq!(runs_remaining(0, 1), 5);
}

#[test]
fn runs_remaining_bottoms_out_for_oversized_records() {
    // A hand-edited file can hold more runs than the window; runs past it
    // report zero instead of panicking
    assert_eq!(runs_remaining(0, 7), 0);
    assert_eq!(runs_remaining(1, 7), 0);
    assert_eq!(runs_remaining(2, 7), 1);
    assert_eq!(runs_remaining(6, 7), 5);
}
