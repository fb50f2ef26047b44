//! Rolling exclusion state for shuffle runs.
//!
//! Two records outlive a single shuffle: the song exclusion list (track ids
//! placed into the target recently, most recent last) and the playlist
//! exclusion runs (batches of playlist ids chosen together in random source
//! selection). Both are persisted as JSON and reloaded fresh at the start of
//! every operation.
//!
//! The storage itself sits behind the [`ExclusionStore`] trait so that the
//! shuffle engine can be exercised against an in-memory store in tests. The
//! capping policy lives in the free functions of this module and therefore
//! applies to every store implementation.

use std::{collections::HashSet, fmt, io, path::PathBuf};

use serde_json::Value;

/// A selected track stays excluded until `num_songs * SONG_EXCLUSION_WINDOW`
/// newer selections have been recorded.
pub const SONG_EXCLUSION_WINDOW: usize = 4;

/// A playlist picked by random source selection stays excluded for this many
/// runs of the random option.
pub const PLAYLIST_EXCLUSION_RUNS: usize = 5;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serde(serde_json::Error),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "exclusion store I/O error: {}", e),
            StoreError::Serde(e) => write!(f, "exclusion store contains invalid JSON: {}", e),
            StoreError::Corrupt(msg) => write!(f, "exclusion store is corrupt: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err)
    }
}

/// Durable storage for the two exclusion records.
///
/// Loads return empty sequences when no prior state exists. Unreadable or
/// corrupt state is a hard error; it is surfaced to the caller instead of
/// being silently reset. `load_runs` is also the migration point for the
/// legacy flat-list layout (see `interpret_runs`).
pub trait ExclusionStore {
    async fn load_songs(&self) -> Result<Vec<String>, StoreError>;
    async fn save_songs(&mut self, songs: &[String]) -> Result<(), StoreError>;
    async fn load_runs(&mut self) -> Result<Vec<Vec<String>>, StoreError>;
    async fn save_runs(&mut self, runs: &[Vec<String>]) -> Result<(), StoreError>;
}

/// Interprets the raw JSON of the playlist-runs record.
///
/// Early versions stored a flat list of playlist ids instead of a list of
/// runs. The legacy shape is detected by the type of the first element: a
/// plain string means flat layout, and the whole list is wrapped as a single
/// run. The returned flag tells the caller the stored shape is stale and must
/// be rewritten; re-running on already-migrated data is a no-op because the
/// shape check no longer matches.
fn interpret_runs(raw: &Value) -> Result<(Vec<Vec<String>>, bool), StoreError> {
    let Value::Array(items) = raw else {
        return Err(StoreError::Corrupt(format!(
            "expected a JSON array of runs, got {}",
            raw
        )));
    };

    if items.is_empty() {
        return Ok((Vec::new(), false));
    }

    if items[0].is_string() {
        let flat: Vec<String> = serde_json::from_value(raw.clone())?;
        return Ok((vec![flat], true));
    }

    let runs: Vec<Vec<String>> = serde_json::from_value(raw.clone())?;
    Ok((runs, false))
}

/// File-backed exclusion store.
///
/// Persists both records as pretty-printed JSON under the platform state
/// directory, `shuffli/state/excluded-songs.json` and
/// `shuffli/state/excluded-playlists.json`. Reads and writes are whole-file;
/// concurrent writers to the same store are the caller's problem (one store
/// per user).
pub struct FileExclusionStore {
    dir: PathBuf,
}

impl FileExclusionStore {
    pub fn new() -> Self {
        let mut dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("shuffli/state");
        Self { dir }
    }

    /// Store rooted at an explicit directory instead of the platform default.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn songs_path(&self) -> PathBuf {
        self.dir.join("excluded-songs.json")
    }

    fn runs_path(&self) -> PathBuf {
        self.dir.join("excluded-playlists.json")
    }

    async fn read_raw(path: &PathBuf) -> Result<Option<Value>, StoreError> {
        let content = match async_fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let raw: Value = serde_json::from_str(&content)?;
        Ok(Some(raw))
    }

    async fn write_json<T: serde::Serialize>(&self, path: PathBuf, value: &T) -> Result<(), StoreError> {
        async_fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(value)?;
        async_fs::write(path, json).await?;
        Ok(())
    }
}

impl Default for FileExclusionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionStore for FileExclusionStore {
    async fn load_songs(&self) -> Result<Vec<String>, StoreError> {
        match Self::read_raw(&self.songs_path()).await? {
            Some(raw) => Ok(serde_json::from_value(raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_songs(&mut self, songs: &[String]) -> Result<(), StoreError> {
        self.write_json(self.songs_path(), &songs).await
    }

    async fn load_runs(&mut self) -> Result<Vec<Vec<String>>, StoreError> {
        let Some(raw) = Self::read_raw(&self.runs_path()).await? else {
            return Ok(Vec::new());
        };

        let (runs, migrated) = interpret_runs(&raw)?;
        if migrated {
            self.write_json(self.runs_path(), &runs).await?;
        }
        Ok(runs)
    }

    async fn save_runs(&mut self, runs: &[Vec<String>]) -> Result<(), StoreError> {
        self.write_json(self.runs_path(), &runs).await
    }
}

/// In-memory exclusion store.
///
/// Holds the same JSON value a file store would hold on disk, so the
/// legacy-shape migration behaves identically. Used by the test suite as the
/// injectable fake.
pub struct MemoryExclusionStore {
    songs: Vec<String>,
    runs: Value,
}

impl MemoryExclusionStore {
    pub fn new() -> Self {
        Self {
            songs: Vec::new(),
            runs: Value::Array(Vec::new()),
        }
    }

    /// Store whose runs record starts from an arbitrary raw JSON value.
    pub fn with_raw_runs(raw: Value) -> Self {
        Self {
            songs: Vec::new(),
            runs: raw,
        }
    }

    pub fn with_songs(songs: Vec<String>) -> Self {
        Self {
            songs,
            runs: Value::Array(Vec::new()),
        }
    }

    /// The raw persisted shape of the runs record, as a file store would
    /// have it on disk.
    pub fn raw_runs(&self) -> &Value {
        &self.runs
    }

    pub fn songs(&self) -> &[String] {
        &self.songs
    }
}

impl Default for MemoryExclusionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionStore for MemoryExclusionStore {
    async fn load_songs(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.songs.clone())
    }

    async fn save_songs(&mut self, songs: &[String]) -> Result<(), StoreError> {
        self.songs = songs.to_vec();
        Ok(())
    }

    async fn load_runs(&mut self) -> Result<Vec<Vec<String>>, StoreError> {
        let (runs, migrated) = interpret_runs(&self.runs)?;
        if migrated {
            self.runs = serde_json::to_value(&runs)?;
        }
        Ok(runs)
    }

    async fn save_runs(&mut self, runs: &[Vec<String>]) -> Result<(), StoreError> {
        self.runs = serde_json::to_value(runs)?;
        Ok(())
    }
}

/// Appends the tracks just placed into the target and trims the record to the
/// trailing `num_songs * SONG_EXCLUSION_WINDOW` entries, oldest first.
///
/// The cap is recomputed from the current request size, so the effective
/// window changes when the user changes how many songs they ask for.
pub async fn record_selected_songs<S: ExclusionStore>(
    store: &mut S,
    selected: &[String],
    num_songs: usize,
) -> Result<(), StoreError> {
    let mut songs = store.load_songs().await?;
    songs.extend(selected.iter().cloned());

    let cap = num_songs * SONG_EXCLUSION_WINDOW;
    if songs.len() > cap {
        songs.drain(..songs.len() - cap);
    }

    store.save_songs(&songs).await
}

/// Appends a freshly chosen batch of source playlists as a new run, keeping
/// only the trailing [`PLAYLIST_EXCLUSION_RUNS`] runs.
pub async fn record_playlist_run<S: ExclusionStore>(
    store: &mut S,
    run: Vec<String>,
) -> Result<(), StoreError> {
    let mut runs = store.load_runs().await?;
    runs.push(run);

    if runs.len() > PLAYLIST_EXCLUSION_RUNS {
        runs.drain(..runs.len() - PLAYLIST_EXCLUSION_RUNS);
    }

    store.save_runs(&runs).await
}

/// A playlist is excluded iff it appears in any retained run.
pub async fn excluded_playlist_ids<S: ExclusionStore>(
    store: &mut S,
) -> Result<HashSet<String>, StoreError> {
    let runs = store.load_runs().await?;
    Ok(runs.into_iter().flatten().collect())
}

/// Removes a playlist from every run; runs that become empty are dropped
/// entirely.
pub async fn remove_playlist_from_runs<S: ExclusionStore>(
    store: &mut S,
    playlist_id: &str,
) -> Result<(), StoreError> {
    let runs = store.load_runs().await?;
    let updated: Vec<Vec<String>> = runs
        .into_iter()
        .map(|run| run.into_iter().filter(|id| id != playlist_id).collect())
        .filter(|run: &Vec<String>| !run.is_empty())
        .collect();
    store.save_runs(&updated).await
}

/// Empties the playlist exclusion record.
pub async fn clear_runs<S: ExclusionStore>(store: &mut S) -> Result<(), StoreError> {
    store.save_runs(&[]).await
}

/// How many more random runs the run at `index` (of `total` retained runs)
/// stays excluded for. The most recent run has the full window left. Runs
/// older than the window (possible only in a hand-edited store file) report
/// zero instead of underflowing.
pub fn runs_remaining(index: usize, total: usize) -> usize {
    PLAYLIST_EXCLUSION_RUNS.saturating_sub(total - 1 - index)
}
