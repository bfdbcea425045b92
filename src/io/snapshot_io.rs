use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::io::config_io::read_config;
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, atomic_write, log_recovery};
use crate::model::bed::Bed;
use crate::model::board::Board;
use crate::model::task::Task;
use crate::ops::store::{Repair, Store};

/// Name of the data directory a board lives in
pub const DATA_DIR: &str = "wardboard";
/// Config file inside the data directory
pub const CONFIG_FILE: &str = "board.toml";
/// Snapshot layout version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Error type for board I/O
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("not a ward board: no wardboard/board.toml found (run `wb init`)")]
    NotABoard,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit board.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("snapshot {path} is unreadable: {source}")]
    SnapshotParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("snapshot version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize snapshot: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Persisted document: the whole bed list with nested tasks, keyed by the
/// store name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub next_bed: usize,
    #[serde(default)]
    pub next_task: usize,
    #[serde(default)]
    pub beds: Vec<Bed>,
    #[serde(default)]
    pub unassigned: Vec<Task>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn of(store: &Store) -> Self {
        let (next_bed, next_task) = store.next_ids();
        Snapshot {
            name: store.name().to_string(),
            version: SNAPSHOT_VERSION,
            next_bed,
            next_task,
            beds: store.beds().to_vec(),
            unassigned: store.unassigned().to_vec(),
        }
    }
}

/// Walk up from `start` looking for a `wardboard/board.toml`.
pub fn discover_board(start: &Path) -> Result<PathBuf, BoardError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DATA_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardError::NotABoard);
        }
    }
}

/// Load config and snapshot from `root`, rehydrating the store. A missing
/// snapshot yields an empty store. Repairs travel with the board until
/// `save_board` persists them.
pub fn load_board(root: &Path) -> Result<Board, BoardError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.join(CONFIG_FILE).is_file() {
        return Err(BoardError::NotABoard);
    }
    let (config, _) = read_config(&data_dir)?;
    let snapshot_path = data_dir.join(&config.persist.snapshot);

    let (store, repairs) = if snapshot_path.exists() {
        let text = fs::read_to_string(&snapshot_path).map_err(|e| BoardError::ReadError {
            path: snapshot_path.clone(),
            source: e,
        })?;
        let snapshot = parse_snapshot(&text).map_err(|e| match e {
            BoardError::SerializeError(source) => BoardError::SnapshotParseError {
                path: snapshot_path.clone(),
                source,
            },
            other => other,
        })?;
        rehydrate(&config.board.name, snapshot)
    } else {
        (Store::new(config.board.name.clone()), Vec::new())
    };

    Ok(Board {
        root: root.to_path_buf(),
        data_dir,
        config,
        store,
        repairs,
    })
}

/// Parse a snapshot document, rejecting versions from the future.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, BoardError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(BoardError::UnsupportedVersion(snapshot.version));
    }
    Ok(snapshot)
}

fn rehydrate(name: &str, snapshot: Snapshot) -> (Store, Vec<Repair>) {
    if snapshot.name != name {
        info!(
            "snapshot was saved as {:?}; board is now named {:?}",
            snapshot.name, name
        );
    }
    let (store, repairs) = Store::rehydrate(
        name,
        snapshot.beds,
        snapshot.unassigned,
        (snapshot.next_bed, snapshot.next_task),
    );
    for repair in &repairs {
        info!("snapshot repair: {}", repair);
    }
    (store, repairs)
}

/// Write the board's store to its snapshot file atomically. On failure the
/// unsaved document goes to the recovery log. Load-time repairs are logged
/// once, by the save that makes them permanent.
pub fn save_board(board: &mut Board) -> Result<(), BoardError> {
    let path = board.snapshot_path();
    let content = serde_json::to_string_pretty(&Snapshot::of(&board.store))?;
    if let Err(e) = atomic_write(&path, content.as_bytes()) {
        log_recovery(
            &board.data_dir,
            RecoveryEntry::new(RecoveryCategory::Write, "snapshot write failed")
                .field("Target", board.config.persist.snapshot.clone())
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(BoardError::WriteError { path, source: e });
    }

    let repairs = std::mem::take(&mut board.repairs);
    if !repairs.is_empty() {
        let lines: Vec<String> = repairs.iter().map(Repair::to_string).collect();
        log_recovery(
            &board.data_dir,
            RecoveryEntry::new(
                RecoveryCategory::Snapshot,
                format!("{} repair(s) applied on load", repairs.len()),
            )
            .field("Board", board.store.name())
            .body(lines.join("\n")),
        );
    }
    Ok(())
}
