use std::path::PathBuf;

use super::config::BoardConfig;
use crate::ops::store::{Repair, Store};

/// A fully loaded board: config plus the rehydrated store
#[derive(Debug)]
pub struct Board {
    /// Directory containing `wardboard/`
    pub root: PathBuf,
    /// Path to the `wardboard/` directory
    pub data_dir: PathBuf,
    /// Parsed board.toml
    pub config: BoardConfig,
    pub store: Store,
    /// Fixes applied while loading; recorded once the store is saved
    pub repairs: Vec<Repair>,
}

impl Board {
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.persist.snapshot)
    }
}
