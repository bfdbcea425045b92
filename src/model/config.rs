use serde::{Deserialize, Serialize};

use crate::parse::Grammar;

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub persist: PersistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    /// Store name; also the key written into the snapshot
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Which shorthand grammar `wb add` uses
    #[serde(default)]
    pub grammar: Grammar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistConfig {
    /// Snapshot file name, relative to the data directory
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        PersistConfig {
            snapshot: default_snapshot(),
        }
    }
}

fn default_snapshot() -> String {
    "board.json".to_string()
}
