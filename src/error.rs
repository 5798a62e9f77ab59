//! Fatal engine errors.
//!
//! Everything here means corrupt or missing game data (or an unusable save
//! file). Expected failures such as "no route" are plain `Option`s and never
//! show up in this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("event queue exhausted ({capacity} events in use)")]
    EventQueueFull { capacity: usize },

    #[error("unknown action list {0}")]
    UnknownActionList(usize),

    #[error("unknown action {index} in list {list}")]
    UnknownAction { list: usize, index: usize },

    #[error("unknown object {0}")]
    UnknownObject(usize),

    #[error("unknown screen {0}")]
    UnknownScreen(usize),

    #[error("maze crossed but game data has no maze list")]
    MissingMazeList,

    #[error("corrupt save data: {0}")]
    CorruptSave(String),

    #[error("game data error: {0}")]
    GameData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
