use super::error::ImportError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub created: i64,
}

/// Game state code. The gameplay side owns the meaning of codes other than
/// `NOT_STARTED`; anything decoded is stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState(pub i64);

impl GameState {
    pub const NOT_STARTED: GameState = GameState(0);
    pub const PLAYING: GameState = GameState(1);
    pub const SOLVED: GameState = GameState(2);

    pub fn code(self) -> i64 {
        self.0
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::NOT_STARTED => Some("not_started"),
            Self::PLAYING => Some("playing"),
            Self::SOLVED => Some("solved"),
            _ => None,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::NOT_STARTED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleImportRecord {
    pub data: String,
    pub created: i64,
    pub state: GameState,
    pub elapsed_ms: i64,
    pub last_played: i64,
    pub note: String,
}

impl PuzzleImportRecord {
    /// A puzzle carrying only its board, every other field at its default.
    pub fn from_board(data: impl Into<String>, now_ms: i64) -> Self {
        Self {
            data: data.into(),
            created: now_ms,
            state: GameState::NOT_STARTED,
            elapsed_ms: 0,
            last_played: 0,
            note: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Always creates a new folder and makes it current.
    BeginFolder { name: String, created: Option<i64> },
    /// Reuses the oldest folder with this exact name, creating it when absent.
    AppendFolder { name: String },
    Puzzle(PuzzleImportRecord),
}

/// Receiver of decoded declarations, applied in input order as they are recognized.
pub trait DeclarationSink {
    fn declare(&mut self, declaration: Declaration) -> Result<(), ImportError>;

    /// Advisory: how far into the input the producer has read, in bytes.
    fn advance(&mut self, _position: u64) {}

    /// Advisory: input size in bytes, when the producer knows it.
    fn expect_size(&mut self, _total_bytes: Option<u64>) {}
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
