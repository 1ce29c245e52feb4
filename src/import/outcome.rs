use super::error::{FormatError, ImportError};
use super::messages;
use super::model::FolderRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    PartialFormatError,
    Fatal,
}

/// What a committed session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTotals {
    pub folder_count: usize,
    pub puzzle_count: usize,
    pub current_folder: Option<FolderRecord>,
}

/// The single terminal result of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub kind: OutcomeKind,
    pub successful: bool,
    pub affected_folder_id: Option<String>,
    pub affected_folder_name: Option<String>,
    pub error_code: Option<&'static str>,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub folder_count: usize,
    pub puzzle_count: usize,
    pub elapsed_ms: u64,
}

impl ImportOutcome {
    pub fn success(totals: ImportTotals, elapsed_ms: u64) -> Self {
        // Callers only navigate straight to a folder when exactly one was produced.
        let affected = if totals.folder_count == 1 {
            totals.current_folder
        } else {
            None
        };
        Self {
            kind: OutcomeKind::Success,
            successful: true,
            affected_folder_id: affected.as_ref().map(|f| f.id.clone()),
            affected_folder_name: affected.map(|f| f.name),
            error_code: None,
            error_message: None,
            error_detail: None,
            folder_count: totals.folder_count,
            puzzle_count: totals.puzzle_count,
            elapsed_ms,
        }
    }

    pub fn failure(err: &ImportError, elapsed_ms: u64) -> Self {
        let (kind, code, message) = classify(err);
        let detail = match err {
            // Internal failures stay in the log.
            ImportError::Invariant(_) | ImportError::Storage(_) => None,
            _ => Some(err.to_string()).filter(|d| d.as_str() != message),
        };
        Self {
            kind,
            successful: false,
            affected_folder_id: None,
            affected_folder_name: None,
            error_code: Some(code),
            error_message: Some(message.to_string()),
            error_detail: detail,
            folder_count: 0,
            puzzle_count: 0,
            elapsed_ms,
        }
    }

    pub fn fatal(elapsed_ms: u64) -> Self {
        Self {
            kind: OutcomeKind::Fatal,
            successful: false,
            affected_folder_id: None,
            affected_folder_name: None,
            error_code: Some("unknown_import_error"),
            error_message: Some(messages::UNKNOWN_IMPORT_ERROR.to_string()),
            error_detail: None,
            folder_count: 0,
            puzzle_count: 0,
            elapsed_ms,
        }
    }

    /// Short text suitable for a toast.
    pub fn summary(&self) -> Option<String> {
        if !self.successful {
            return self.error_message.clone();
        }
        match (self.folder_count, self.affected_folder_name.as_deref()) {
            (1, Some(name)) => Some(messages::puzzles_saved(name)),
            (n, _) if n > 1 => Some(messages::folders_created(n)),
            _ => None,
        }
    }
}

fn classify(err: &ImportError) -> (OutcomeKind, &'static str, &'static str) {
    match err {
        ImportError::Format(FormatError::UnknownVersion(_)) => (
            OutcomeKind::PartialFormatError,
            "unknown_version",
            messages::UNKNOWN_VERSION,
        ),
        ImportError::Format(FormatError::NoPuzzlesFound) => (
            OutcomeKind::PartialFormatError,
            "no_puzzles_found",
            messages::NO_PUZZLES_FOUND,
        ),
        ImportError::Format(_) => (
            OutcomeKind::PartialFormatError,
            "invalid_format",
            messages::INVALID_FORMAT,
        ),
        ImportError::Transport(_) => (
            OutcomeKind::PartialFormatError,
            "transport_failed",
            messages::TRANSPORT_FAILED,
        ),
        ImportError::Cancelled => (OutcomeKind::Fatal, "cancelled", messages::IMPORT_CANCELLED),
        ImportError::Invariant(_) | ImportError::Storage(_) => (
            OutcomeKind::Fatal,
            "unknown_import_error",
            messages::UNKNOWN_IMPORT_ERROR,
        ),
    }
}
