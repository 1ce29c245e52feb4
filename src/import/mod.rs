mod error;
mod http;
mod messages;
mod model;
mod outcome;
mod plaintext;
mod progress;
mod session;
mod source;
mod uri;
mod worker;
mod xml;

pub use error::ImportError;
pub use http::HttpClient;
pub use model::{FolderRecord, GameState, PuzzleImportRecord};
pub use outcome::{ImportOutcome, ImportTotals};
pub use progress::{ProgressListener, ProgressMeter, DEFAULT_PROGRESS_UPDATES};
pub use session::{CancelToken, ImportSession};
pub use source::{ImportSource, SourceContext};
pub use uri::UriResolver;
pub use worker::spawn_import;

use rusqlite::Connection;
use std::time::Instant;

/// Runs one import to completion and classifies how it ended.
///
/// Storage changes are committed only when the whole source was consumed and
/// produced something. Every error path leaves storage as it was.
pub fn run_import(
    conn: &mut Connection,
    source: &ImportSource,
    ctx: &SourceContext,
    listener: &mut dyn ProgressListener,
    cancel: &CancelToken,
) -> ImportOutcome {
    let started = Instant::now();
    tracing::info!(kind = source.kind(), "import started");

    let result = execute(conn, source, ctx, listener, cancel);

    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    match result {
        Ok(totals) => {
            tracing::info!(
                folders = totals.folder_count,
                puzzles = totals.puzzle_count,
                "Imported in {:.3} seconds.",
                elapsed.as_secs_f64()
            );
            ImportOutcome::success(totals, elapsed_ms)
        }
        Err(e) => {
            match &e {
                ImportError::Format(_) | ImportError::Transport(_) => {
                    tracing::warn!(kind = source.kind(), error = %e, "import rejected")
                }
                ImportError::Invariant(_) | ImportError::Storage(_) | ImportError::Cancelled => {
                    tracing::error!(kind = source.kind(), error = %e, "import aborted")
                }
            }
            ImportOutcome::failure(&e, elapsed_ms)
        }
    }
}

fn execute(
    conn: &mut Connection,
    source: &ImportSource,
    ctx: &SourceContext,
    listener: &mut dyn ProgressListener,
    cancel: &CancelToken,
) -> Result<ImportTotals, ImportError> {
    let meter = ProgressMeter::new(ctx.progress_updates);
    let mut session = ImportSession::begin(conn, meter, listener, cancel.clone())?;
    source.produce_declarations(ctx, &mut session)?;
    session.finish()
}
