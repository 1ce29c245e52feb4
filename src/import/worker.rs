use super::outcome::ImportOutcome;
use super::progress::ImportProgress;
use super::session::CancelToken;
use super::source::{ImportSource, SourceContext};
use rusqlite::Connection;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// A running import. The connection travels with the worker and comes back from
/// `wait`, so nothing else can write while the import is in flight.
pub struct ImportHandle {
    progress: Receiver<ImportProgress>,
    cancel: CancelToken,
    join: JoinHandle<(Connection, ImportOutcome)>,
}

pub fn spawn_import(
    conn: Connection,
    source: ImportSource,
    ctx: SourceContext,
) -> std::io::Result<ImportHandle> {
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let join = thread::Builder::new()
        .name("sudoku-import".into())
        .spawn(move || {
            let mut conn = conn;
            let mut listener = tx;
            let started = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                super::run_import(&mut conn, &source, &ctx, &mut listener, &worker_cancel)
            }));
            let outcome = result.unwrap_or_else(|_| {
                tracing::error!(kind = source.kind(), "import worker panicked");
                ImportOutcome::fatal(started.elapsed().as_millis() as u64)
            });
            (conn, outcome)
        })?;
    Ok(ImportHandle {
        progress: rx,
        cancel,
        join,
    })
}

impl ImportHandle {
    /// Ticks as they arrive. Ends when the worker is done.
    pub fn progress(&self) -> impl Iterator<Item = ImportProgress> + '_ {
        self.progress.iter()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn wait(self) -> anyhow::Result<(Connection, ImportOutcome)> {
        self.join
            .join()
            .map_err(|_| anyhow::anyhow!("import worker did not return its connection"))
    }
}
