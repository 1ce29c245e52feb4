use super::error::{FormatError, ImportError, InvariantViolation};
use super::model::{now_millis, Declaration, DeclarationSink, FolderRecord, PuzzleImportRecord};
use super::outcome::ImportTotals;
use super::progress::{ImportProgress, ProgressListener, ProgressMeter};
use crate::db;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked before every declaration is applied.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One import's write context.
///
/// Holds the storage transaction for its whole life. `finish` commits; every other
/// way out (an error bubbling through `?`, a panic, cancellation) drops the
/// transaction, which rolls it back.
pub struct ImportSession<'c, 'l> {
    tx: Transaction<'c>,
    current_folder: Option<FolderRecord>,
    folder_count: usize,
    puzzle_count: usize,
    meter: ProgressMeter,
    listener: &'l mut dyn ProgressListener,
    cancel: CancelToken,
}

impl<'c, 'l> ImportSession<'c, 'l> {
    pub fn begin(
        conn: &'c mut Connection,
        meter: ProgressMeter,
        listener: &'l mut dyn ProgressListener,
        cancel: CancelToken,
    ) -> Result<Self, ImportError> {
        // Take the write lock now so a second writer fails up front.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self {
            tx,
            current_folder: None,
            folder_count: 0,
            puzzle_count: 0,
            meter,
            listener,
            cancel,
        })
    }

    pub fn create_folder(&mut self, name: &str, created: i64) -> Result<&FolderRecord, ImportError> {
        self.folder_count += 1;
        let folder = db::insert_folder(&self.tx, name, created)?;
        tracing::debug!(folder = %folder.name, id = %folder.id, "created folder");
        Ok(&*self.current_folder.insert(folder))
    }

    /// Makes the folder named `name` current, creating it if needed. Counts as one
    /// folder even when an existing folder is reused.
    pub fn find_or_create_folder(&mut self, name: &str) -> Result<&FolderRecord, ImportError> {
        self.folder_count += 1;
        self.current_folder = None;
        let folder = match db::find_folder_by_name(&self.tx, name)? {
            Some(existing) => {
                tracing::debug!(folder = %existing.name, id = %existing.id, "appending to folder");
                existing
            }
            None => db::insert_folder(&self.tx, name, now_millis())?,
        };
        Ok(&*self.current_folder.insert(folder))
    }

    pub fn import_puzzle(&mut self, puzzle: &PuzzleImportRecord) -> Result<(), ImportError> {
        let Some(folder) = self.current_folder.as_ref() else {
            return Err(InvariantViolation::NoCurrentFolder.into());
        };
        if puzzle.data.trim().is_empty() {
            return Err(FormatError::EmptyBoard.into());
        }
        db::insert_puzzle(&self.tx, &folder.id, puzzle)?;
        self.puzzle_count += 1;
        Ok(())
    }

    pub fn folder_count(&self) -> usize {
        self.folder_count
    }

    pub fn puzzle_count(&self) -> usize {
        self.puzzle_count
    }

    /// Commits if anything was produced. An import that yields nothing is a failure.
    pub fn finish(self) -> Result<ImportTotals, ImportError> {
        if self.folder_count == 0 && self.puzzle_count == 0 {
            return Err(FormatError::NoPuzzlesFound.into());
        }
        self.tx.commit()?;
        Ok(ImportTotals {
            folder_count: self.folder_count,
            puzzle_count: self.puzzle_count,
            current_folder: self.current_folder,
        })
    }

    fn tick(&mut self, percent: Option<u8>) {
        let progress = ImportProgress {
            folders: self.folder_count(),
            puzzles: self.puzzle_count(),
            percent,
        };
        self.listener.on_progress(progress);
    }
}

impl DeclarationSink for ImportSession<'_, '_> {
    fn declare(&mut self, declaration: Declaration) -> Result<(), ImportError> {
        if self.cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        match declaration {
            Declaration::BeginFolder { name, created } => {
                self.create_folder(&name, created.unwrap_or_else(now_millis))?;
            }
            Declaration::AppendFolder { name } => {
                self.find_or_create_folder(&name)?;
            }
            Declaration::Puzzle(puzzle) => self.import_puzzle(&puzzle)?,
        }
        if let Some(percent) = self.meter.on_declaration() {
            self.tick(percent);
        }
        Ok(())
    }

    fn advance(&mut self, position: u64) {
        if let Some(percent) = self.meter.on_position(position) {
            self.tick(percent);
        }
    }

    fn expect_size(&mut self, total_bytes: Option<u64>) {
        self.meter.set_total(total_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::progress::Silent;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::init_schema(&conn).expect("schema");
        conn
    }

    fn board(data: &str) -> PuzzleImportRecord {
        PuzzleImportRecord::from_board(data, 1)
    }

    #[test]
    fn puzzle_before_folder_is_an_invariant_violation() {
        let mut conn = memory_db();
        let mut silent = Silent;
        {
            let mut session =
                ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, CancelToken::new())
                    .expect("begin");
            let err = session.import_puzzle(&board("1.2")).expect_err("must fail");
            assert!(matches!(
                err,
                ImportError::Invariant(InvariantViolation::NoCurrentFolder)
            ));
            assert_eq!(session.puzzle_count(), 0);
        }
        assert_eq!(db::count_rows(&conn, "puzzles").expect("count"), 0);
    }

    #[test]
    fn find_or_create_never_duplicates_a_folder() {
        let mut conn = memory_db();
        let mut silent = Silent;
        let mut session =
            ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, CancelToken::new())
                .expect("begin");
        let first = session.find_or_create_folder("Daily").expect("first").id.clone();
        session.import_puzzle(&board("1")).expect("puzzle");
        let second = session.find_or_create_folder("Daily").expect("second").id.clone();
        assert_eq!(first, second);
        // One increment per request, even when the folder is reused.
        assert_eq!(session.folder_count(), 2);
        session.finish().expect("commit");

        let folders = db::list_folders(&conn).expect("list");
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].puzzle_count, 1);
    }

    #[test]
    fn empty_session_rolls_back_with_no_puzzles_found() {
        let mut conn = memory_db();
        let mut silent = Silent;
        let session =
            ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, CancelToken::new())
                .expect("begin");
        let err = session.finish().expect_err("empty import");
        assert!(matches!(
            err,
            ImportError::Format(FormatError::NoPuzzlesFound)
        ));
    }

    #[test]
    fn dropped_session_leaves_nothing_behind() {
        let mut conn = memory_db();
        let mut silent = Silent;
        {
            let mut session =
                ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, CancelToken::new())
                    .expect("begin");
            session.create_folder("Gone", 5).expect("folder");
            for i in 0..10 {
                session.import_puzzle(&board(&i.to_string())).expect("puzzle");
            }
        }
        assert_eq!(db::count_rows(&conn, "folders").expect("count"), 0);
        assert_eq!(db::count_rows(&conn, "puzzles").expect("count"), 0);
    }

    #[test]
    fn empty_board_is_rejected() {
        let mut conn = memory_db();
        let mut silent = Silent;
        let mut session =
            ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, CancelToken::new())
                .expect("begin");
        session.create_folder("F", 5).expect("folder");
        let err = session.import_puzzle(&board("  ")).expect_err("empty board");
        assert!(matches!(err, ImportError::Format(FormatError::EmptyBoard)));
    }

    #[test]
    fn cancelled_token_stops_the_next_declaration() {
        let mut conn = memory_db();
        let mut silent = Silent;
        let cancel = CancelToken::new();
        let mut session =
            ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut silent, cancel.clone())
                .expect("begin");
        session
            .declare(Declaration::BeginFolder {
                name: "F".into(),
                created: Some(1),
            })
            .expect("folder");
        cancel.cancel();
        let err = session
            .declare(Declaration::Puzzle(board("1")))
            .expect_err("cancelled");
        assert!(matches!(err, ImportError::Cancelled));
    }

    #[test]
    fn declarations_drive_progress_ticks() {
        let mut conn = memory_db();
        let (tx, rx) = std::sync::mpsc::channel();
        let mut listener = tx;
        {
            let mut session =
                ImportSession::begin(&mut conn, ProgressMeter::new(20), &mut listener, CancelToken::new())
                    .expect("begin");
            session.expect_size(Some(100));
            session
                .declare(Declaration::BeginFolder {
                    name: "F".into(),
                    created: None,
                })
                .expect("folder");
            session.declare(Declaration::Puzzle(board("1"))).expect("puzzle");
            session.advance(100);
            session.finish().expect("commit");
        }
        drop(listener);
        let ticks: Vec<ImportProgress> = rx.iter().collect();
        assert_eq!(
            ticks,
            vec![ImportProgress {
                folders: 1,
                puzzles: 1,
                percent: Some(100)
            }]
        );
    }
}
