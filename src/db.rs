use crate::import::{FolderRecord, GameState, PuzzleImportRecord};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "sudoku.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS folders(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0),
            created INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_folders_name ON folders(name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS puzzles(
            id TEXT PRIMARY KEY,
            folder_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created INTEGER NOT NULL,
            state INTEGER NOT NULL,
            time INTEGER NOT NULL,
            last_played INTEGER NOT NULL,
            note TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(folder_id) REFERENCES folders(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_puzzles_folder ON puzzles(folder_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_puzzles_folder_sort ON puzzles(folder_id, sort_order)",
        [],
    )?;

    Ok(())
}

pub fn insert_folder(conn: &Connection, name: &str, created: i64) -> rusqlite::Result<FolderRecord> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO folders(id, name, created) VALUES(?, ?, ?)",
        (&id, name, created),
    )?;
    Ok(FolderRecord {
        id,
        name: name.to_string(),
        created,
    })
}

/// Exact-name lookup. When several folders share a name the oldest wins.
pub fn find_folder_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<FolderRecord>> {
    conn.query_row(
        "SELECT id, name, created FROM folders WHERE name = ? ORDER BY created, rowid LIMIT 1",
        [name],
        |row| {
            Ok(FolderRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn insert_puzzle(
    conn: &Connection,
    folder_id: &str,
    puzzle: &PuzzleImportRecord,
) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    // Appended puzzles keep their input order behind whatever the folder already holds.
    let sort_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM puzzles WHERE folder_id = ?",
        [folder_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO puzzles(id, folder_id, data, created, state, time, last_played, note, sort_order)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            folder_id,
            &puzzle.data,
            puzzle.created,
            puzzle.state.code(),
            puzzle.elapsed_ms,
            puzzle.last_played,
            &puzzle.note,
            sort_order,
        ),
    )?;
    Ok(id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
    pub created: i64,
    pub puzzle_count: i64,
}

pub fn list_folders(conn: &Connection) -> rusqlite::Result<Vec<FolderSummary>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.name, f.created, COUNT(p.id)
         FROM folders f
         LEFT JOIN puzzles p ON p.folder_id = f.id
         GROUP BY f.id
         ORDER BY f.created, f.rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(FolderSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            created: row.get(2)?,
            puzzle_count: row.get(3)?,
        })
    })?;
    rows.collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPuzzle {
    pub id: String,
    pub data: String,
    pub created: i64,
    pub state: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_label: Option<&'static str>,
    pub time: i64,
    pub last_played: i64,
    pub note: String,
}

pub fn list_puzzles(conn: &Connection, folder_id: &str) -> rusqlite::Result<Vec<StoredPuzzle>> {
    let mut stmt = conn.prepare(
        "SELECT id, data, created, state, time, last_played, note
         FROM puzzles
         WHERE folder_id = ?
         ORDER BY sort_order",
    )?;
    let rows = stmt.query_map([folder_id], |row| {
        Ok(StoredPuzzle {
            id: row.get(0)?,
            data: row.get(1)?,
            created: row.get(2)?,
            state: row.get(3)?,
            state_label: GameState(row.get(3)?).label(),
            time: row.get(4)?,
            last_played: row.get(5)?,
            note: row.get(6)?,
        })
    })?;
    rows.collect()
}

pub fn folder_exists(conn: &Connection, folder_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM folders WHERE id = ?", [folder_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    conn.query_row(&sql, [], |row| row.get(0))
}
