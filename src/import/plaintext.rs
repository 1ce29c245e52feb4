// One board per line, blank lines skipped, no header. Lines are passed through
// as-is; board syntax is checked elsewhere.

use super::error::{ImportError, TransportError};
use super::model::{Declaration, DeclarationSink, PuzzleImportRecord};
use std::io::BufRead;

pub fn decode_lines<R: BufRead>(
    mut input: R,
    folder_name: &str,
    sink: &mut dyn DeclarationSink,
    now_ms: i64,
) -> Result<(), ImportError> {
    sink.declare(Declaration::BeginFolder {
        name: folder_name.to_string(),
        created: None,
    })?;

    let mut line = String::new();
    let mut position = 0u64;
    loop {
        line.clear();
        let read = input.read_line(&mut line).map_err(TransportError::Read)?;
        if read == 0 {
            break;
        }
        position += read as u64;

        let board = line.trim_end_matches(['\n', '\r']);
        if !board.is_empty() {
            sink.declare(Declaration::Puzzle(PuzzleImportRecord::from_board(
                board, now_ms,
            )))?;
        }
        sink.advance(position);
    }
    Ok(())
}
