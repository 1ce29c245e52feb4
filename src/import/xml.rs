//! Streaming decoder for `.opensudoku` XML documents.
//!
//! Two schemas share the `<opensudoku>` root. Without a `version` attribute the
//! legacy layout applies: folder names are the text of `<name>` elements and each
//! `<game data="..."/>` is a puzzle with default fields. `version="2"` carries
//! everything in attributes: `<folder name created>` and
//! `<game created state time last_played data note>`.
//!
//! Declarations go to the sink in document order as soon as each element is
//! seen. Nothing is buffered and nothing is revisited.

use super::error::{FormatError, ImportError};
use super::model::{Declaration, DeclarationSink, GameState, PuzzleImportRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;

const ROOT_ELEMENT: &[u8] = b"opensudoku";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    Legacy,
    V2,
}

/// Element the scanner is currently inside. The innermost scope is the state.
#[derive(Debug)]
enum Scope {
    Root,
    Folder,
    Game,
    /// Legacy folder name, collected until the element closes.
    Name(String),
    Other,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Done,
}

struct Scanner<'s> {
    schema: Option<Schema>,
    scopes: Vec<Scope>,
    sink: &'s mut dyn DeclarationSink,
    now_ms: i64,
}

pub fn decode_xml<R: BufRead>(
    input: R,
    sink: &mut dyn DeclarationSink,
    now_ms: i64,
) -> Result<(), ImportError> {
    let mut reader = Reader::from_reader(input);
    let mut scanner = Scanner {
        schema: None,
        scopes: Vec::new(),
        sink,
        now_ms,
    };
    let mut buf = Vec::with_capacity(4096);

    loop {
        let flow = match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => scanner.on_start(e, false)?,
            Event::Empty(ref e) => scanner.on_start(e, true)?,
            Event::Text(ref e) => scanner.on_text(&e.unescape()?),
            Event::CData(ref e) => scanner.on_text(&String::from_utf8_lossy(e)),
            Event::End(_) => scanner.on_end()?,
            Event::Eof => Flow::Done,
            _ => Flow::Continue,
        };
        scanner.sink.advance(reader.buffer_position() as u64);
        if flow == Flow::Done {
            return Ok(());
        }
        buf.clear();
    }
}

impl Scanner<'_> {
    fn on_start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<Flow, ImportError> {
        let Some(schema) = self.schema else {
            return self.on_root(e, empty);
        };

        let scope = match (schema, e.name().as_ref()) {
            (Schema::Legacy, b"game") => {
                let data = required_attr(e, "game", "data")?;
                self.emit(Declaration::Puzzle(PuzzleImportRecord::from_board(
                    data,
                    self.now_ms,
                )))?;
                Scope::Game
            }
            (Schema::Legacy, b"name") => Scope::Name(String::new()),
            (Schema::V2, b"folder") => {
                let name = required_attr(e, "folder", "name")?;
                let created = optional_number(e, "created")?;
                self.emit(Declaration::BeginFolder { name, created })?;
                Scope::Folder
            }
            (Schema::V2, b"game") => {
                let puzzle = self.v2_game(e)?;
                self.emit(Declaration::Puzzle(puzzle))?;
                Scope::Game
            }
            _ => Scope::Other,
        };

        if !empty {
            self.scopes.push(scope);
        }
        Ok(Flow::Continue)
    }

    fn on_root(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<Flow, ImportError> {
        if e.name().as_ref() != ROOT_ELEMENT {
            return Err(FormatError::InvalidFormat.into());
        }
        let schema = match text_attr(e, "version")?.as_deref() {
            None => Schema::Legacy,
            Some("2") => Schema::V2,
            Some(other) => return Err(FormatError::UnknownVersion(other.to_string()).into()),
        };
        tracing::debug!(?schema, "decoding opensudoku document");
        self.schema = Some(schema);
        if empty {
            return Ok(Flow::Done);
        }
        self.scopes.push(Scope::Root);
        Ok(Flow::Continue)
    }

    fn on_text(&mut self, text: &str) -> Flow {
        if let Some(Scope::Name(buf)) = self.scopes.last_mut() {
            buf.push_str(text);
        }
        Flow::Continue
    }

    fn on_end(&mut self) -> Result<Flow, ImportError> {
        match self.scopes.pop() {
            Some(Scope::Name(text)) => {
                let name = text.trim();
                if !name.is_empty() {
                    self.emit(Declaration::BeginFolder {
                        name: name.to_string(),
                        created: None,
                    })?;
                }
            }
            Some(Scope::Root) | None => return Ok(Flow::Done),
            Some(Scope::Folder | Scope::Game | Scope::Other) => {}
        }
        Ok(Flow::Continue)
    }

    fn v2_game(&self, e: &BytesStart<'_>) -> Result<PuzzleImportRecord, ImportError> {
        Ok(PuzzleImportRecord {
            created: number_or(e, "created", self.now_ms)?,
            state: GameState(number_or(e, "state", GameState::NOT_STARTED.code())?),
            elapsed_ms: number_or(e, "time", 0)?,
            last_played: number_or(e, "last_played", 0)?,
            data: required_attr(e, "game", "data")?,
            note: text_attr(e, "note")?.unwrap_or_default(),
        })
    }

    fn emit(&mut self, declaration: Declaration) -> Result<(), ImportError> {
        self.sink.declare(declaration)
    }
}

fn text_attr(e: &BytesStart<'_>, attribute: &str) -> Result<Option<String>, ImportError> {
    match e
        .try_get_attribute(attribute)
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_attr(
    e: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, ImportError> {
    text_attr(e, attribute)?.ok_or_else(|| {
        FormatError::MissingAttribute {
            element,
            attribute,
        }
        .into()
    })
}

// Absence means "use the default"; a present value must be a number.
fn optional_number(e: &BytesStart<'_>, attribute: &'static str) -> Result<Option<i64>, ImportError> {
    match text_attr(e, attribute)? {
        None => Ok(None),
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
            FormatError::MalformedNumber {
                attribute,
                value: raw,
            }
            .into()
        }),
    }
}

fn number_or(e: &BytesStart<'_>, attribute: &'static str, default: i64) -> Result<i64, ImportError> {
    Ok(optional_number(e, attribute)?.unwrap_or(default))
}
