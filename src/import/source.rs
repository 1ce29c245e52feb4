use super::error::ImportError;
use super::http::HttpClient;
use super::model::{now_millis, Declaration, DeclarationSink, PuzzleImportRecord};
use super::plaintext::decode_lines;
use super::uri::{self, UriResolver};
use super::xml::decode_xml;
use serde::Deserialize;
use std::io::BufReader;

pub const FALLBACK_FOLDER_NAME: &str = "Imported puzzles";

/// Everything an adapter may touch besides the session.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub http: HttpClient,
    pub default_endpoint: String,
    pub resolver: UriResolver,
    pub progress_updates: u32,
}

/// Where an import reads from. Deserialized straight from IPC params.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ImportSource {
    /// Boards passed inline, one per line.
    Extras {
        folder_name: String,
        games: String,
        #[serde(default)]
        append_to_folder: bool,
    },
    /// `.opensudoku` XML fetched over HTTP; the configured endpoint when `url` is absent.
    Http {
        #[serde(default)]
        url: Option<String>,
    },
    /// `.opensudoku` XML behind a file, content or http URI.
    File { uri: String },
    /// One board per line behind a URI, filed under the URI's last path segment.
    Plaintext { uri: String },
}

impl ImportSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ImportSource::Extras { .. } => "extras",
            ImportSource::Http { .. } => "http",
            ImportSource::File { .. } => "file",
            ImportSource::Plaintext { .. } => "plaintext",
        }
    }

    pub fn produce_declarations(
        &self,
        ctx: &SourceContext,
        sink: &mut dyn DeclarationSink,
    ) -> Result<(), ImportError> {
        let now_ms = now_millis();
        match self {
            ImportSource::Extras {
                folder_name,
                games,
                append_to_folder,
            } => {
                let folder = if *append_to_folder {
                    Declaration::AppendFolder {
                        name: folder_name.clone(),
                    }
                } else {
                    Declaration::BeginFolder {
                        name: folder_name.clone(),
                        created: None,
                    }
                };
                sink.declare(folder)?;
                for game in games.split('\n') {
                    let game = game.trim_end_matches('\r');
                    if game.is_empty() {
                        continue;
                    }
                    sink.declare(Declaration::Puzzle(PuzzleImportRecord::from_board(
                        game, now_ms,
                    )))?;
                }
                Ok(())
            }
            ImportSource::Http { url } => {
                let url = url.as_deref().unwrap_or(&ctx.default_endpoint);
                let body = ctx.http.fetch_text(url)?;
                sink.expect_size(Some(body.len() as u64));
                decode_xml(body.as_bytes(), sink, now_ms)
            }
            ImportSource::File { uri } => {
                let locator = uri::parse_locator(uri)?;
                let (reader, len) = ctx.resolver.open(&locator, &ctx.http)?;
                sink.expect_size(len);
                decode_xml(BufReader::new(reader), sink, now_ms)
            }
            ImportSource::Plaintext { uri } => {
                let locator = uri::parse_locator(uri)?;
                let folder_name = uri::display_name(&locator)
                    .unwrap_or_else(|| FALLBACK_FOLDER_NAME.to_string());
                let (reader, len) = ctx.resolver.open(&locator, &ctx.http)?;
                sink.expect_size(len);
                decode_lines(BufReader::new(reader), &folder_name, sink, now_ms)
            }
        }
    }
}
