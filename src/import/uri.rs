use super::error::TransportError;
use super::http::HttpClient;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

pub type SourceReader = Box<dyn Read + Send>;

/// Where a locator points once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    File(PathBuf),
    /// `content://authority/path`, looked up under the content root.
    Content { authority: String, segments: Vec<String> },
    Remote(Url),
}

pub fn parse_locator(uri: &str) -> Result<Locator, TransportError> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(TransportError::InvalidUri(uri.to_string()));
    }
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => return Ok(Locator::File(PathBuf::from(uri))),
        Err(_) => return Err(TransportError::InvalidUri(uri.to_string())),
    };
    match url.scheme() {
        "file" => url
            .to_file_path()
            .map(Locator::File)
            .map_err(|_| TransportError::InvalidUri(uri.to_string())),
        "content" => {
            let authority = url.host_str().unwrap_or_default().to_string();
            let segments = decoded_segments(&url);
            if !is_plain_segment(&authority)
                || segments.is_empty()
                || !segments.iter().all(|s| is_plain_segment(s))
            {
                return Err(TransportError::InvalidUri(uri.to_string()));
            }
            Ok(Locator::Content {
                authority,
                segments,
            })
        }
        "http" | "https" => Ok(Locator::Remote(url)),
        // A drive letter such as `C:\puzzles.sdm` parses as a one-letter scheme.
        scheme if scheme.len() == 1 => Ok(Locator::File(PathBuf::from(uri))),
        other => Err(TransportError::UnsupportedScheme(other.to_string())),
    }
}

/// Last non-empty path segment, used to name folders after their source.
pub fn display_name(locator: &Locator) -> Option<String> {
    let name = match locator {
        Locator::File(path) => path.file_name()?.to_string_lossy().into_owned(),
        Locator::Content { segments, .. } => segments.last()?.clone(),
        Locator::Remote(url) => decoded_segments(url).pop()?,
    };
    Some(name).filter(|n| !n.trim().is_empty())
}

/// Opens locators for reading. Content URIs resolve below `content_root`.
#[derive(Debug, Clone)]
pub struct UriResolver {
    content_root: PathBuf,
}

impl UriResolver {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    pub fn content_path(&self, authority: &str, segments: &[String]) -> PathBuf {
        let mut path = self.content_root.join(authority);
        for segment in segments {
            path.push(segment);
        }
        path
    }

    pub fn open(
        &self,
        locator: &Locator,
        http: &HttpClient,
    ) -> Result<(SourceReader, Option<u64>), TransportError> {
        match locator {
            Locator::File(path) => open_file(path),
            Locator::Content {
                authority,
                segments,
            } => open_file(&self.content_path(authority, segments)),
            Locator::Remote(url) => {
                let (body, len) = http.open(url.as_str())?;
                let reader: SourceReader = body;
                Ok((reader, len))
            }
        }
    }
}

fn open_file(path: &Path) -> Result<(SourceReader, Option<u64>), TransportError> {
    let io_err = |source| TransportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let reader: SourceReader = Box::new(file);
    Ok((reader, Some(len)))
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

fn decoded_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(percent_decode)
                .collect()
        })
        .unwrap_or_default()
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
