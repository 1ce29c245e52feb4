use std::path::PathBuf;

use crate::config::SidecarConfig;
use crate::import::HttpClient;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Writes one notification line ahead of the response. Fails once the client is gone.
pub type Notify<'a> = dyn FnMut(serde_json::Value) -> std::io::Result<()> + 'a;

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: SidecarConfig,
    pub http: HttpClient,
}

impl AppState {
    pub fn new(config: SidecarConfig) -> Self {
        let http = config.http_client();
        Self {
            workspace: None,
            db: None,
            config,
            http,
        }
    }
}
