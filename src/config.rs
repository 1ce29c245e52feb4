use crate::import::{HttpClient, SourceContext, UriResolver, DEFAULT_PROGRESS_UPDATES};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

pub const CONFIG_ENV: &str = "SUDOKUD_CONFIG";
pub const DEFAULT_HTTP_ENDPOINT: &str = "http://www.ottoarms.com/easy.opensudoku";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SidecarConfig {
    pub http_endpoint: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on progress notifications per import.
    pub progress_updates: u32,
    /// Where `content://` URIs resolve. `<workspace>/content` when unset.
    pub content_root: Option<PathBuf>,
    pub log_level: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            http_endpoint: DEFAULT_HTTP_ENDPOINT.to_string(),
            http_timeout_secs: 30,
            user_agent: format!("sudokud/{}", env!("CARGO_PKG_VERSION")),
            progress_updates: DEFAULT_PROGRESS_UPDATES,
            content_root: None,
            log_level: "info".to_string(),
        }
    }
}

impl SidecarConfig {
    /// Defaults, then the file named by `SUDOKUD_CONFIG`, then `SUDOKUD_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(v) = lookup("SUDOKUD_HTTP_ENDPOINT") {
            self.http_endpoint = v;
        }
        if let Some(v) = lookup("SUDOKUD_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("SUDOKUD_HTTP_TIMEOUT_SECS is not a number: {}", v))?;
        }
        if let Some(v) = lookup("SUDOKUD_PROGRESS_UPDATES") {
            self.progress_updates = v
                .trim()
                .parse()
                .with_context(|| format!("SUDOKUD_PROGRESS_UPDATES is not a number: {}", v))?;
        }
        if let Some(v) = lookup("SUDOKUD_CONTENT_ROOT") {
            self.content_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SUDOKUD_LOG") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors: Vec<String> = Vec::new();
        if self.http_endpoint.trim().is_empty() {
            errors.push("httpEndpoint must not be empty".to_string());
        }
        if self.http_timeout_secs == 0 {
            errors.push("httpTimeoutSecs must be positive".to_string());
        }
        if self.progress_updates == 0 {
            errors.push("progressUpdates must be positive".to_string());
        }
        if self.log_level().is_none() {
            errors.push(format!("unknown log level: {}", self.log_level));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("invalid configuration: {}", errors.join("; "))
        }
    }

    pub fn log_level(&self) -> Option<Level> {
        self.log_level.trim().parse().ok()
    }

    pub fn http_client(&self) -> HttpClient {
        HttpClient::new(Duration::from_secs(self.http_timeout_secs), &self.user_agent)
    }

    pub fn content_root_for(&self, workspace: &Path) -> PathBuf {
        self.content_root
            .clone()
            .unwrap_or_else(|| workspace.join("content"))
    }

    pub fn source_context(&self, http: &HttpClient, workspace: &Path) -> SourceContext {
        SourceContext {
            http: http.clone(),
            default_endpoint: self.http_endpoint.clone(),
            resolver: UriResolver::new(self.content_root_for(workspace)),
            progress_updates: self.progress_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = SidecarConfig::default();
        config.validate().expect("valid");
        assert_eq!(config.http_endpoint, DEFAULT_HTTP_ENDPOINT);
        assert_eq!(config.progress_updates, 20);
        assert_eq!(config.log_level(), Some(Level::INFO));
        assert_eq!(
            config.content_root_for(Path::new("/ws")),
            PathBuf::from("/ws/content")
        );
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: SidecarConfig =
            serde_json::from_str(r#"{ "httpTimeoutSecs": 5, "contentRoot": "/srv/content" }"#)
                .expect("parse");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.http_endpoint, DEFAULT_HTTP_ENDPOINT);
        assert_eq!(
            config.content_root_for(Path::new("/ws")),
            PathBuf::from("/srv/content")
        );
    }

    #[test]
    fn environment_overrides_win() {
        let mut config = SidecarConfig::default();
        config
            .apply_overrides(env(&[
                ("SUDOKUD_HTTP_ENDPOINT", "http://127.0.0.1:1/x.opensudoku"),
                ("SUDOKUD_PROGRESS_UPDATES", "5"),
                ("SUDOKUD_LOG", "debug"),
            ]))
            .expect("overrides");
        assert_eq!(config.http_endpoint, "http://127.0.0.1:1/x.opensudoku");
        assert_eq!(config.progress_updates, 5);
        assert_eq!(config.log_level(), Some(Level::DEBUG));
    }

    #[test]
    fn bad_values_are_reported_together() {
        let mut config = SidecarConfig::default();
        assert!(config
            .apply_overrides(env(&[("SUDOKUD_HTTP_TIMEOUT_SECS", "soon")]))
            .is_err());

        config.progress_updates = 0;
        config.log_level = "chatty".into();
        let message = config.validate().expect_err("invalid").to_string();
        assert!(message.contains("progressUpdates"));
        assert!(message.contains("chatty"));
    }
}
