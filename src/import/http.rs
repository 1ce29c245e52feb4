use super::error::TransportError;
use std::io::Read;
use std::time::Duration;

pub type BodyReader = Box<dyn Read + Send + Sync + 'static>;

/// Blocking HTTP client shared by every import in the process.
///
/// Built once at startup and handed to adapters; cloning is cheap and shares the
/// connection pool.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }

    pub fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let response = self.get(url)?;
        response.into_string().map_err(TransportError::Read)
    }

    /// Streams the body. The length comes from `Content-Length` when present.
    pub fn open(&self, url: &str) -> Result<(BodyReader, Option<u64>), TransportError> {
        let response = self.get(url)?;
        let len = response
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok());
        Ok((response.into_reader(), len))
    }

    fn get(&self, url: &str) -> Result<ureq::Response, TransportError> {
        tracing::debug!(%url, "GET");
        match self.agent.get(url).call() {
            Ok(response) if (200..300).contains(&response.status()) => Ok(response),
            Ok(response) => Err(TransportError::Status {
                url: url.to_string(),
                status: response.status(),
            }),
            Err(ureq::Error::Status(status, _)) => Err(TransportError::Status {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(TransportError::Http {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}
