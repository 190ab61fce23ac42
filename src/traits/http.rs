use anyhow::{Context, Result, bail};
use std::time::Duration;

/// HTTP client trait for testing
pub trait HttpClient: Send + Sync {
    /// Fetch a URL as text
    fn get_text(&self, url: &str) -> Result<String>;

    /// Fetch a URL as raw bytes
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Real HTTP client using reqwest
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docker-menu/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<reqwest::blocking::Response> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            bail!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            );
        }

        Ok(response)
    }
}

impl HttpClient for ReqwestClient {
    fn get_text(&self, url: &str) -> Result<String> {
        self.fetch(url)?
            .text()
            .with_context(|| format!("Failed to read response body from: {}", url))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .fetch(url)?
            .bytes()
            .with_context(|| format!("Failed to read response body from: {}", url))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
type MockResponse = std::result::Result<Vec<u8>, String>;

/// Mock HTTP client serving canned bodies per URL
#[cfg(test)]
pub struct MockHttpClient {
    responses: std::sync::Mutex<std::collections::HashMap<String, MockResponse>>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::HashMap::new()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` for `url`
    pub fn with_response(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.into()));
        self
    }

    /// Fail every request to `url`
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error.to_string()));
        self
    }

    /// Every URL requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl HttpClient for MockHttpClient {
    fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url)?;
        String::from_utf8(bytes).with_context(|| format!("Response from {} is not UTF-8", url))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(error)) => Err(anyhow::anyhow!("{}", error)),
            None => bail!("HTTP request failed with status 404 Not Found: {}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serves_configured_body() {
        let client = MockHttpClient::new().with_response("http://repo.test/README", "help text");
        assert_eq!(client.get_text("http://repo.test/README").unwrap(), "help text");
        assert_eq!(client.requests(), vec!["http://repo.test/README"]);
    }

    #[test]
    fn test_mock_errors() {
        let client = MockHttpClient::new().with_error("http://repo.test/a", "Connection refused");
        assert!(client.get_bytes("http://repo.test/a").is_err());
        assert!(client.get_bytes("http://repo.test/unknown").is_err());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new(Duration::from_secs(5)).is_ok());
    }
}
