//! WebDAV transfer channel.
//!
//! File and directory content operations (upload, download, move,
//! mkdir) go through the WebDAV endpoint with basic-auth credentials,
//! independent of the cookie/token session on the API channel.

use reqwest::{Body, Client, Method, Response, Url};
use tracing::debug;

use crate::error::{Result, StackError};

/// Path the WebDAV endpoint is rooted at, below the account base URL.
const WEBDAV_ROOT: &str = "/remote.php/webdav";

/// HTTP client for the WebDAV transfer channel.
#[derive(Debug)]
pub struct WebdavClient {
    client: Client,
    base: String,
    username: String,
    password: String,
}

impl WebdavClient {
    /// Create a transfer client below the given account base URL.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: format!("{}{}", base_url.trim_end_matches('/'), WEBDAV_ROOT),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Absolute URL for a remote path, percent-encoding what the URL
    /// grammar does not allow verbatim.
    fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", self.base, path))
            .map_err(|e| StackError::Transfer(format!("Invalid remote path '{}': {}", path, e)))
    }

    /// Download a remote file, returning the raw response for streaming.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(transfer_error)?;
        self.check(response, "download", path)
    }

    /// Upload a body to a remote path.
    pub async fn put(&self, path: &str, body: impl Into<Body>) -> Result<()> {
        let url = self.url(path)?;
        let response = self
            .client
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .body(body)
            .send()
            .await
            .map_err(transfer_error)?;
        self.check(response, "upload", path)?;
        Ok(())
    }

    /// Create a remote directory.
    pub async fn mkcol(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        let response = self
            .client
            .request(Method::from_bytes(b"MKCOL").expect("valid method"), url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(transfer_error)?;
        self.check(response, "mkdir", path)?;
        Ok(())
    }

    /// Move a remote file or directory to a new path.
    pub async fn mv(&self, from: &str, to: &str) -> Result<()> {
        let url = self.url(from)?;
        let destination = self.url(to)?;
        let response = self
            .client
            .request(Method::from_bytes(b"MOVE").expect("valid method"), url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Destination", destination.as_str())
            .header("Overwrite", "T")
            .send()
            .await
            .map_err(transfer_error)?;
        self.check(response, "move", from)?;
        Ok(())
    }

    /// Map non-success statuses to a transfer failure.
    fn check(&self, response: Response, what: &str, path: &str) -> Result<Response> {
        let status = response.status();
        debug!(%status, what, path, "webdav request");
        if status.is_success() {
            Ok(response)
        } else {
            Err(StackError::Transfer(format!(
                "WebDAV {} of '{}' failed with status {}",
                what, path, status
            )))
        }
    }
}

fn transfer_error(err: reqwest::Error) -> StackError {
    StackError::Transfer(err.to_string())
}
