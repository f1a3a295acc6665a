//! Primary HTTP channel for the STACK web API.
//!
//! All API calls share one cookie session and carry the anti-forgery
//! token the web interface expects on state-changing endpoints.

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{Client, Method, RequestBuilder, Response, redirect};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{Result, StackError};

/// User agent advertised on every request unless disabled.
const USER_AGENT: &str = concat!("rust-stack-api/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the STACK API channel.
///
/// Redirects are never followed: `POST /login` signals success with a
/// 301/302 and the caller needs to observe that status.
#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base: String,
    expose_agent: AtomicBool,
    csrf: OnceCell<String>,
}

impl ApiClient {
    /// Create a client rooted at the given base URL (no trailing slash).
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            expose_agent: AtomicBool::new(true),
            csrf: OnceCell::new(),
        })
    }

    /// Base URL this client is rooted at, e.g. `https://user.stackstorage.com`.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Enable or disable the descriptive `User-Agent` header.
    pub fn set_expose_agent(&self, expose: bool) {
        self.expose_agent.store(expose, Ordering::Relaxed);
    }

    /// GET a path with query parameters, attaching the anti-forgery token.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let builder = self
            .client
            .request(Method::GET, format!("{}{}", self.base, path))
            .query(query);
        self.send(builder, true).await
    }

    /// GET a path without the anti-forgery token (login page, logout).
    pub async fn get_raw(&self, path: &str) -> Result<Response> {
        let builder = self
            .client
            .request(Method::GET, format!("{}{}", self.base, path));
        self.send(builder, false).await
    }

    /// POST a form body without the anti-forgery token (login).
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        let builder = self
            .client
            .request(Method::POST, format!("{}{}", self.base, path))
            .form(form);
        self.send(builder, false).await
    }

    /// POST a JSON body with the anti-forgery token attached.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        let builder = self
            .client
            .request(Method::POST, format!("{}{}", self.base, path))
            .json(body);
        self.send(builder, true).await
    }

    /// Attach headers and issue the request.
    ///
    /// Non-2xx responses are returned as-is; each endpoint interprets
    /// its own status codes.
    async fn send(&self, mut builder: RequestBuilder, csrf: bool) -> Result<Response> {
        if self.expose_agent.load(Ordering::Relaxed) {
            builder = builder.header("User-Agent", USER_AGENT);
        }

        if csrf {
            let token = self.csrf_token().await?;
            builder = builder.header("X-CSRF-Token", token);
        }

        let response = builder.send().await?;
        debug!(status = %response.status(), url = %response.url(), "api request");
        Ok(response)
    }

    /// Fetch the anti-forgery token, caching it for the client lifetime.
    ///
    /// The token is scraped from the `csrf-token` meta tag on the file
    /// listing page. There is no refresh: a token the server expires
    /// mid-session makes further authenticated calls fail.
    async fn csrf_token(&self) -> Result<&str> {
        let token = self
            .csrf
            .get_or_try_init(|| async {
                let response = Box::pin(self.get_raw("/files")).await?;
                let html = response.text().await?;
                extract_meta_content(&html, "csrf-token").ok_or_else(|| {
                    StackError::Transfer("No csrf-token meta tag on /files page".to_string())
                })
            })
            .await?;

        Ok(token)
    }
}

/// Pull the `content` attribute out of a named `<meta>` tag.
fn extract_meta_content(html: &str, name: &str) -> Option<String> {
    let needle = format!("name=\"{}\"", name);
    let at = html.find(&needle)?;

    let tag_start = html[..at].rfind('<')?;
    let tag_end = at + html[at..].find('>')?;
    let tag = &html[tag_start..tag_end];

    let content = tag.find("content=\"")? + "content=\"".len();
    let rest = &tag[content..];
    let end = rest.find('"')?;
    Some(rest[..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_meta_content() {
        let html = r#"<html><head>
            <meta charset="utf-8">
            <meta name="csrf-token" content="abc123token">
            </head><body></body></html>"#;
        assert_eq!(
            extract_meta_content(html, "csrf-token"),
            Some("abc123token".to_string())
        );
    }

    #[test]
    fn test_extract_meta_content_attribute_order() {
        let html = r#"<meta content=" spaced-token " name="csrf-token">"#;
        assert_eq!(
            extract_meta_content(html, "csrf-token"),
            Some("spaced-token".to_string())
        );
    }

    #[test]
    fn test_extract_meta_content_missing() {
        assert_eq!(extract_meta_content("<html></html>", "csrf-token"), None);
        assert_eq!(
            extract_meta_content(r#"<meta name="other" content="x">"#, "csrf-token"),
            None
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://example.stackstorage.com/").unwrap();
        assert_eq!(client.base_url(), "https://example.stackstorage.com");
    }
}
