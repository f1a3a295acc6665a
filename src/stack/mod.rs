//! Session façade: login lifecycle, working directory, and the
//! operations composing the two HTTP channels.

mod browse;
mod transfer;
mod users;

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{Result, StackError};
use crate::http::ApiClient;
use crate::webdav::WebdavClient;

pub use browse::Order;

/// Default page size for file listings.
pub const DEFAULT_LS_PAGE_SIZE: usize = 1000;

/// The two HTTP channels, shared between the façade and the entities it
/// hands out. Nodes and users hold this instead of the full [`Stack`]
/// so they can issue requests without owning session state.
#[derive(Debug)]
pub(crate) struct Remote {
    pub(crate) api: ApiClient,
    pub(crate) dav: WebdavClient,
}

#[cfg(test)]
impl Remote {
    pub(crate) fn for_tests(base_url: &str) -> Self {
        Self {
            api: ApiClient::new(base_url).unwrap(),
            dav: WebdavClient::new(base_url, "test", "test").unwrap(),
        }
    }
}

/// A STACK session.
///
/// Holds the credentials, the login flag, and the current working
/// directory that relative paths resolve against. Every operation is a
/// plain request/response round trip; nothing runs in the background
/// and nothing is retried.
///
/// # Example
/// ```no_run
/// use stacklib::Stack;
///
/// # async fn example() -> stacklib::Result<()> {
/// let mut stack = Stack::new("user", "password", "user.stackstorage.com")?;
/// stack.login().await?;
///
/// for node in stack.ls(None, Default::default()).await? {
///     println!("{} ({} bytes)", node.path(), node.size());
/// }
///
/// stack.logout().await;
/// # Ok(())
/// # }
/// ```
pub struct Stack {
    pub(crate) remote: Arc<Remote>,
    username: String,
    password: String,
    logged_in: bool,
    pub(crate) cwd: String,
    /// Page size used by [`Stack::ls`] and [`Stack::walk`].
    pub ls_page_size: usize,
    /// When enabled, [`Stack::create_user`] requires passwords of at
    /// least 8 characters. The server itself does not enforce this.
    pub enforce_password_policy: bool,
}

impl Stack {
    /// Create a session for `https://{hostname}`.
    ///
    /// No request is made until [`Stack::login`].
    pub fn new(username: &str, password: &str, hostname: &str) -> Result<Self> {
        Self::with_base_url(username, password, &format!("https://{}", hostname))
    }

    /// Create a session against an explicit base URL.
    ///
    /// Useful for development servers and tests.
    pub fn with_base_url(username: &str, password: &str, base_url: &str) -> Result<Self> {
        let remote = Remote {
            api: ApiClient::new(base_url)?,
            dav: WebdavClient::new(base_url, username, password)?,
        };

        Ok(Self {
            remote: Arc::new(remote),
            username: username.to_string(),
            password: password.to_string(),
            logged_in: false,
            cwd: "/".to_string(),
            ls_page_size: DEFAULT_LS_PAGE_SIZE,
            enforce_password_policy: false,
        })
    }

    /// Whether this session is currently authenticated.
    pub fn authenticated(&self) -> bool {
        self.logged_in
    }

    /// Enable or disable the descriptive `User-Agent` header.
    pub fn set_expose_agent(&self, expose: bool) {
        self.remote.api.set_expose_agent(expose);
    }

    /// Base URL of the remote instance.
    pub fn base_url(&self) -> &str {
        self.remote.api.base_url()
    }

    /// Log into STACK.
    ///
    /// The login endpoint signals success with a redirect; any other
    /// status means the credentials were rejected.
    pub async fn login(&mut self) -> Result<()> {
        let response = self
            .remote
            .api
            .post_form(
                "/login",
                &[
                    ("username", self.username.as_str()),
                    ("password", self.password.as_str()),
                ],
            )
            .await?;

        let status = response.status().as_u16();
        self.logged_in = status == 301 || status == 302;

        if self.logged_in {
            debug!("logged in successfully");
            Ok(())
        } else {
            debug!(status, "no redirect on login request, invalid password");
            Err(StackError::InvalidCredentials)
        }
    }

    /// Log out of STACK.
    ///
    /// The response status is ignored and failures are swallowed: once
    /// the caller asked to leave, the local session must not look
    /// authenticated anymore.
    pub async fn logout(&mut self) {
        match self.remote.api.get_raw("/logout").await {
            Ok(_) => debug!("logged out successfully"),
            Err(err) => warn!(%err, "logout request failed, clearing session anyway"),
        }
        self.logged_in = false;
    }

    /// Run a closure within a managed session.
    ///
    /// Logs in first, then logs out afterwards whether the closure
    /// succeeded or failed. A failed login skips both the closure and
    /// the logout.
    ///
    /// # Example
    /// ```no_run
    /// # use stacklib::Stack;
    /// # async fn example() -> stacklib::Result<()> {
    /// let mut stack = Stack::new("user", "password", "user.stackstorage.com")?;
    /// stack
    ///     .with_session(|s| {
    ///         Box::pin(async move {
    ///             s.mkdir("backups", None).await?;
    ///             Ok(())
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Stack) -> BoxFuture<'a, Result<T>>,
    {
        self.login().await?;
        let result = f(self).await;
        if self.logged_in {
            self.logout().await;
        }
        result
    }

    /// Current working directory, normalized with a trailing `/`.
    pub fn cwd(&self) -> String {
        format!("{}/", self.cwd.trim_end_matches('/'))
    }

    /// Alias of [`Stack::cwd`].
    pub fn pwd(&self) -> String {
        self.cwd()
    }

    /// Resolve an optional base path, defaulting to the cwd.
    pub(crate) fn base_path(&self, path: Option<&str>) -> String {
        match path {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => self.cwd.clone(),
        }
    }
}
