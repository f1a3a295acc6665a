//! Remote filesystem nodes and their mutations.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, StackError};
use crate::fs::path;
use crate::http::ApiClient;
use crate::stack::Remote;

/// MIME type the server uses to mark directories.
pub const DIRECTORY_MIME: &str = "httpd/unix-directory";

/// Node kind, classified purely by MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Typed property bag backing a [`Node`], as returned by the server.
///
/// Fields the server omits fall back to the defaults below; `exists`
/// defaults to `true` since the server only reports it when false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeProps {
    pub file_id: i64,
    pub path: String,
    pub mimetype: String,
    pub etag: String,
    pub share_token: String,
    pub share_time: i64,
    pub expiration_date: String,
    pub has_share_password: bool,
    pub can_upload: bool,
    pub file_size: u64,
    pub is_favorited: bool,
    pub mtime: i64,
    pub is_previewable: bool,
    pub width: i64,
    pub height: i64,
    pub exists: bool,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            file_id: 0,
            path: String::new(),
            mimetype: String::new(),
            etag: String::new(),
            share_token: String::new(),
            share_time: 0,
            expiration_date: String::new(),
            has_share_password: false,
            can_upload: false,
            file_size: 0,
            is_favorited: false,
            mtime: 0,
            is_previewable: false,
            width: 0,
            height: 0,
            exists: true,
        }
    }
}

impl NodeProps {
    /// Merge a partial server response into these properties.
    ///
    /// Mutation endpoints return only the fields they touched; keys the
    /// patch does not mention keep their previous values.
    pub(crate) fn merge_from(&mut self, patch: &Value) -> Result<()> {
        let mut current = serde_json::to_value(&*self)?;

        if let (Some(current), Some(patch)) = (current.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                current.insert(key.clone(), value.clone());
            }
        }

        *self = serde_json::from_value(current)?;
        Ok(())
    }
}

/// A remote filesystem entry, either a file or a directory.
///
/// Nodes are plain values: two lookups of the same remote path yield
/// two independent objects, and deleting a node keeps its properties
/// readable locally. Each node holds a handle to the session's two
/// channels so mutations can round-trip without the full façade.
#[derive(Debug, Clone)]
pub struct Node {
    remote: Arc<Remote>,
    kind: NodeKind,
    props: NodeProps,
}

impl Node {
    /// Build a node from a raw server entry, classifying it by MIME type.
    pub(crate) fn from_value(remote: Arc<Remote>, value: &Value) -> Result<Self> {
        let props: NodeProps = serde_json::from_value(value.clone())?;
        let kind = if props.mimetype == DIRECTORY_MIME {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        Ok(Self { remote, kind, props })
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Whether the entry exists on the server.
    pub fn exists(&self) -> bool {
        self.props.exists
    }

    /// MIME type reported by the server.
    pub fn mime_type(&self) -> &str {
        &self.props.mimetype
    }

    /// File size in bytes (0 for directories).
    pub fn size(&self) -> u64 {
        self.props.file_size
    }

    /// Absolute, `/`-rooted remote path.
    pub fn path(&self) -> &str {
        &self.props.path
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        path::basename(&self.props.path)
    }

    /// Directory context of this node: its own path for directories,
    /// the containing directory for files.
    pub fn directory(&self) -> &str {
        match self.kind {
            NodeKind::Directory => self.path(),
            NodeKind::File => path::dirname(self.path()),
        }
    }

    pub fn is_favorited(&self) -> bool {
        self.props.is_favorited
    }

    pub fn is_shared(&self) -> bool {
        !self.props.share_token.is_empty()
    }

    /// Share token, or `None` when the node is not shared.
    pub fn share_token(&self) -> Option<&str> {
        if self.is_shared() {
            Some(&self.props.share_token)
        } else {
            None
        }
    }

    /// Public share URL (`{base}/s/{token}`), or `None` when not shared.
    pub fn share_url(&self) -> Option<String> {
        self.share_token()
            .map(|token| format!("{}/s/{}", self.remote.api.base_url(), token))
    }

    /// Whether the share is password protected; `false` when not shared.
    pub fn has_share_password(&self) -> bool {
        self.is_shared() && self.props.has_share_password
    }

    /// Expiry date of the share, or `None` when unset.
    pub fn share_expiry(&self) -> Option<&str> {
        if self.props.expiration_date.is_empty() {
            None
        } else {
            Some(&self.props.expiration_date)
        }
    }

    /// Raw typed properties.
    pub fn props(&self) -> &NodeProps {
        &self.props
    }

    /// Share this node, returning the public share URL.
    ///
    /// The password and expiry fields are always overwritten; passing
    /// `None` clears them.
    ///
    /// # Example
    /// ```no_run
    /// # use stacklib::Stack;
    /// # async fn example() -> stacklib::Result<()> {
    /// let mut stack = Stack::new("user", "password", "user.stackstorage.com")?;
    /// stack.login().await?;
    /// let mut file = stack.file("/report.pdf").await?;
    /// let url = file.share(Some("secret"), None).await?;
    /// println!("shared at {}", url);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn share(
        &mut self,
        password: Option<&str>,
        expiry_date: Option<NaiveDate>,
    ) -> Result<String> {
        let expire = expiry_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let action = json!({
            "action": "share",
            "path": self.path(),
            "active": true,
            "allowWrites": false,
            "updatePassword": true,
            "updateExpireDate": true,
            "sharePassword": password.unwrap_or(""),
            "expireDate": expire,
        });

        self.update(action, "share").await?;

        self.share_url().ok_or_else(|| StackError::ActionFailed {
            message: format!("Server did not return a share token for '{}'", self.path()),
            response: None,
        })
    }

    /// Revoke sharing on this node.
    pub async fn unshare(&mut self) -> Result<()> {
        let action = json!({
            "action": "share",
            "path": self.path(),
            "active": false,
            "allowWrites": false,
        });

        self.update(action, "unshare").await?;
        self.props.share_token.clear();
        Ok(())
    }

    /// Mark this node as favorited.
    pub async fn favorite(&mut self) -> Result<()> {
        self.set_favorite(true).await
    }

    /// Remove the favorite mark.
    pub async fn unfavorite(&mut self) -> Result<()> {
        self.set_favorite(false).await
    }

    async fn set_favorite(&mut self, active: bool) -> Result<()> {
        let action = json!({
            "action": "favorite",
            "path": self.path(),
            "query": "",
            "active": active,
        });

        self.update(action, "favorite").await?;
        Ok(())
    }

    /// Delete this node on the server.
    ///
    /// Local properties are intentionally kept readable afterwards.
    pub async fn delete(&self) -> Result<()> {
        let action = json!({
            "action": "delete",
            "path": self.path(),
            "query": "",
        });

        let response = self
            .remote
            .api
            .post_json("/api/files/update", &json!([action]))
            .await?;
        check_update_status(response).await?;
        debug!(path = %self.path(), "deleted node");
        Ok(())
    }

    /// Move or rename this node.
    ///
    /// Destination rules:
    /// - absolute paths are used verbatim
    /// - `../`-prefixed paths resolve against the parent directory,
    ///   collapsing the `..` components
    /// - other relative paths are joined to the parent directory
    /// - a trailing `/` marks a target directory; the current name is
    ///   appended
    pub async fn move_to(&mut self, dest: &str) -> Result<()> {
        let into_directory = dest.ends_with('/');

        let mut target = if dest.starts_with('/') {
            dest.to_string()
        } else {
            path::resolve(&path::join(path::dirname(self.path()), dest))
        };

        if into_directory {
            target = path::join(target.trim_end_matches('/'), self.name());
        }

        self.remote.dav.mv(self.path(), &target).await?;
        self.props.path = target;
        self.refresh().await
    }

    /// Rename this node within its current directory.
    pub async fn rename(&mut self, new_name: &str) -> Result<()> {
        self.move_to(new_name).await
    }

    /// Re-fetch the full metadata for this node and merge it in.
    pub async fn refresh(&mut self) -> Result<()> {
        let info = path_info(&self.remote.api, self.path()).await?;
        self.props.merge_from(&info)?;
        self.kind = if self.props.mimetype == DIRECTORY_MIME {
            NodeKind::Directory
        } else {
            NodeKind::File
        };
        Ok(())
    }

    /// Submit a single update action and merge `response[0]` into the
    /// local properties.
    async fn update(&mut self, action: Value, what: &str) -> Result<()> {
        let response = self
            .remote
            .api
            .post_json("/api/files/update", &json!([action]))
            .await?;
        let body = check_update_status(response).await?;

        // Only the first element of the response array is consulted.
        if let Some(first) = body.as_array().and_then(|a| a.first()) {
            self.props.merge_from(first)?;
        }

        debug!(path = %self.path(), what, "updated node");
        Ok(())
    }
}

/// Single-node metadata lookup via `/api/pathinfo`.
///
/// 404 becomes a not-found error; any other non-200 status is an HTTP
/// error carrying the response body.
pub(crate) async fn path_info(api: &ApiClient, path: &str) -> Result<Value> {
    let response = api.get("/api/pathinfo", &[("path", path.to_string())]).await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(StackError::NotFound(path.to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StackError::Http {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }

    Ok(response.json().await?)
}

/// Reject non-2xx statuses on the node-update endpoint, returning the
/// parsed JSON body otherwise.
pub(crate) async fn check_update_status(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StackError::Http {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Remote;

    fn test_node(value: Value) -> Node {
        let remote = Arc::new(Remote::for_tests("https://example.stackstorage.com"));
        Node::from_value(remote, &value).unwrap()
    }

    #[test]
    fn test_classification_by_mime() {
        let dir = test_node(json!({"path": "/docs", "mimetype": DIRECTORY_MIME}));
        assert!(dir.is_dir());
        assert_eq!(dir.directory(), "/docs");

        let file = test_node(json!({"path": "/docs/a.txt", "mimetype": "text/plain"}));
        assert!(file.is_file());
        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.directory(), "/docs");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let node = test_node(json!({"path": "/x.bin"}));
        assert!(node.exists());
        assert_eq!(node.size(), 0);
        assert!(!node.is_favorited());
        assert!(!node.is_shared());
    }

    #[test]
    fn test_share_fields_reflect_not_shared_without_raising() {
        let node = test_node(json!({"path": "/a.txt", "mimetype": "text/plain"}));
        assert_eq!(node.share_token(), None);
        assert_eq!(node.share_url(), None);
        assert!(!node.has_share_password());
    }

    #[test]
    fn test_share_url_format() {
        let node = test_node(json!({
            "path": "/a.txt",
            "mimetype": "text/plain",
            "shareToken": "Tok3n",
        }));
        assert_eq!(
            node.share_url().as_deref(),
            Some("https://example.stackstorage.com/s/Tok3n")
        );
    }

    #[test]
    fn test_merge_keeps_unmentioned_fields() {
        let mut props: NodeProps =
            serde_json::from_value(json!({"path": "/a.txt", "fileSize": 11, "isFavorited": true}))
                .unwrap();
        props.merge_from(&json!({"shareToken": "t"})).unwrap();

        assert_eq!(props.file_size, 11);
        assert!(props.is_favorited);
        assert_eq!(props.share_token, "t");
    }
}
