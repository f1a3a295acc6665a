//! Listing, traversal, lookup and working-directory changes.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use async_stream::try_stream;
use futures::Stream;
use serde_json::Value;

use crate::error::{Result, StackError};
use crate::fs::node::{self, Node};
use crate::fs::path;
use crate::stack::Stack;

/// Server-side listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    /// Wire value sent to the listing endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = StackError;

    /// Parse a wire value, rejecting anything outside the enumeration
    /// before a request can be issued.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Order::Ascending),
            "desc" => Ok(Order::Descending),
            other => Err(StackError::InvalidArgument(format!(
                "Invalid order parameter, got '{}', allowed values: 'asc', 'desc'",
                other
            ))),
        }
    }
}

/// Read a count field that the server serializes as either a number or
/// a numeric string.
pub(crate) fn count_field(value: &Value, key: &str) -> Result<u64> {
    value
        .get(key)
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
        .ok_or_else(|| StackError::ActionFailed {
            message: format!("Listing response missing '{}' field", key),
            response: Some(value.clone()),
        })
}

impl Stack {
    /// List a directory (default: the current working directory).
    ///
    /// Pagination is handled internally: pages of [`Stack::ls_page_size`]
    /// entries are requested until the server-reported total is reached.
    pub async fn ls(&self, path: Option<&str>, order: Order) -> Result<Vec<Node>> {
        self.ls_search("", path, order).await
    }

    /// List a directory, filtering entries by a search query.
    pub async fn ls_search(
        &self,
        search: &str,
        path: Option<&str>,
        order: Order,
    ) -> Result<Vec<Node>> {
        let dir = self.base_path(path);
        let mut offset = 0u64;
        let mut nodes = Vec::new();

        loop {
            let page = self.files_page(&dir, offset, search, order).await?;
            let amount = count_field(&page, "amount")?;

            if let Some(entries) = page.get("nodes").and_then(Value::as_array) {
                for entry in entries {
                    nodes.push(Node::from_value(self.remote.clone(), entry)?);
                }
            }

            offset += self.ls_page_size as u64;
            if offset >= amount {
                break;
            }
        }

        Ok(nodes)
    }

    /// Files in a directory (default: cwd), directories filtered out.
    pub async fn files(&self, path: Option<&str>) -> Result<Vec<Node>> {
        let nodes = self.ls(path, Order::default()).await?;
        Ok(nodes.into_iter().filter(|n| n.is_file()).collect())
    }

    /// Sub-directories of a directory (default: cwd).
    pub async fn directories(&self, path: Option<&str>) -> Result<Vec<Node>> {
        let nodes = self.ls(path, Order::default()).await?;
        Ok(nodes.into_iter().filter(|n| n.is_dir()).collect())
    }

    /// Walk the directory tree depth-first, yielding each file.
    ///
    /// The stream is lazy and restartable: every invocation re-issues
    /// listing requests, and `order` applies independently at each
    /// level. Directories themselves are not yielded.
    ///
    /// # Example
    /// ```no_run
    /// # use stacklib::{Order, Stack};
    /// use futures::{TryStreamExt, pin_mut};
    ///
    /// # async fn example() -> stacklib::Result<()> {
    /// # let mut stack = Stack::new("user", "password", "host")?;
    /// let walk = stack.walk(Some("/photos"), Order::Ascending);
    /// pin_mut!(walk);
    /// while let Some(file) = walk.try_next().await? {
    ///     println!("{}", file.path());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn walk<'a>(
        &'a self,
        path: Option<&str>,
        order: Order,
    ) -> impl Stream<Item = Result<Node>> + 'a {
        let start = self.base_path(path);

        try_stream! {
            let mut pending: VecDeque<Node> = self.ls(Some(&start), order).await?.into();

            while let Some(entry) = pending.pop_front() {
                if entry.is_dir() {
                    // Children replace the directory at the front of the
                    // queue, keeping the traversal depth-first.
                    let children = self.ls(Some(entry.path()), order).await?;
                    for child in children.into_iter().rev() {
                        pending.push_front(child);
                    }
                } else {
                    yield entry;
                }
            }
        }
    }

    /// Look up a single node by name or absolute path.
    pub async fn node(&self, name: &str) -> Result<Node> {
        let path = if name.starts_with('/') {
            name.to_string()
        } else {
            path::join(&self.cwd, name)
        };

        let info = node::path_info(&self.remote.api, &path).await?;
        Node::from_value(self.remote.clone(), &info)
    }

    /// Look up a file by name; a directory at that path is a type
    /// mismatch, distinct from not-found.
    pub async fn file(&self, name: &str) -> Result<Node> {
        let node = self.node(name).await?;

        if node.is_dir() {
            return Err(StackError::TypeMismatch(format!(
                "File '{}' is a directory!",
                name
            )));
        }

        Ok(node)
    }

    /// Look up a directory by name; a file at that path is a type
    /// mismatch, distinct from not-found.
    pub async fn directory(&self, name: &str) -> Result<Node> {
        let node = self.node(name).await?;

        if node.is_file() {
            return Err(StackError::TypeMismatch(format!(
                "Directory '{}' is a file!",
                name
            )));
        }

        Ok(node)
    }

    /// Change the current working directory.
    ///
    /// Relative paths resolve against the cwd with `..` collapsing. The
    /// target is verified remotely before the cwd is committed, so an
    /// invalid target leaves it unchanged.
    pub async fn cd(&mut self, path: &str) -> Result<Node> {
        let target = if path.starts_with('/') {
            path.to_string()
        } else {
            path::resolve(&path::join(&self.cwd, path))
        };

        let directory = self.directory(&target).await?;
        self.cwd = target;
        Ok(directory)
    }

    /// Fetch one listing page from `/api/files`.
    async fn files_page(
        &self,
        dir: &str,
        offset: u64,
        query: &str,
        order: Order,
    ) -> Result<Value> {
        let params = [
            ("dir", dir.to_string()),
            ("type", "files".to_string()),
            ("public", "false".to_string()),
            ("offset", offset.to_string()),
            ("limit", self.ls_page_size.to_string()),
            ("sortBy", "default".to_string()),
            ("order", order.as_str().to_string()),
            ("query", query.to_string()),
        ];

        let response = self.remote.api.get("/api/files", &params).await?;

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
}
