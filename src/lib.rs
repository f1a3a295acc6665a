//! # stacklib
//!
//! Rust client library for TransIP STACK cloud storage.
//!
//! STACK exposes two surfaces and this crate wraps both:
//!
//! - the web API (cookie session plus an anti-forgery token scraped
//!   from the file listing page) for metadata: listing, lookup,
//!   sharing, favoriting and user administration
//! - a WebDAV endpoint (basic auth, independent of the cookie session)
//!   for file content: upload, download, move and directory creation
//!
//! ## Features
//!
//! - **Session lifecycle**: login/logout, a managed-session helper, and
//!   a current working directory that relative paths resolve against.
//! - **Browsing**: paginated listing, search, depth-first [`Stack::walk`]
//!   streaming, and typed lookups ([`Stack::file`] / [`Stack::directory`]).
//! - **Nodes**: share (with password and expiry), unshare, favorite,
//!   move/rename with POSIX-style destination resolution, delete.
//! - **Transfers**: upload from disk or memory, download to disk, any
//!   `AsyncWrite`, or a fresh buffer; `mkdir`.
//! - **User administration**: list, look up, create, stage-then-save
//!   updates, delete (requires an administrator account).
//!
//! ## Example
//!
//! ```no_run
//! use stacklib::Stack;
//!
//! # async fn example() -> stacklib::Result<()> {
//! let mut stack = Stack::new("user", "password", "user.stackstorage.com")?;
//! stack.login().await?;
//!
//! let folder = stack.mkdir("reports", None).await?;
//! let file = stack
//!     .upload_bytes(b"Hello world".to_vec(), "hello.txt", Some(folder.path()))
//!     .await?;
//! println!("uploaded {} ({} bytes)", file.path(), file.size());
//!
//! let content = stack.download_bytes("hello.txt", Some(folder.path())).await?;
//! assert_eq!(content, b"Hello world");
//!
//! stack.logout().await;
//! # Ok(())
//! # }
//! ```
//!
//! There are no retries and no token refresh: every failure surfaces
//! immediately as a [`StackError`], and an anti-forgery token expired
//! by the server ends the useful lifetime of the session.

pub mod error;
pub mod fs;
pub mod http;
pub mod stack;
pub mod users;
pub mod webdav;

// Re-export commonly used types
pub use error::{Result, StackError};
pub use fs::{DIRECTORY_MIME, Node, NodeKind, NodeProps};
pub use stack::{DEFAULT_LS_PAGE_SIZE, Order, Stack};
pub use users::{QUOTA_UNLIMITED, User, UserProps};
