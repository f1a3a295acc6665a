//! Remote filesystem model.

pub(crate) mod node;
pub(crate) mod path;

pub use node::{DIRECTORY_MIME, Node, NodeKind, NodeProps};
