//! Upload, download and directory creation over the transfer channel.

use std::path::Path;

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{Result, StackError};
use crate::fs::Node;
use crate::fs::path;
use crate::stack::Stack;

impl Stack {
    /// Upload a local file into the current working directory, keeping
    /// its file name.
    pub async fn upload(&self, local: impl AsRef<Path>) -> Result<Node> {
        self.upload_as(local, None, None).await
    }

    /// Upload a local file.
    ///
    /// The remote name comes from `name` or, when absent, the file name
    /// component of `local`; a source without a usable name is rejected
    /// before any request. After the transfer the node is looked up
    /// fresh so the returned metadata is authoritative.
    pub async fn upload_as(
        &self,
        local: impl AsRef<Path>,
        dir: Option<&str>,
        name: Option<&str>,
    ) -> Result<Node> {
        let local = local.as_ref();

        let name = match name {
            Some(n) => n.to_string(),
            None => local
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    StackError::InvalidArgument(format!(
                        "Unable to determine remote file name for '{}', \
                         pass it via the 'name' parameter",
                        local.display()
                    ))
                })?,
        };

        let data = tokio::fs::read(local).await?;
        self.upload_bytes(data, &name, dir).await
    }

    /// Upload in-memory content under the given remote name.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        name: &str,
        dir: Option<&str>,
    ) -> Result<Node> {
        if name.is_empty() {
            return Err(StackError::InvalidArgument(
                "Remote file name must not be empty".to_string(),
            ));
        }

        let target = path::join(&self.base_path(dir), name);
        debug!(target = %target, bytes = data.len(), "uploading");

        self.remote.dav.put(&target, data).await?;
        self.file(&target).await
    }

    /// Download a remote file to a local path.
    ///
    /// `file` is resolved under `remote_dir` (default: the cwd); a
    /// leading `/` on `file` is stripped first. The local file is only
    /// created once the remote has answered, so a failed lookup leaves
    /// nothing behind at `output`.
    pub async fn download(
        &self,
        file: &str,
        output: impl AsRef<Path>,
        remote_dir: Option<&str>,
    ) -> Result<()> {
        let remote = self.remote_file_path(file, remote_dir);
        let response = self.remote.dav.get(&remote).await?;

        let mut out = tokio::fs::File::create(output).await?;
        write_body(response, &mut out).await
    }

    /// Download a remote file into any [`AsyncWrite`] destination.
    pub async fn download_into<W>(
        &self,
        file: &str,
        writer: &mut W,
        remote_dir: Option<&str>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let remote = self.remote_file_path(file, remote_dir);
        let response = self.remote.dav.get(&remote).await?;
        write_body(response, writer).await
    }

    /// Download a remote file into a fresh in-memory buffer.
    pub async fn download_bytes(&self, file: &str, remote_dir: Option<&str>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.download_into(file, &mut buffer, remote_dir).await?;
        Ok(buffer)
    }

    /// Create a directory under `path` (default: the cwd) and return it
    /// from a fresh lookup.
    ///
    /// When creating nested trees, parents must be created before their
    /// children; the server does not create intermediate directories.
    pub async fn mkdir(&self, name: &str, path: Option<&str>) -> Result<Node> {
        let target = path::join(&self.base_path(path), name);
        self.remote.dav.mkcol(&target).await?;
        self.directory(&target).await
    }

    fn remote_file_path(&self, file: &str, remote_dir: Option<&str>) -> String {
        path::join(&self.base_path(remote_dir), file.trim_start_matches('/'))
    }
}

/// Stream a response body into a writer, chunk by chunk.
async fn write_body<W>(response: reqwest::Response, writer: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| StackError::Transfer(e.to_string()))?;
        writer.write_all(&chunk).await?;
    }

    writer.flush().await?;
    Ok(())
}
