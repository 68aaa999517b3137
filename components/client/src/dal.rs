use async_trait::async_trait;
use opendal::{EntryMode, Metakey, Operator};
use snafu::ResultExt;
use tracing::debug;

use crate::err::{OpenDalSnafu, Result};
use crate::{ByteRange, DfsClient, FileKind, FileStatus};

/// [DfsClient] backed by an OpenDAL [Operator].
#[derive(Debug, Clone)]
pub struct OpendalClient {
    op: Operator,
}

impl OpendalClient {
    pub fn new(op: Operator) -> Self { Self { op } }

    pub fn new_memory() -> Result<Self> {
        let builder = opendal::services::Memory::default();
        Ok(Self::new(Operator::new(builder).context(OpenDalSnafu)?.finish()))
    }

    pub fn new_fs(root: &str) -> Result<Self> {
        let mut builder = opendal::services::Fs::default();
        builder.root(root);
        Ok(Self::new(Operator::new(builder).context(OpenDalSnafu)?.finish()))
    }

    pub fn new_webhdfs(endpoint: &str, root: &str) -> Result<Self> {
        let mut builder = opendal::services::Webhdfs::default();
        builder.endpoint(endpoint);
        builder.root(root);
        Ok(Self::new(Operator::new(builder).context(OpenDalSnafu)?.finish()))
    }

    fn status_from_meta(path: &str, meta: &opendal::Metadata) -> FileStatus {
        let kind = match meta.mode() {
            EntryMode::DIR => FileKind::Directory,
            _ => FileKind::File,
        };
        FileStatus {
            path: path.trim_end_matches('/').to_string(),
            kind,
            length: meta.content_length(),
        }
    }
}

#[async_trait]
impl DfsClient for OpendalClient {
    async fn read(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>> {
        match range {
            None => self.op.read(path).await.context(OpenDalSnafu),
            Some(range) => {
                // Clamp to the file end; the margin read may ask for more
                // bytes than the file still has.
                let meta = self.op.stat(path).await.context(OpenDalSnafu)?;
                let total = meta.content_length();
                if range.offset >= total {
                    return Ok(Vec::new());
                }
                let end = total.min(range.offset + range.length);
                debug!("ranged read {} [{}, {})", path, range.offset, end);
                self.op
                    .read_with(path)
                    .range(range.offset..end)
                    .await
                    .context(OpenDalSnafu)
            }
        }
    }

    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
        let dir = format!("{}/", path.trim_end_matches('/'));
        let entries = self
            .op
            .list_with(&dir)
            .metakey(Metakey::ContentLength | Metakey::Mode)
            .await
            .context(OpenDalSnafu)?;
        Ok(entries
            .iter()
            .map(|entry| Self::status_from_meta(entry.path(), entry.metadata()))
            .collect())
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStatus>> {
        match self.op.stat(path).await {
            Ok(meta) => Ok(Some(Self::status_from_meta(path, &meta))),
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context(OpenDalSnafu),
        }
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let dir = format!("{}/", path.trim_end_matches('/'));
        self.op.create_dir(&dir).await.context(OpenDalSnafu)
    }

    async fn create(&self, path: &str, initial: &[u8]) -> Result<()> {
        self.op.write(path, initial.to_vec()).await.context(OpenDalSnafu)
    }

    async fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        self.op
            .write_with(path, data.to_vec())
            .append(true)
            .await
            .context(OpenDalSnafu)
    }
}
