// Copyright 2026 seam
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod dal;
pub mod err;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::dal::OpendalClient;
pub use crate::err::{Error, Result, REPLICA_RELOCATION_MARKER};
pub use crate::memory::MemoryClient;

/// A contiguous byte interval of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct FileStatus {
    pub path: String,
    pub kind: FileKind,
    pub length: u64,
}

/// The narrow contract the reader and writer need from the distributed
/// filesystem: byte-offset reads, flat listings, and sequential appends.
///
/// Ranged reads past the end of a file return the available bytes, the way
/// HDFS serves an over-long `open` request.
#[async_trait]
pub trait DfsClient: Send + Sync + 'static {
    async fn read(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>>;

    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>>;

    /// `Ok(None)` when the path does not exist.
    async fn stat(&self, path: &str) -> Result<Option<FileStatus>>;

    async fn mkdirs(&self, path: &str) -> Result<()>;

    async fn create(&self, path: &str, initial: &[u8]) -> Result<()>;

    /// Appends are position-dependent; callers must serialize appends to
    /// one path themselves.
    async fn append(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub type DfsClientRef = Arc<dyn DfsClient>;

/// Directory portion of a path, without the trailing separator. Empty when
/// the path has no parent.
pub fn parent_dir(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_of_nested_path() {
        assert_eq!(parent_dir("/incoming/2037-2-27/worker"), "/incoming/2037-2-27");
        assert_eq!(parent_dir("/file"), "/");
        assert_eq!(parent_dir("relative/file"), "relative");
        assert_eq!(parent_dir("file"), "");
    }
}
