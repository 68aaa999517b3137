use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::err::{Error, Result};
use crate::{ByteRange, DfsClient, FileKind, FileStatus};

/// In-memory [DfsClient] with per-path append failure injection, used to
/// exercise the rotation path without a cluster.
#[derive(Debug, Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    append_faults: HashMap<String, VecDeque<String>>,
}

impl MemoryClient {
    pub fn new() -> Self { Self::default() }

    /// Queue a one-shot failure for the next append to `path`; `detail`
    /// becomes the error detail the coordinator classifies on.
    pub fn inject_append_failure(&self, path: &str, detail: &str) {
        let mut state = self.lock();
        state
            .append_faults
            .entry(path.to_string())
            .or_default()
            .push_back(detail.to_string());
    }

    /// Current file contents, for test assertions.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    pub fn put(&self, path: &str, data: &[u8]) {
        self.lock().files.insert(path.to_string(), data.to_vec());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn is_dir(state: &State, path: &str) -> bool {
    let prefix = format!("{}/", path.trim_end_matches('/'));
    state.dirs.contains(path.trim_end_matches('/'))
        || state.files.keys().any(|k| k.starts_with(&prefix))
}

#[async_trait]
impl DfsClient for MemoryClient {
    async fn read(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>> {
        let state = self.lock();
        let data = state.files.get(path).ok_or_else(|| Error::NotFound {
            path: path.to_string(),
            location: snafu::location!(),
        })?;
        Ok(match range {
            None => data.clone(),
            Some(range) => {
                let start = (range.offset as usize).min(data.len());
                let end = (range.offset + range.length).min(data.len() as u64) as usize;
                data[start..end].to_vec()
            }
        })
    }

    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
        let state = self.lock();
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut children: BTreeMap<String, FileStatus> = BTreeMap::new();
        for (file, data) in state.files.range(prefix.clone()..) {
            let Some(rest) = file.strip_prefix(&prefix) else { break };
            match rest.split_once('/') {
                // a grandchild implies a child directory
                Some((child, _)) => {
                    let child_path = format!("{prefix}{child}");
                    children.insert(
                        child_path.clone(),
                        FileStatus { path: child_path, kind: FileKind::Directory, length: 0 },
                    );
                }
                None => {
                    children.insert(
                        file.clone(),
                        FileStatus {
                            path: file.clone(),
                            kind: FileKind::File,
                            length: data.len() as u64,
                        },
                    );
                }
            }
        }
        for dir in &state.dirs {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                if !rest.is_empty() && !rest.contains('/') {
                    children.entry(dir.clone()).or_insert(FileStatus {
                        path: dir.clone(),
                        kind: FileKind::Directory,
                        length: 0,
                    });
                }
            }
        }
        Ok(children.into_values().collect())
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStatus>> {
        let state = self.lock();
        if let Some(data) = state.files.get(path) {
            return Ok(Some(FileStatus {
                path: path.to_string(),
                kind: FileKind::File,
                length: data.len() as u64,
            }));
        }
        if is_dir(&state, path) {
            return Ok(Some(FileStatus {
                path: path.trim_end_matches('/').to_string(),
                kind: FileKind::Directory,
                length: 0,
            }));
        }
        Ok(None)
    }

    async fn mkdirs(&self, path: &str) -> Result<()> {
        let mut state = self.lock();
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = format!("{current}/{part}");
            state.dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn create(&self, path: &str, initial: &[u8]) -> Result<()> {
        self.lock().files.insert(path.to_string(), initial.to_vec());
        Ok(())
    }

    async fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if let Some(queue) = state.append_faults.get_mut(path) {
            if let Some(detail) = queue.pop_front() {
                return Err(Error::Rejected {
                    path: path.to_string(),
                    detail,
                    location: snafu::location!(),
                });
            }
        }
        match state.files.get_mut(path) {
            Some(file) => {
                file.extend_from_slice(data);
                Ok(())
            }
            None => Err(Error::NotFound {
                path: path.to_string(),
                location: snafu::location!(),
            }),
        }
    }
}
