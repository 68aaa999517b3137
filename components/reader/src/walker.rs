use std::collections::VecDeque;

use snafu::ResultExt;
use tracing::debug;

use seam_client::{DfsClient, FileKind};

use crate::err::{ListFailureSnafu, PathNotFoundSnafu, Result};
use crate::slice::{plan_slices, Slice};

/// Enumerate every file under `root` and expand each into read slices.
///
/// Traversal keeps an explicit FIFO of pending directories; the returned
/// queue of slices is drained by consumers independently of how it was
/// produced, and slices for one file stay in file order.
pub async fn plan_ranges(
    client: &dyn DfsClient,
    root: &str,
    slice_size: u64,
) -> Result<VecDeque<Slice>> {
    let status = client
        .stat(root)
        .await
        .context(ListFailureSnafu { path: root })?;
    let Some(status) = status else {
        return PathNotFoundSnafu { path: root }.fail();
    };

    let mut slices = VecDeque::new();
    if status.kind == FileKind::File {
        slices.extend(plan_slices(&status.path, status.length, slice_size));
        return Ok(slices);
    }

    let mut pending = VecDeque::from([status.path]);
    while let Some(dir) = pending.pop_front() {
        let children = client
            .list_status(&dir)
            .await
            .context(ListFailureSnafu { path: &dir })?;
        debug!("walked {dir}: {} children", children.len());
        for child in children {
            match child.kind {
                FileKind::File => {
                    slices.extend(plan_slices(&child.path, child.length, slice_size));
                }
                FileKind::Directory => pending.push_back(child.path),
            }
        }
    }
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::Error;
    use seam_client::MemoryClient;

    #[tokio::test]
    async fn walks_nested_directories() {
        let client = MemoryClient::new();
        client.put("/logs/a", &vec![b'x'; 5]);
        client.put("/logs/day1/b", &vec![b'y'; 25]);
        client.put("/logs/day1/late/c", &vec![b'z'; 10]);
        client.put("/other/d", b"ignored");

        let slices = plan_ranges(&client, "/logs", 10).await.unwrap();
        let mut paths: Vec<_> = slices.iter().map(|s| s.path().to_string()).collect();
        paths.dedup();
        assert_eq!(paths, vec!["/logs/a", "/logs/day1/b", "/logs/day1/late/c"]);
        // 5 bytes -> 1 slice, 25 bytes -> 3 slices, 10 bytes -> 1 slice
        assert_eq!(slices.len(), 5);
    }

    #[tokio::test]
    async fn single_file_root() {
        let client = MemoryClient::new();
        client.put("/solo", &vec![b'x'; 15]);

        let slices = plan_ranges(&client, "/solo", 10).await.unwrap();
        assert_eq!(slices.len(), 2);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let client = MemoryClient::new();
        let err = plan_ranges(&client, "/nope", 10).await.unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }
}
