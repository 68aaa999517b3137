use std::collections::HashMap;

use bytes::Bytes;
use futures::future::join_all;
use snafu::ResultExt;
use tracing::{error, warn};

use seam_client::{parent_dir, DfsClientRef};

use crate::config::WriterConfig;
use crate::err::{AppendFailureSnafu, AppendRotatedSnafu, CreateFailureSnafu, Result};
use crate::rotation::RotationTracker;

/// One chunk of serialized records bound for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChunk {
    pub filename: String,
    pub data: Bytes,
}

/// Appends batches of record chunks to their destination files, creating
/// missing files and rotating destinations after corrupt-replica append
/// failures.
pub struct AppendCoordinator {
    client: DfsClientRef,
    tracker: RotationTracker,
    log_data_on_error: bool,
}

impl AppendCoordinator {
    pub fn new(client: DfsClientRef, config: &WriterConfig) -> Self {
        Self {
            client,
            tracker: RotationTracker::new(config.max_rotations),
            log_data_on_error: config.log_data_on_error,
        }
    }

    pub fn tracker(&self) -> &RotationTracker { &self.tracker }

    /// Append one batch. Chunks are grouped by their (possibly rotated)
    /// destination; distinct files are stored in parallel while chunks for
    /// one file go out strictly in submission order, one in flight at a
    /// time — the filesystem does not serialize appends itself.
    ///
    /// A rotation-eligible failure comes back as a recoverable
    /// [Error::AppendRotated](crate::err::Error::AppendRotated); redriving
    /// the same logical batch then routes to the rotated name. Successes
    /// for other files in a failed batch are not undone.
    pub async fn process(&self, batch: Vec<RecordChunk>) -> Result<()> {
        let mut by_file: HashMap<String, Vec<Bytes>> = HashMap::new();
        for chunk in batch {
            // Skip empty payloads to avoid empty appends.
            if chunk.data.is_empty() {
                continue;
            }
            let target = self.tracker.resolve(&chunk.filename)?;
            by_file.entry(target).or_default().push(chunk.data);
        }

        let stores = by_file
            .into_iter()
            .map(|(filename, chunks)| self.store_chunks(filename, chunks));

        let mut failure = None;
        for result in join_all(stores).await {
            if let Err(err) = result {
                error!("error while appending batch: {err}");
                failure.get_or_insert(err);
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn store_chunks(&self, filename: String, chunks: Vec<Bytes>) -> Result<()> {
        self.prepare_file(&filename).await?;
        for chunk in &chunks {
            if let Err(err) = self.client.append(&filename, chunk).await {
                return self.classify_append_failure(&filename, &chunks, err);
            }
        }
        Ok(())
    }

    /// The file must exist before the first append lands on it.
    async fn prepare_file(&self, filename: &str) -> Result<()> {
        match self.client.stat(filename).await {
            Ok(Some(_)) => Ok(()),
            // A failed probe falls through to creation, like the probe
            // being a miss.
            Ok(None) | Err(_) => {
                let parent = parent_dir(filename);
                if !parent.is_empty() {
                    self.client
                        .mkdirs(parent)
                        .await
                        .context(CreateFailureSnafu { filename })?;
                }
                self.client
                    .create(filename, &[])
                    .await
                    .context(CreateFailureSnafu { filename })
            }
        }
    }

    fn classify_append_failure(
        &self,
        filename: &str,
        chunks: &[Bytes],
        err: seam_client::Error,
    ) -> Result<()> {
        if err.is_replica_relocation() {
            let new_filename = self.tracker.record_failure(filename);
            warn!(
                "append error on {filename} due to replica relocation, \
                 rotating destination to {new_filename}"
            );
            return Err(err).context(AppendRotatedSnafu { filename, new_filename });
        }
        let data = self.log_data_on_error.then(|| render_payloads(chunks));
        Err(err).context(AppendFailureSnafu { filename, data })
    }
}

fn render_payloads(chunks: &[Bytes]) -> String {
    chunks
        .iter()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::err::Error;
    use seam_client::{DfsClient, FileKind, MemoryClient, REPLICA_RELOCATION_MARKER};

    fn chunk(filename: &str, data: &str) -> RecordChunk {
        RecordChunk {
            filename: filename.to_string(),
            data: Bytes::copy_from_slice(data.as_bytes()),
        }
    }

    fn coordinator(
        client: &Arc<MemoryClient>,
        config: WriterConfig,
    ) -> AppendCoordinator {
        AppendCoordinator::new(client.clone(), &config)
    }

    #[tokio::test]
    async fn creates_missing_files_and_appends_in_order() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());

        coordinator
            .process(vec![
                chunk("/incoming/day/f", "one\n"),
                chunk("/incoming/day/f", "two\n"),
                chunk("/incoming/day/f", "three\n"),
            ])
            .await
            .unwrap();

        assert_eq!(client.contents("/incoming/day/f").unwrap(), b"one\ntwo\nthree\n");
        let parent = client.stat("/incoming/day").await.unwrap().unwrap();
        assert_eq!(parent.kind, FileKind::Directory);
    }

    #[tokio::test]
    async fn empty_payloads_are_dropped() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());

        coordinator.process(vec![chunk("/f", "")]).await.unwrap();
        assert!(client.contents("/f").is_none());
    }

    #[tokio::test]
    async fn distinct_files_all_get_their_chunks() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());

        coordinator
            .process(vec![chunk("/a", "1\n"), chunk("/b", "2\n"), chunk("/a", "3\n")])
            .await
            .unwrap();

        assert_eq!(client.contents("/a").unwrap(), b"1\n3\n");
        assert_eq!(client.contents("/b").unwrap(), b"2\n");
    }

    #[tokio::test]
    async fn replica_relocation_rotates_and_redrive_lands_on_new_name() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());
        client.put("/logs/f", b"");
        client.inject_append_failure("/logs/f", REPLICA_RELOCATION_MARKER);

        let batch = vec![chunk("/logs/f", "payload\n")];
        let err = coordinator.process(batch.clone()).await.unwrap_err();
        match &err {
            Error::AppendRotated { filename, new_filename, .. } => {
                assert_eq!(filename, "/logs/f");
                assert_eq!(new_filename, "/logs/f.0");
            }
            other => panic!("expected AppendRotated, got {other:?}"),
        }
        assert!(err.is_recoverable());

        // The redriven batch routes to the rotated name without another
        // failure being recorded.
        coordinator.process(batch).await.unwrap();
        assert_eq!(client.contents("/logs/f.0").unwrap(), b"payload\n");
        assert_eq!(coordinator.tracker().resolve("/logs/f").unwrap(), "/logs/f.0");
    }

    #[tokio::test]
    async fn other_append_failures_are_fatal() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());
        client.put("/f", b"");
        client.inject_append_failure("/f", "disk full");

        let err = coordinator.process(vec![chunk("/f", "data\n")]).await.unwrap_err();
        match err {
            Error::AppendFailure { filename, data, .. } => {
                assert_eq!(filename, "/f");
                assert_eq!(data, None);
            }
            other => panic!("expected AppendFailure, got {other:?}"),
        }
        assert!(coordinator.tracker().resolve("/f").unwrap() == "/f");
    }

    #[tokio::test]
    async fn payload_embedded_only_when_enabled() {
        let client = Arc::new(MemoryClient::new());
        let config = WriterConfig { log_data_on_error: true, ..Default::default() };
        let coordinator = coordinator(&client, config);
        client.put("/f", b"");
        client.inject_append_failure("/f", "disk full");

        let err = coordinator
            .process(vec![chunk("/f", "sensitive\n")])
            .await
            .unwrap_err();
        match err {
            Error::AppendFailure { data, .. } => {
                assert_eq!(data.as_deref(), Some("sensitive\n"));
            }
            other => panic!("expected AppendFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rotation_cap_is_terminal() {
        let client = Arc::new(MemoryClient::new());
        let config = WriterConfig { max_rotations: 1, ..Default::default() };
        let coordinator = coordinator(&client, config);
        client.put("/f", b"");

        let batch = vec![chunk("/f", "x\n")];
        for expected in ["/f", "/f.0", "/f.1"] {
            client.put(expected, b"");
            client.inject_append_failure(expected, REPLICA_RELOCATION_MARKER);
            let err = coordinator.process(batch.clone()).await.unwrap_err();
            assert!(err.is_recoverable(), "{expected} should rotate");
        }

        // Index 2 is past the cap of 1; the file must not be retried.
        let err = coordinator.process(batch).await.unwrap_err();
        assert!(matches!(err, Error::RotationExceeded { .. }));
    }

    #[tokio::test]
    async fn one_bad_file_does_not_undo_the_good_one() {
        let client = Arc::new(MemoryClient::new());
        let coordinator = coordinator(&client, WriterConfig::default());
        client.put("/bad", b"");
        client.inject_append_failure("/bad", "quota exceeded");

        let err = coordinator
            .process(vec![chunk("/good", "kept\n"), chunk("/bad", "lost\n")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AppendFailure { .. }));
        assert_eq!(client.contents("/good").unwrap(), b"kept\n");
    }
}
