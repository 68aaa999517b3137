use std::collections::BTreeMap;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, OptionExt, ResultExt};

use seam_common::LINE_DELIMITER;

use crate::append::RecordChunk;
use crate::config::WriterConfig;
use crate::err::{
    InvalidDateFieldSnafu, Result, SerializeRecordSnafu, UnsupportedIntervalSnafu,
};

/// Granularity of the timeseries directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeseries {
    Daily,
    Monthly,
    Yearly,
}

impl Timeseries {
    /// How much of an ISO-8601 date names the bucket.
    fn prefix_len(&self) -> usize {
        match self {
            Timeseries::Daily => 10,
            Timeseries::Monthly => 7,
            Timeseries::Yearly => 4,
        }
    }
}

impl FromStr for Timeseries {
    type Err = crate::err::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Timeseries::Daily),
            "monthly" => Ok(Timeseries::Monthly),
            "yearly" => Ok(Timeseries::Yearly),
            _ => UnsupportedIntervalSnafu { interval: s }.fail(),
        }
    }
}

/// Turns batches of JSON records into delimiter-terminated [RecordChunk]s,
/// bucketed by timeseries directory when one is configured.
pub struct RecordChunker {
    directory: String,
    worker_file: String,
    records_per_chunk: usize,
    timeseries: Option<Timeseries>,
    date_field: String,
}

impl RecordChunker {
    pub fn new(config: &WriterConfig) -> Self {
        let worker_file = config.filename.clone().unwrap_or_else(default_worker_file);
        Self {
            directory: config.directory.trim_end_matches('/').to_string(),
            worker_file,
            records_per_chunk: config.records_per_chunk,
            timeseries: config.timeseries,
            date_field: config.date_field.clone(),
        }
    }

    /// Split a batch into chunks of at most `records_per_chunk` records
    /// per destination file. Chunk payloads always end with the line
    /// delimiter so appends concatenate cleanly.
    pub fn chunk(&self, records: &[Value]) -> Result<Vec<RecordChunk>> {
        // BTreeMap keeps chunk emission order stable across runs.
        let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut chunks = Vec::new();

        for record in records {
            let filename = self.destination(record)?;
            let line = serde_json::to_string(record).context(SerializeRecordSnafu)?;
            let bucket = buckets.entry(filename.clone()).or_default();
            bucket.push(line);
            if bucket.len() >= self.records_per_chunk {
                let lines = std::mem::take(bucket);
                chunks.push(build_chunk(filename, &lines));
            }
        }
        for (filename, lines) in buckets {
            if !lines.is_empty() {
                chunks.push(build_chunk(filename, &lines));
            }
        }
        Ok(chunks)
    }

    fn destination(&self, record: &Value) -> Result<String> {
        match self.timeseries {
            None => Ok(format!("{}/{}", self.directory, self.worker_file)),
            Some(interval) => {
                let bucket = self.bucket_date(record, interval)?;
                Ok(format!("{}-{}/{}", self.directory, bucket, self.worker_file))
            }
        }
    }

    fn bucket_date(&self, record: &Value, interval: Timeseries) -> Result<String> {
        let date = record
            .get(&self.date_field)
            .and_then(Value::as_str)
            .context(InvalidDateFieldSnafu { field: &self.date_field })?;
        let prefix = interval.prefix_len();
        ensure!(
            date.len() >= prefix && date.is_char_boundary(prefix),
            InvalidDateFieldSnafu { field: &self.date_field }
        );
        // 2026-08-30 becomes the directory suffix 2026.08.30.
        Ok(date[..prefix].replace('-', "."))
    }
}

fn build_chunk(filename: String, lines: &[String]) -> RecordChunk {
    let mut data = lines.join("\n").into_bytes();
    data.push(LINE_DELIMITER);
    RecordChunk { filename, data: Bytes::from(data) }
}

fn default_worker_file() -> String {
    format!("{}.{}", seam_common::SEAM, seam_utils::random_id())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::err::Error;

    fn config(timeseries: Option<Timeseries>) -> WriterConfig {
        WriterConfig {
            directory: "/incoming".to_string(),
            filename: Some("worker-1".to_string()),
            records_per_chunk: 2,
            timeseries,
            ..Default::default()
        }
    }

    #[test]
    fn interval_parsing() {
        assert_eq!("daily".parse::<Timeseries>().unwrap(), Timeseries::Daily);
        assert_eq!("yearly".parse::<Timeseries>().unwrap(), Timeseries::Yearly);
        assert!(matches!(
            "hourly".parse::<Timeseries>(),
            Err(Error::UnsupportedInterval { .. })
        ));
    }

    #[test]
    fn splits_on_records_per_chunk() {
        let chunker = RecordChunker::new(&config(None));
        let records: Vec<_> = (0..5).map(|i| json!({ "n": i })).collect();

        let chunks = chunker.chunk(&records).unwrap();
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.filename, "/incoming/worker-1");
            assert!(chunk.data.ends_with(b"\n"));
        }
        assert_eq!(chunks[0].data, "{\"n\":0}\n{\"n\":1}\n");
        assert_eq!(chunks[2].data, "{\"n\":4}\n");
    }

    #[test]
    fn timeseries_buckets_by_date_prefix() {
        let chunker = RecordChunker::new(&config(Some(Timeseries::Monthly)));
        let records = vec![
            json!({ "date": "2026-08-30T01:00:00Z", "n": 1 }),
            json!({ "date": "2026-09-01T00:00:00Z", "n": 2 }),
            json!({ "date": "2026-08-02T12:00:00Z", "n": 3 }),
        ];

        let chunks = chunker.chunk(&records).unwrap();
        let mut names: Vec<_> = chunks.iter().map(|c| c.filename.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["/incoming-2026.08/worker-1", "/incoming-2026.09/worker-1"]
        );
        let august = chunks
            .iter()
            .find(|c| c.filename == "/incoming-2026.08/worker-1")
            .unwrap();
        assert_eq!(august.data.iter().filter(|b| **b == b'\n').count(), 2);
    }

    #[test]
    fn daily_and_yearly_prefixes() {
        let record = json!({ "date": "2026-08-30", "n": 1 });
        for (interval, dir) in [
            (Timeseries::Daily, "/incoming-2026.08.30/worker-1"),
            (Timeseries::Yearly, "/incoming-2026/worker-1"),
        ] {
            let chunker = RecordChunker::new(&config(Some(interval)));
            let chunks = chunker.chunk(std::slice::from_ref(&record)).unwrap();
            assert_eq!(chunks[0].filename, dir);
        }
    }

    #[test]
    fn missing_or_short_date_field_is_an_error() {
        let chunker = RecordChunker::new(&config(Some(Timeseries::Daily)));
        for record in [json!({ "n": 1 }), json!({ "date": 42 }), json!({ "date": "2026" })] {
            let err = chunker.chunk(&[record]).unwrap_err();
            assert!(matches!(err, Error::InvalidDateField { .. }));
        }
    }

    #[test]
    fn generated_worker_file_is_namespaced() {
        let config = WriterConfig { filename: None, ..Default::default() };
        let chunker = RecordChunker::new(&config);
        assert!(chunker.worker_file.starts_with("seam."));
    }
}
