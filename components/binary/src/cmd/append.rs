use std::io::{BufRead, BufReader};

use clap::Args;
use serde_json::Value;
use snafu::{whatever, ResultExt, Whatever};
use tracing::{info, warn};

use seam_writer::{AppendCoordinator, RecordChunker, Timeseries, WriterConfig};

use crate::cmd::{StorageArgs, LOGGING_OPTIONS_HEADER};

const APPEND_OPTIONS_HEADER: &str = "Append options";

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Append json records (one per input line) to files under a directory,
creating missing files and rotating destinations when appends hit a
replica being relocated.

Examples:

# Append stdin records to a single worker file
cat records.jsonl | seam append /data/incoming

# Bucket records into daily directories by their 'created' field
seam append --timeseries daily --date-field created /data/incoming -i records.jsonl
")]
pub struct AppendArgs {
    #[arg(help = "Destination directory", value_name = "DIRECTORY")]
    pub directory: String,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[arg(
        long,
        short,
        help = "Input file of json records [default: stdin]",
        help_heading = APPEND_OPTIONS_HEADER,
        value_name = "FILE",
    )]
    pub input: Option<String>,

    #[arg(
        long,
        help = "Destination file name [default: a generated worker name]",
        help_heading = APPEND_OPTIONS_HEADER,
    )]
    pub filename: Option<String>,

    #[arg(
        long,
        help = "Records per appended chunk",
        help_heading = APPEND_OPTIONS_HEADER,
        default_value = "50000",
    )]
    pub records_per_chunk: usize,

    #[arg(
        long,
        help = "Bucket records into dated directories: daily, monthly or yearly",
        help_heading = APPEND_OPTIONS_HEADER,
    )]
    pub timeseries: Option<Timeseries>,

    #[arg(
        long,
        help = "Record field holding the ISO-8601 date used for bucketing",
        help_heading = APPEND_OPTIONS_HEADER,
        default_value = "date",
    )]
    pub date_field: String,

    #[arg(
        long,
        help = "How many rotations to allow per file before giving up",
        help_heading = APPEND_OPTIONS_HEADER,
        default_value = "100",
    )]
    pub max_rotations: u32,

    #[arg(
        long,
        help = "Embed undelivered payloads in append errors",
        help_heading = APPEND_OPTIONS_HEADER,
    )]
    pub log_data_on_error: bool,

    #[arg(
        long,
        help = "Log level",
        help_heading = LOGGING_OPTIONS_HEADER,
        default_value = "info",
    )]
    pub level: String,
}

impl AppendArgs {
    fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            directory: self.directory.clone(),
            filename: self.filename.clone(),
            records_per_chunk: self.records_per_chunk,
            timeseries: self.timeseries,
            date_field: self.date_field.clone(),
            max_rotations: self.max_rotations,
            log_data_on_error: self.log_data_on_error,
        }
    }

    fn read_records(&self) -> Result<Vec<Value>, Whatever> {
        let reader: Box<dyn BufRead> = match &self.input {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_whatever_context(|e| format!("failed to open {path}: {e}"))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(BufReader::new(std::io::stdin())),
        };

        let mut records = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line =
                line.with_whatever_context(|e| format!("failed to read input: {e}"))?;
            if line.is_empty() {
                continue;
            }
            let value = serde_json::from_str(&line).with_whatever_context(|e| {
                format!("input line {} is not valid json: {e}", number + 1)
            })?;
            records.push(value);
        }
        Ok(records)
    }

    pub fn run(&self) -> Result<(), Whatever> {
        seam_utils::logger::init_logging(&self.level)?;

        let config = self.writer_config();
        config
            .validate()
            .with_whatever_context(|e| format!("invalid append options: {e}"))?;
        let client = self.storage.build_client()?;

        let records = self.read_records()?;
        if records.is_empty() {
            whatever!("no records to append");
        }

        let chunker = RecordChunker::new(&config);
        let batch = chunker
            .chunk(&records)
            .with_whatever_context(|e| format!("failed to chunk records: {e}"))?;
        info!("{} records in {} chunks", records.len(), batch.len());

        let coordinator = AppendCoordinator::new(client, &config);
        let runtime = crate::cmd::build_runtime()?;
        runtime.block_on(async move {
            // Rotated destinations are recoverable; redrive the batch until
            // it lands or the failure is terminal.
            loop {
                match coordinator.process(batch.clone()).await {
                    Ok(()) => break Ok(()),
                    Err(err) if err.is_recoverable() => {
                        warn!("redriving batch: {err}");
                    }
                    Err(err) => {
                        break Err(err).with_whatever_context(|e| {
                            format!("failed to append records: {e}")
                        })
                    }
                }
            }
        })?;
        info!("appended {} records under {}", records.len(), self.directory);
        Ok(())
    }
}
