use std::str::FromStr;

use clap::Args;
use snafu::{ResultExt, Whatever};
use tracing::{debug, info};

use seam_client::DfsClientRef;
use seam_reader::chunk::read_slice;
use seam_reader::config::ReaderConfig;
use seam_reader::format::{parse_records, Format};
use seam_reader::walker::plan_ranges;
use seam_utils::readable_size::ReadableSize;

use crate::cmd::{StorageArgs, LOGGING_OPTIONS_HEADER};

const READ_OPTIONS_HEADER: &str = "Read options";

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Walk a file or directory of line-delimited files and print every record
to stdout, reading in bounded slices so records that straddle a slice
boundary come out whole.

Examples:

# Read a local directory of json lines
seam read /data/incoming

# Read from a WebHDFS cluster in 1 MiB slices
seam read --endpoint http://namenode:9870 --size 1MB /incoming
")]
pub struct ReadArgs {
    #[arg(help = "File or directory to read", value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[arg(
        long,
        help = "Size of one read slice",
        help_heading = READ_OPTIONS_HEADER,
        default_value = "100KB",
        value_parser = validate_size,
    )]
    pub size: String,

    #[arg(
        long,
        help = "Single-byte record delimiter",
        help_heading = READ_OPTIONS_HEADER,
        default_value = "\n",
    )]
    pub delimiter: String,

    #[arg(
        long,
        help = "Record format: json_lines or lines",
        help_heading = READ_OPTIONS_HEADER,
        default_value = "json_lines",
    )]
    pub format: Format,

    #[arg(
        long,
        help = "Log level",
        help_heading = LOGGING_OPTIONS_HEADER,
        default_value = "info",
    )]
    pub level: String,
}

impl ReadArgs {
    fn reader_config(&self) -> ReaderConfig {
        let size = ReadableSize::from_str(&self.size)
            .expect("slice size should be validated in the argument parser");
        ReaderConfig {
            path: self.path.clone(),
            size,
            delimiter: self.delimiter.clone(),
            format: self.format,
        }
    }

    pub fn run(&self) -> Result<(), Whatever> {
        seam_utils::logger::init_logging(&self.level)?;

        let config = self.reader_config();
        config
            .validate()
            .with_whatever_context(|e| format!("invalid read options: {e}"))?;
        let client = self.storage.build_client()?;

        let runtime = crate::cmd::build_runtime()?;
        runtime.block_on(read(client, config))
    }
}

async fn read(client: DfsClientRef, config: ReaderConfig) -> Result<(), Whatever> {
    let delimiter = config
        .delimiter_byte()
        .with_whatever_context(|e| format!("invalid read options: {e}"))?;
    let slices = plan_ranges(client.as_ref(), &config.path, config.size.as_bytes())
        .await
        .with_whatever_context(|e| format!("failed to plan {}: {e}", config.path))?;
    info!("planned {} slices under {}", slices.len(), config.path);

    let mut total = 0usize;
    for slice in slices {
        let records = read_slice(client.as_ref(), &slice, delimiter)
            .await
            .with_whatever_context(|e| format!("failed to read {}: {e}", slice.path()))?;
        debug!("{} records from {}", records.len(), slice.path());
        for value in parse_records(config.format, records) {
            // Plain lines print raw; json records reserialize compactly.
            match value.as_str() {
                Some(line) if config.format == Format::Lines => println!("{line}"),
                _ => println!("{value}"),
            }
            total += 1;
        }
    }
    info!("done, {total} records");
    Ok(())
}

fn validate_size(s: &str) -> Result<String, String> {
    let size = ReadableSize::from_str(s).map_err(|e| format!("invalid slice size: {e}"))?;
    if size.as_bytes() == 0 {
        return Err("slice size must be greater than zero".to_string());
    }
    Ok(s.to_string())
}
