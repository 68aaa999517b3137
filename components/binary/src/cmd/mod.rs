pub mod append;
pub mod read;

use clap::Args;
use snafu::{ResultExt, Whatever};
use tokio::runtime::{Builder, Runtime};

use seam_client::{DfsClientRef, OpendalClient};

pub const STORAGE_OPTIONS_HEADER: &str = "Storage options";
pub const LOGGING_OPTIONS_HEADER: &str = "Logging options";

#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    #[arg(
        long,
        help = "WebHDFS endpoint, like 'http://namenode:9870' [default: local filesystem]",
        help_heading = STORAGE_OPTIONS_HEADER,
        value_name = "URL",
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        help = "Root all paths under this directory",
        help_heading = STORAGE_OPTIONS_HEADER,
        default_value = "/",
    )]
    pub root: String,
}

impl StorageArgs {
    pub fn build_client(&self) -> Result<DfsClientRef, Whatever> {
        let client = match &self.endpoint {
            Some(endpoint) => OpendalClient::new_webhdfs(endpoint, &self.root)
                .with_whatever_context(|e| format!("failed to connect to {endpoint}: {e}"))?,
            None => OpendalClient::new_fs(&self.root)
                .with_whatever_context(|e| format!("failed to open {}: {e}", self.root))?,
        };
        Ok(std::sync::Arc::new(client))
    }
}

pub fn build_runtime() -> Result<Runtime, Whatever> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_whatever_context(|e| format!("failed to build tokio runtime: {e}"))
}
