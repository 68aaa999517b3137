use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::err::{Error, UnsupportedFormatSnafu};

/// The closed set of record formats the reader can hand records off to.
/// Anything else is rejected when the configuration is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    JsonLines,
    Lines,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "json_lines" => Ok(Format::JsonLines),
            "lines" => Ok(Format::Lines),
            other => UnsupportedFormatSnafu { format: other }.fail(),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Format::JsonLines => write!(f, "json_lines"),
            Format::Lines => write!(f, "lines"),
        }
    }
}

/// Parse raw records into structured values. Malformed records are logged
/// and skipped rather than failing the whole slice.
pub fn parse_records(format: Format, records: Vec<Bytes>) -> Vec<Value> {
    match format {
        Format::JsonLines => records
            .iter()
            .filter_map(|record| match serde_json::from_slice(record) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!("dropping malformed record: {err}");
                    None
                }
            })
            .collect(),
        Format::Lines => records
            .iter()
            .map(|record| Value::String(String::from_utf8_lossy(record).into_owned()))
            .collect(),
    }
}
