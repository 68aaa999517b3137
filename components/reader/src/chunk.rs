use bytes::Bytes;
use snafu::ResultExt;
use tracing::debug;

use seam_client::{ByteRange, DfsClient};
use seam_common::MARGIN_SAFETY_FACTOR;

use crate::err::{ReadFailureSnafu, Result};
use crate::slice::Slice;

/// Working state for reading one slice.
#[derive(Debug)]
struct ChunkContext {
    path: String,
    delimiter: u8,
    /// Whether the slice can end mid-record; false for full-file slices
    /// and for slices that reach the end of the file.
    need_margin: bool,
    /// Primary read options; `None` reads the whole file.
    options: Option<ByteRange>,
}

fn read_options(slice: &Slice, delimiter: u8) -> ChunkContext {
    match slice {
        Slice::Full { path } => ChunkContext {
            path: path.clone(),
            delimiter,
            need_margin: false,
            options: None,
        },
        Slice::Range { path, offset, length, total } => ChunkContext {
            path: path.clone(),
            delimiter,
            need_margin: offset + length != *total,
            options: Some(ByteRange { offset: *offset, length: *length }),
        },
    }
}

fn average_record_size(data: &[u8], delimiter: u8) -> u64 {
    let mut total = 0u64;
    let mut count = 0u64;
    for field in data.split(|b| *b == delimiter) {
        total += field.len() as u64;
        count += 1;
    }
    total / count
}

/// Margin read options for a slice whose primary data stopped mid-record,
/// or `None` when the data already ends on a complete record. The margin
/// spans twice the average record size of the primary chunk; a trailing
/// record longer than that is still truncated.
fn check_margin(ctx: &ChunkContext, data: &[u8]) -> Option<ByteRange> {
    // Data ending with the delimiter already ends with a complete record.
    if data.last() == Some(&ctx.delimiter) {
        return None;
    }
    if !ctx.need_margin {
        return None;
    }
    let options = ctx.options?;
    let avg_size = average_record_size(data, ctx.delimiter);
    Some(ByteRange {
        offset: options.offset + options.length,
        length: avg_size * MARGIN_SAFETY_FACTOR,
    })
}

/// Break slice data into records. Slices with a non-zero offset grabbed the
/// byte immediately preceding the partition point, so splitting always
/// leaves one garbage field at the front: either that boundary byte was the
/// delimiter (empty field) or the slice started mid-record and the previous
/// slice's margin read already owns the completion. Offset-zero slices
/// never start with a garbage field.
fn clean_records(data: &[u8], delimiter: u8, offset: u64) -> Vec<Bytes> {
    if data.is_empty() {
        return Vec::new();
    }
    // Drop a trailing delimiter so it does not produce an empty record.
    let data = match data.last() {
        Some(last) if *last == delimiter => &data[..data.len() - 1],
        _ => data,
    };
    let skip = usize::from(offset != 0);
    let data = Bytes::copy_from_slice(data);
    let mut records = Vec::new();
    let mut start = 0usize;
    for pos in 0..=data.len() {
        if pos == data.len() || data[pos] == delimiter {
            records.push(data.slice(start..pos));
            start = pos + 1;
        }
    }
    records.drain(..skip.min(records.len()));
    records
}

/// Read one slice and return the complete records it holds, in order.
///
/// Performs the primary ranged read, then, when the slice stops mid-record,
/// a bounded margin read just past the slice end to recover the truncated
/// tail. Concatenating the outputs of all slices of a file in slice order
/// reproduces exactly the records of that file.
pub async fn read_slice(
    client: &dyn DfsClient,
    slice: &Slice,
    delimiter: u8,
) -> Result<Vec<Bytes>> {
    let ctx = read_options(slice, delimiter);
    let primary_offset = ctx.options.map_or(0, |o| o.offset);
    let mut data = client
        .read(&ctx.path, ctx.options)
        .await
        .context(ReadFailureSnafu { path: &ctx.path, offset: primary_offset })?;

    if let Some(margin_options) = check_margin(&ctx, &data) {
        if margin_options.length > 0 {
            let margin = client
                .read(&ctx.path, Some(margin_options))
                .await
                .context(ReadFailureSnafu { path: &ctx.path, offset: margin_options.offset })?;
            // The margin's prefix up to its first delimiter is the
            // remainder of the record truncated at the slice end.
            let remainder = margin
                .iter()
                .position(|b| *b == delimiter)
                .unwrap_or(margin.len());
            debug!(
                "margin read {} recovered {} trailing bytes",
                ctx.path, remainder
            );
            data.extend_from_slice(&margin[..remainder]);
        }
    }

    Ok(clean_records(&data, delimiter, primary_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seam_client::MemoryClient;
    use seam_common::LINE_DELIMITER;

    use crate::slice::plan_slices;

    fn records_to_strings(records: &[Bytes]) -> Vec<String> {
        records
            .iter()
            .map(|r| String::from_utf8(r.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn read_options_for_margin_and_end_slices() {
        let margin_slice =
            Slice::Range { path: "/some/test/file".to_string(), offset: 0, length: 10, total: 20 };
        let end_slice =
            Slice::Range { path: "/some/test/file".to_string(), offset: 10, length: 10, total: 20 };

        let margin_ctx = read_options(&margin_slice, LINE_DELIMITER);
        let end_ctx = read_options(&end_slice, LINE_DELIMITER);
        assert!(margin_ctx.need_margin);
        assert!(!end_ctx.need_margin);
        assert_eq!(margin_ctx.path, "/some/test/file");
        assert_eq!(margin_ctx.options, Some(ByteRange { offset: 0, length: 10 }));
    }

    #[test]
    fn complete_data_needs_no_margin() {
        let ctx = ChunkContext {
            path: "/f".to_string(),
            delimiter: LINE_DELIMITER,
            need_margin: true,
            options: Some(ByteRange { offset: 0, length: 15 }),
        };
        assert_eq!(check_margin(&ctx, b"some test data\n"), None);
    }

    #[test]
    fn margin_spans_two_average_records() {
        let ctx = ChunkContext {
            path: "/f".to_string(),
            delimiter: LINE_DELIMITER,
            need_margin: true,
            options: Some(ByteRange { offset: 10, length: 10 }),
        };
        let margin = check_margin(&ctx, b"some\nmore\ntest\ndata").unwrap();
        assert_eq!(margin.offset, 20);
        assert_eq!(margin.length, 8);
    }

    #[test]
    fn full_file_slice_never_reads_a_margin() {
        let ctx = read_options(&Slice::Full { path: "/f".to_string() }, LINE_DELIMITER);
        assert_eq!(check_margin(&ctx, b"partial record without delimite"), None);
    }

    #[test]
    fn clean_keeps_all_fields_at_offset_zero() {
        let records = clean_records(b"some\nmore\ntest\ndata\n", LINE_DELIMITER, 0);
        assert_eq!(records_to_strings(&records), vec!["some", "more", "test", "data"]);
    }

    #[test]
    fn clean_drops_first_field_past_offset_zero() {
        let records = clean_records(b"some\nmore\ntest\ndata", LINE_DELIMITER, 10);
        assert_eq!(records_to_strings(&records), vec!["more", "test", "data"]);
    }

    #[test]
    fn clean_of_empty_data_is_empty() {
        assert!(clean_records(b"", LINE_DELIMITER, 0).is_empty());
    }

    #[tokio::test]
    async fn margin_recovers_record_truncated_at_boundary() {
        let client = MemoryClient::new();
        client.put("/f", b"aaaa\nbbbbbb\ncc\nddddd\neeee\n");

        let slices = plan_slices("/f", 26, 10);
        assert_eq!(slices.len(), 3);

        let first = read_slice(&client, &slices[0], LINE_DELIMITER).await.unwrap();
        assert_eq!(records_to_strings(&first), vec!["aaaa", "bbbbbb"]);

        let second = read_slice(&client, &slices[1], LINE_DELIMITER).await.unwrap();
        assert_eq!(records_to_strings(&second), vec!["cc", "ddddd"]);

        let third = read_slice(&client, &slices[2], LINE_DELIMITER).await.unwrap();
        assert_eq!(records_to_strings(&third), vec!["eeee"]);
    }

    #[tokio::test]
    async fn slices_reassemble_every_record_exactly_once() {
        let records: Vec<String> = (0..200).map(|i| format!("record-{i:04}")).collect();
        let mut content = records.join("\n");
        content.push('\n');
        let client = MemoryClient::new();
        client.put("/data/f", content.as_bytes());

        for slice_size in [24u64, 64, 100, 1000, content.len() as u64 + 1] {
            let mut seen = Vec::new();
            for slice in plan_slices("/data/f", content.len() as u64, slice_size) {
                let chunk = read_slice(&client, &slice, LINE_DELIMITER).await.unwrap();
                seen.extend(records_to_strings(&chunk));
            }
            assert_eq!(seen, records, "slice_size {slice_size}");
        }
    }

    #[tokio::test]
    async fn full_file_read_without_trailing_delimiter() {
        let client = MemoryClient::new();
        client.put("/f", b"one\ntwo");
        let records = read_slice(&client, &Slice::Full { path: "/f".to_string() }, LINE_DELIMITER)
            .await
            .unwrap();
        assert_eq!(records_to_strings(&records), vec!["one", "two"]);
    }
}
