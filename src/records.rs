//! Line-delimited ENR files.
//!
//! Every record file holds one `enr:`-prefixed base64 record per line.
//! Blank lines are ignored on read.

use std::path::Path;

use discv5::Enr;

use crate::error::{Error, Result};
use crate::persist::write_atomic;

/// Parse one text-encoded record.
pub fn parse_record(text: &str) -> std::result::Result<Enr, String> {
    text.trim().parse::<Enr>()
}

/// Text encoding of a record, as written to record files.
pub fn encode_record(record: &Enr) -> String {
    record.to_base64()
}

/// Parse every non-empty line of `contents`, in order.
///
/// The first malformed line fails the whole parse.
pub fn parse_records(path: &Path, contents: &str) -> Result<Vec<Enr>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_record(line).map_err(|reason| Error::RecordParse {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            })
        })
        .collect()
}

/// Read a line-delimited record file.
pub async fn read_records(path: &Path) -> Result<Vec<Enr>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(path, e))?;
    parse_records(path, &contents)
}

/// Read a single-record file; a missing file yields `None`.
pub async fn read_optional_record(path: &Path) -> Result<Option<Enr>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    Ok(parse_records(path, &contents)?.into_iter().next())
}

/// Write a single record, replacing the file.
pub async fn write_record(path: &Path, record: &Enr) -> Result<()> {
    write_records(path, std::slice::from_ref(record)).await
}

/// Write records one per line, replacing the file.
pub async fn write_records(path: &Path, records: &[Enr]) -> Result<()> {
    let mut contents = String::new();
    for record in records {
        contents.push_str(&encode_record(record));
        contents.push('\n');
    }
    write_atomic(path, contents.as_bytes()).await
}
