//! Reading gazetteer rows from CSV.

use crate::error::ImportError;
use crate::record::SourceRecord;
use std::io::Read;
use std::path::Path;

/// Lazily read the rows of a gazetteer CSV export. Each row is keyed by the header line.
pub fn read_records(
    path: &Path,
) -> Result<impl Iterator<Item = Result<SourceRecord, csv::Error>>, ImportError> {
    if !path.is_file() {
        return Err(ImportError::SourceNotFound(path.to_path_buf()));
    }
    let reader = builder().from_path(path)?;
    Ok(decode(reader))
}

/// Lazily read gazetteer rows from any reader.
pub fn from_reader<R: Read>(reader: R) -> impl Iterator<Item = Result<SourceRecord, csv::Error>> {
    decode(builder().from_reader(reader))
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true);
    builder
}

fn decode<R: Read>(
    reader: csv::Reader<R>,
) -> impl Iterator<Item = Result<SourceRecord, csv::Error>> {
    reader.into_deserialize::<SourceRecord>()
}
