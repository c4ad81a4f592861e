use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use haplomap_core::{ColumnIndex, MissingColumns, RawRecord};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub(crate) enum InputError {
    #[display("failed to open input table {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("malformed input table {}", path.display())]
    Malformed { path: PathBuf, source: csv::Error },
    #[display("unexpected header in {}", path.display())]
    Header {
        path: PathBuf,
        source: MissingColumns,
    },
}

/// Delimiter used when none is given: tab for AADR `.anno` and other
/// tab-separated files, comma otherwise.
pub(crate) fn default_delimiter(path: &Path) -> u8 {
    let tab_separated = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ["anno", "tsv", "txt"].contains(&ext.to_ascii_lowercase().as_str()));
    if tab_separated { b'\t' } else { b',' }
}

/// Reads every data row of the annotation table at `path`.
pub(crate) fn read_table(path: &Path, delimiter: Option<u8>) -> Result<Vec<RawRecord>, InputError> {
    let delimiter = delimiter.unwrap_or_else(|| default_delimiter(path));
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_owned(),
        source,
    })?;
    read_records(BufReader::new(file), delimiter).map_err(|e| match e {
        ReadError::Csv(source) => InputError::Malformed {
            path: path.to_owned(),
            source,
        },
        ReadError::Header(source) => InputError::Header {
            path: path.to_owned(),
            source,
        },
    })
}

#[derive(Debug)]
enum ReadError {
    Csv(csv::Error),
    Header(MissingColumns),
}

/// Reads a delimited table whose first row is the header.
///
/// Rows may have varying lengths. Cells are decoded as UTF-8 with invalid
/// sequences replaced, and quotes are only honored for comma-separated input.
fn read_records<R>(reader: R, delimiter: u8) -> Result<Vec<RawRecord>, ReadError>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quoting(delimiter == b',')
        .flexible(true)
        .from_reader(reader);

    let headers = reader.byte_headers().map_err(ReadError::Csv)?;
    let index = ColumnIndex::from_headers(headers.iter().map(String::from_utf8_lossy))
        .map_err(ReadError::Header)?;

    let mut records = vec![];
    for (i, row) in reader.byte_records().enumerate() {
        let row = row.map_err(ReadError::Csv)?;
        records.push(index.record(i + 1, row.iter().map(String::from_utf8_lossy)));
    }
    Ok(records)
}
