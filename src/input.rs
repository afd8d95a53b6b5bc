use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::MailcowError;

/// One row of input cells, numbered from 1 in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl InputRecord {
    pub fn new<I, S>(row_number: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            row_number,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<InputRecord>, MailcowError> {
    let file = File::open(path)?;
    read_records(file)
}

/// Line (1-based) on which the record found at `offset` starts. The
/// parser reports a skipped blank line's offset as the record's, so line
/// breaks directly at `offset` are stepped over first.
fn line_at(data: &[u8], offset: usize) -> usize {
    let mut start = offset.min(data.len());
    while matches!(data.get(start), Some(b'\n' | b'\r')) {
        start += 1;
    }
    1 + data[..start].iter().filter(|&&b| b == b'\n').count()
}

/// Reads every row as-is: no header handling, rows may differ in length.
/// Row numbers are physical file lines, blank lines included.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<InputRecord>, MailcowError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut records = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row_number = record
            .position()
            .map(|p| line_at(&data, p.byte() as usize))
            .unwrap_or(index + 1);
        records.push(InputRecord::new(row_number, record.iter()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_keep_their_cells() {
        let data = "destination,nexthop\nexample.org,[relay]:587,user,secret\nexample.net\n";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells.len(), 4);
        assert_eq!(rows[2].cells, ["example.net"]);
    }

    #[test]
    fn row_numbers_follow_file_lines() {
        let data = "a,b\n\nc,d\n";
        let rows = read_records(data.as_bytes()).unwrap();
        let numbers: Vec<_> = rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers.first(), Some(&1));
        assert_eq!(numbers.last(), Some(&3));
    }

    #[test]
    fn leading_and_repeated_blank_lines_are_counted() {
        let data = "\naddress,goto\n\n\r\nbad@example.com,\n";
        let rows = read_records(data.as_bytes()).unwrap();
        let numbers: Vec<_> = rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, [2, 5]);
    }

    #[test]
    fn line_offsets() {
        let data = b"a,b\n\nc,d\n";
        assert_eq!(line_at(data, 0), 1);
        assert_eq!(line_at(data, 4), 3);
        assert_eq!(line_at(data, 5), 3);
    }

    #[test]
    fn quoted_goto_lists_stay_in_one_cell() {
        let data = "team@example.com,\"a@example.com,b@example.com\"\n";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows[0].cells[1], "a@example.com,b@example.com");
    }
}
