// Primitives for reading CSV catalogs.

use std::io::Read;

use crate::survey::{
    io_common::{find_columns, ParsedItem},
    *,
};

pub fn read_csv_catalog(path: &str) -> SurveyResult<Vec<ParsedItem>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    parse_csv_catalog(rdr, path)
}

pub fn parse_csv_catalog<R: Read>(
    mut rdr: csv::Reader<R>,
    path: &str,
) -> SurveyResult<Vec<ParsedItem>> {
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let columns = find_columns(&header, path)?;

    let mut res: Vec<ParsedItem> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("parse_csv_catalog: lineno: {:?} row: {:?}", lineno, line);
        if line.iter().all(|s| s.trim().is_empty()) {
            continue;
        }
        let row: Vec<Option<String>> = line.iter().map(|s| Some(s.to_string())).collect();
        res.push(columns.parse_row(lineno, &row));
    }
    Ok(res)
}
