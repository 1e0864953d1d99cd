//! Markdown table parsing and spreadsheet export.
//!
//! The ranking stage emits a pipe-delimited markdown table. This module
//! parses it with a small defined grammar (header row, optional separator
//! row, data rows) and writes the result as CSV for decision workshops.
//! Export is strictly best-effort: a missing or malformed table is logged
//! and skipped, never aborting the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Table parsing error types
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("no pipe-delimited table rows found")]
    NoRows,

    #[error("table has a header but no data rows")]
    NoDataRows,
}

/// Parsed ranking table: one header row plus one row per segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse a markdown table out of free-form text.
///
/// Grammar: lines starting with `|` are table lines; the first is the
/// header, lines whose cells consist solely of `-`/`:` are separators and
/// are dropped, everything else is a data row. Cells are trimmed. Rows are
/// padded or truncated to the header width rather than rejected — LLM
/// output is allowed to be slightly ragged.
pub fn parse_markdown_table(text: &str) -> Result<RankingTable, TableError> {
    let table_lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .collect();

    if table_lines.is_empty() {
        return Err(TableError::NoRows);
    }

    let mut rows_iter = table_lines.into_iter().map(split_row);
    let headers = rows_iter.next().expect("at least one table line");

    let mut rows = Vec::new();
    for cells in rows_iter {
        if is_separator_row(&cells) {
            continue;
        }
        let mut cells = cells;
        cells.resize(headers.len(), String::new());
        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(TableError::NoDataRows);
    }

    Ok(RankingTable { headers, rows })
}

fn split_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            !cell.is_empty() && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
        })
}

/// Write a parsed table as CSV under `out_dir`, named with the region and a
/// timestamp. Returns the written path.
pub fn write_csv(table: &RankingTable, region: &str, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("segment_ranking_{}_{}.csv", sanitize(region), timestamp);
    let path = out_dir.join(filename);

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(path)
}

/// Best-effort export of the ranking markdown to a CSV file.
///
/// Returns the written path, or `None` when there was nothing parseable or
/// the write failed; both cases are logged and the run continues.
pub fn export_ranking_table(markdown: &str, region: &str, out_dir: &Path) -> Option<PathBuf> {
    let table = match parse_markdown_table(markdown) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!(%err, "segment ranking table not exportable, skipping export");
            return None;
        }
    };

    match write_csv(&table, region, out_dir) {
        Ok(path) => {
            println!(
                "Segment ranking exported to: {} ({} segments)",
                path.display(),
                table.rows.len()
            );
            Some(path)
        }
        Err(err) => {
            tracing::warn!(%err, "failed to write segment ranking export");
            None
        }
    }
}

fn sanitize(region: &str) -> String {
    let cleaned: String = region
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"Some preamble text.

| Segment Name | Market Potential (1-5) | Ultimate Recommendation |
|---|---|---|
| Municipal water monitoring | 4 | Go |
| Precision irrigation SMEs | 5 | Go |
| Livestock tracking | 3 | Further Analyze |

Closing remarks."#;

    #[test]
    fn parses_headers_and_rows() {
        let table = parse_markdown_table(TABLE).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.headers[0], "Segment Name");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1][0], "Precision irrigation SMEs");
        assert_eq!(table.rows[2][2], "Further Analyze");
    }

    #[test]
    fn no_table_is_an_error() {
        assert!(matches!(
            parse_markdown_table("just prose, no pipes"),
            Err(TableError::NoRows)
        ));
    }

    #[test]
    fn header_without_rows_is_an_error() {
        let text = "| A | B |\n|---|---|\n";
        assert!(matches!(
            parse_markdown_table(text),
            Err(TableError::NoDataRows)
        ));
    }

    #[test]
    fn ragged_rows_are_padded_to_header_width() {
        let text = "| A | B | C |\n| 1 | 2 |\n";
        let table = parse_markdown_table(text).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn export_writes_matching_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_ranking_table(TABLE, "Finland", dir.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Header line plus one line per segment.
        assert_eq!(content.lines().count(), 4);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("segment_ranking_Finland_"));
    }

    #[test]
    fn export_skips_malformed_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(export_ranking_table("no table here", "Finland", dir.path()).is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
