//! Tab-separated rendering of encoded rows.
//!
//! Rows are joined by `\n`, values by `\t`. There is no header and no
//! trailing newline. The first row fixes the expected width; every value
//! must be tab-free (codecs escape newlines but never tabs).

/// Rendering failures. Each carries enough context to locate the bad row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TsvError {
    /// A row's width differs from the first row's.
    #[error("row {row} has {found} values, expected {expected}: {content:?}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
        content: Vec<String>,
    },
    /// A value contains a literal tab.
    #[error("value in row {row} column {column} contains a tab: {value:?}")]
    TabInValue {
        row: usize,
        column: usize,
        value: String,
    },
}

/// Join encoded rows into the store's tab-separated payload.
///
/// An empty row list yields the empty string.
pub fn render<R: AsRef<[String]>>(rows: &[R]) -> Result<String, TsvError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let expected = first.as_ref().len();
    let mut out = String::new();

    for (row_index, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != expected {
            return Err(TsvError::DimensionMismatch {
                row: row_index,
                expected,
                found: row.len(),
                content: row.to_vec(),
            });
        }
        if row_index > 0 {
            out.push('\n');
        }
        for (column, value) in row.iter().enumerate() {
            if value.contains('\t') {
                return Err(TsvError::TabInValue {
                    row: row_index,
                    column,
                    value: value.clone(),
                });
            }
            if column > 0 {
                out.push('\t');
            }
            out.push_str(value);
        }
    }
    Ok(out)
}

/// Split a tab-separated response body into rows of raw wire values.
/// Blank lines (including a trailing newline) are skipped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}
