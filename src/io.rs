//! Delimited-text matrices in, weighted operator and report out.

use ndarray::{Array2, ArrayView2};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::error::{FidelityError, Result};

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| FidelityError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|source| FidelityError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse comma-separated rows with their 1-based line numbers, skipping
/// blank lines.
fn parse_rows<T: FromStr>(path: &Path, text: &str) -> Result<Vec<(usize, Vec<T>)>>
where
    T::Err: std::fmt::Display,
{
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|field| {
                let field = field.trim();
                field.parse::<T>().map_err(|err| FidelityError::Parse {
                    path: path.display().to_string(),
                    line: lineno + 1,
                    message: format!("cannot parse {field:?}: {err}"),
                })
            })
            .collect::<Result<Vec<T>>>()?;
        rows.push((lineno + 1, row));
    }
    Ok(rows)
}

/// Load a dense real matrix. A file with a single line is a 1 x n matrix.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let rows: Vec<(usize, Vec<f64>)> = parse_rows(path, &read_text(path)?)?;
    let n_cols = rows.first().map_or(0, |(_, r)| r.len());
    if let Some((line, bad)) = rows.iter().find(|(_, r)| r.len() != n_cols) {
        return Err(FidelityError::Parse {
            path: path.display().to_string(),
            line: *line,
            message: format!("ragged matrix: {} columns, expected {n_cols}", bad.len()),
        });
    }
    let n_rows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flat_map(|(_, r)| r).collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|err| FidelityError::Parse {
        path: path.display().to_string(),
        line: 0,
        message: err.to_string(),
    })
}

/// Load source identities, laid out either as one row or one column.
pub fn load_identities(path: impl AsRef<Path>) -> Result<Vec<i32>> {
    let path = path.as_ref();
    let rows: Vec<(usize, Vec<i32>)> = parse_rows(path, &read_text(path)?)?;
    let single_row = rows.len() == 1;
    let single_col = rows.iter().all(|(_, r)| r.len() == 1);
    if !(single_row || single_col) {
        return Err(FidelityError::Parse {
            path: path.display().to_string(),
            line: 0,
            message: "source identities must be a single row or column".into(),
        });
    }
    Ok(rows.into_iter().flat_map(|(_, r)| r).collect())
}

/// Render a matrix as comma-separated text with round-trip `f64` precision.
pub fn matrix_to_csv(matrix: ArrayView2<'_, f64>) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{v:e}")).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn report_to_json<T: Serialize>(path: &Path, report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|err| FidelityError::Io {
        path: path.display().to_string(),
        source: err.into(),
    })
}

/// Write a matrix as comma-separated text.
pub fn write_matrix(path: impl AsRef<Path>, matrix: ArrayView2<'_, f64>) -> Result<()> {
    write_text(path.as_ref(), &matrix_to_csv(matrix))
}

/// Write any serializable report as pretty JSON.
pub fn write_report<T: Serialize>(path: impl AsRef<Path>, report: &T) -> Result<()> {
    let path = path.as_ref();
    write_text(path, &report_to_json(path, report)?)
}

/// Output files rendered up front and written all-or-nothing.
///
/// `commit` writes every file to a `.partial` sibling first and only renames
/// them into place once all of them were written, so a failed run leaves no
/// output behind.
#[derive(Debug, Default)]
pub struct OutputSet {
    files: Vec<(PathBuf, String)>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_matrix(&mut self, path: impl Into<PathBuf>, matrix: ArrayView2<'_, f64>) {
        self.files.push((path.into(), matrix_to_csv(matrix)));
    }

    pub fn add_report<T: Serialize>(&mut self, path: impl Into<PathBuf>, report: &T) -> Result<()> {
        let path = path.into();
        let text = report_to_json(&path, report)?;
        self.files.push((path, text));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn commit(self) -> Result<()> {
        let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(self.files.len());
        for (path, text) in &self.files {
            let tmp = partial_path(path);
            if let Err(err) = write_text(&tmp, text) {
                discard(&staged);
                return Err(err);
            }
            staged.push((tmp, path.as_path()));
        }
        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(source) = fs::rename(tmp, path) {
                discard(&staged[i..]);
                for (_, done) in &staged[..i] {
                    remove_logged(done);
                }
                return Err(FidelityError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        }
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        remove_logged(tmp);
    }
}

fn remove_logged(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("could not remove {}: {err}", path.display());
    }
}
