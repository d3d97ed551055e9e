//! CSV dataset model
//!
//! A [`Dataset`] is the header row plus every record of a track CSV, kept as
//! strings so that columns the tools do not understand are written back
//! untouched. Numeric access parses on demand.

use crate::atomic::replace_file;
use crate::features::AudioFeature;
use crate::{Error, Result};
use csv::StringRecord;
use ndarray::Array2;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// How [`Dataset::feature_matrix`] treats empty or non-numeric cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValues {
    /// Fail with [`Error::InvalidInput`] naming the row and column
    Reject,
    /// Substitute 0.0
    ZeroFill,
}

/// In-memory CSV table: header plus string records
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Dataset {
    /// Load a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        debug!(
            "Loaded {} rows x {} columns from {}",
            dataset.len(),
            dataset.headers.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { headers, records })
    }

    /// Write the dataset as CSV, replacing `path` atomically
    pub fn write(&self, path: &Path) -> Result<()> {
        replace_file(path, |out| {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(&self.headers)?;
            for record in &self.records {
                wtr.write_record(record)?;
            }
            wtr.flush()?;
            Ok(())
        })
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of the column named exactly `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First candidate column name present in the header
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    /// Features from `candidates` whose column exists, in candidate order
    pub fn present_features(&self, candidates: &[AudioFeature]) -> Vec<AudioFeature> {
        candidates
            .iter()
            .copied()
            .filter(|f| self.has_column(f.column_name()))
            .collect()
    }

    /// Raw cell text
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.records.get(row).and_then(|r| r.get(column))
    }

    /// Parsed numeric column, `None` if the column is absent
    ///
    /// Empty, non-numeric and NaN cells come back as `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(
            self.records
                .iter()
                .map(|r| r.get(idx).and_then(parse_number))
                .collect(),
        )
    }

    /// Numeric matrix over every row for the given columns
    pub fn feature_matrix(&self, columns: &[&str], missing: MissingValues) -> Result<Array2<f64>> {
        let rows: Vec<usize> = (0..self.len()).collect();
        self.feature_matrix_for_rows(&rows, columns, missing)
    }

    /// Numeric matrix over a subset of rows, in the order given
    pub fn feature_matrix_for_rows(
        &self,
        rows: &[usize],
        columns: &[&str],
        missing: MissingValues,
    ) -> Result<Array2<f64>> {
        let absent: Vec<String> = columns
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !absent.is_empty() {
            return Err(Error::MissingColumns(absent));
        }

        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        let mut matrix = Array2::<f64>::zeros((rows.len(), columns.len()));
        for (out_row, &row) in rows.iter().enumerate() {
            let record = self.records.get(row).ok_or_else(|| {
                Error::InvalidInput(format!("row index {} out of range ({} rows)", row, self.len()))
            })?;
            for (out_col, &col) in indices.iter().enumerate() {
                let raw = record.get(col).unwrap_or("");
                matrix[[out_row, out_col]] = match (parse_number(raw), missing) {
                    (Some(v), _) => v,
                    (None, MissingValues::ZeroFill) => 0.0,
                    (None, MissingValues::Reject) => {
                        return Err(Error::InvalidInput(format!(
                            "row {} column '{}': value '{}' is not numeric",
                            row + 1,
                            columns[out_col],
                            raw
                        )));
                    }
                };
            }
        }

        Ok(matrix)
    }

    /// Set a column to `values`, replacing it in place if it exists or
    /// appending it otherwise
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::InvalidInput(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (record, value) in self.records.iter_mut().zip(values) {
                    let rebuilt: StringRecord = record
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| if i == idx { value.as_str() } else { cell })
                        .collect();
                    *record = rebuilt;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.push_field(&value);
                }
            }
        }

        Ok(())
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "track_name,artists,tempo,energy\n\
                          Song A,Artist 1,120.5,0.8\n\
                          Song B,Artist 2,,0.3\n\
                          \"Song, C\",Artist 3,98,abc\n";

    fn sample() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_reader_parses_headers_and_rows() {
        let ds = sample();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.headers(), &["track_name", "artists", "tempo", "energy"]);
        assert_eq!(ds.cell(2, 0), Some("Song, C"));
    }

    #[test]
    fn test_first_present_respects_priority() {
        let ds = sample();
        assert_eq!(ds.first_present(&["artist_name", "artists", "artist"]), Some("artists"));
        assert_eq!(ds.first_present(&["title"]), None);
    }

    #[test]
    fn test_numeric_column_handles_missing_cells() {
        let ds = sample();
        let tempo = ds.numeric_column("tempo").unwrap();
        assert_eq!(tempo, vec![Some(120.5), None, Some(98.0)]);
        assert!(ds.numeric_column("loudness").is_none());
    }

    #[test]
    fn test_feature_matrix_zero_fill() {
        let ds = sample();
        let m = ds
            .feature_matrix(&["tempo", "energy"], MissingValues::ZeroFill)
            .unwrap();
        assert_eq!(m.shape(), &[3, 2]);
        assert_eq!(m[[1, 0]], 0.0);
        assert_eq!(m[[2, 1]], 0.0);
        assert_eq!(m[[0, 0]], 120.5);
    }

    #[test]
    fn test_feature_matrix_reject_names_row_and_column() {
        let ds = sample();
        let err = ds
            .feature_matrix(&["tempo"], MissingValues::Reject)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{}", msg);
        assert!(msg.contains("tempo"), "{}", msg);
    }

    #[test]
    fn test_feature_matrix_missing_columns_listed() {
        let ds = sample();
        let err = ds
            .feature_matrix(&["tempo", "loudness", "valence"], MissingValues::ZeroFill)
            .unwrap_err();
        match err {
            Error::MissingColumns(cols) => assert_eq!(cols, vec!["loudness", "valence"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_feature_matrix_for_rows_keeps_order() {
        let ds = sample();
        let m = ds
            .feature_matrix_for_rows(&[2, 0], &["tempo"], MissingValues::ZeroFill)
            .unwrap();
        assert_eq!(m[[0, 0]], 98.0);
        assert_eq!(m[[1, 0]], 120.5);
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut ds = sample();
        ds.set_column("Cluster", vec!["0".into(), "1".into(), "2".into()])
            .unwrap();
        assert_eq!(ds.headers().last().map(String::as_str), Some("Cluster"));
        assert_eq!(ds.cell(1, 4), Some("1"));

        ds.set_column("Cluster", vec!["4".into(), "4".into(), "3".into()])
            .unwrap();
        assert_eq!(ds.headers().len(), 5);
        assert_eq!(ds.cell(2, 4), Some("3"));
        assert_eq!(ds.cell(2, 0), Some("Song, C"));
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut ds = sample();
        assert!(ds.set_column("Cluster", vec!["0".into()]).is_err());
    }

    #[test]
    fn test_write_preserves_quoted_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let ds = sample();
        ds.write(&path).unwrap();

        let reloaded = Dataset::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.cell(2, 0), Some("Song, C"));
        assert_eq!(reloaded.cell(1, 2), Some(""));
    }
}
