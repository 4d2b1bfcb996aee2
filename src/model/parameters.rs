use crate::error::{CodecError, Result, ensure_same_len};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-note expressive parameters: one row per note, one named column per parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ParameterMatrix {
    pub fn zeros(names: Vec<String>, n_rows: usize) -> Self {
        let width = names.len();
        Self {
            names,
            rows: vec![vec![0.0; width]; n_rows],
        }
    }

    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for row in &rows {
            ensure_same_len("parameter row", names.len(), row.len())?;
        }
        Ok(Self { names, rows })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.rows[row][col] = value;
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[col]).collect()
    }

    pub fn column_by_name(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.names.iter().position(|n| n == name)?;
        Some(self.column(col))
    }

    /// Copy out the columns in `cols`.
    pub fn select_columns(&self, cols: Range<usize>) -> Result<Self> {
        if cols.end > self.n_cols() || cols.start > cols.end {
            return Err(CodecError::ShapeMismatch {
                what: "parameter columns",
                expected: self.n_cols(),
                found: cols.end,
            });
        }

        Ok(Self {
            names: self.names[cols.clone()].to_vec(),
            rows: self.rows.iter().map(|r| r[cols.clone()].to_vec()).collect(),
        })
    }

    /// Place the columns of `right` after the columns of `self`.
    pub fn hstack(self, right: ParameterMatrix) -> Result<Self> {
        ensure_same_len("stacked parameter rows", self.n_rows(), right.n_rows())?;

        let mut names = self.names;
        names.extend(right.names);

        let rows = self
            .rows
            .into_iter()
            .zip(right.rows)
            .map(|(mut l, r)| {
                l.extend(r);
                l
            })
            .collect();

        Ok(Self { names, rows })
    }
}
