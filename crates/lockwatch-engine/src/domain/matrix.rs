//! Dense N×R count matrix (Allocation / Request)

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row-major matrix of non-negative unit counts
///
/// Rows are processes, columns are resource types. Serialized as a list of
/// rows so reports read naturally as `[[0, 1], [1, 0]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<u32>>", try_from = "Vec<Vec<u32>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    cells: Vec<u32>,
}

impl Matrix {
    /// All-zero matrix of the given shape
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Build from explicit rows
    ///
    /// # Errors
    /// `RaggedMatrix` if the rows do not all have the same length.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, ConfigError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(ConfigError::RaggedMatrix);
        }
        let row_count = rows.len();
        Ok(Self {
            rows: row_count,
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows (processes)
    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (resource types)
    #[inline]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Cell value; callers index within bounds
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub(crate) fn set(&mut self, row: usize, col: usize, value: u32) {
        self.cells[row * self.cols + col] = value;
    }

    /// One process's row
    pub fn row(&self, row: usize) -> &[u32] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Sum of a column, widened so it cannot overflow
    pub fn column_sum(&self, col: usize) -> u64 {
        (0..self.rows).map(|row| u64::from(self.get(row, col))).sum()
    }

    /// Whether every cell is zero
    pub fn is_zero(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Copy out as nested rows
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..self.rows).map(|row| self.row(row).to_vec()).collect()
    }
}

impl From<Matrix> for Vec<Vec<u32>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

impl TryFrom<Vec<Vec<u32>>> for Matrix {
    type Error = ConfigError;

    fn try_from(rows: Vec<Vec<u32>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .cells
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(3);

        write!(f, "     ")?;
        for col in 0..self.cols {
            write!(f, " {:>width$}", format!("R{col}"))?;
        }
        for row in 0..self.rows {
            writeln!(f)?;
            write!(f, "  {:<3}", format!("P{row}"))?;
            for value in self.row(row) {
                write!(f, " {value:>width$}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_set() {
        let mut m = Matrix::zeros(2, 3);
        assert!(m.is_zero());
        m.set(1, 2, 7);
        assert_eq!(m.get(1, 2), 7);
        assert_eq!(m.row(1), &[0, 0, 7]);
        assert_eq!(m.column_sum(2), 7);
        assert!(!m.is_zero());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Matrix::from_rows(vec![vec![1, 2], vec![3]]);
        assert_eq!(result, Err(ConfigError::RaggedMatrix));
    }

    #[test]
    fn test_serializes_as_rows() {
        let m = Matrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[0,1],[1,0]]");

        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_display_labels_rows_and_columns() {
        let m = Matrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        let text = m.to_string();
        assert!(text.contains("R0"));
        assert!(text.contains("R1"));
        assert!(text.contains("P0"));
        assert!(text.contains("P1"));
    }
}
