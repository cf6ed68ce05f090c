//! Row-appendable dense matrix.
//!
//! [`DenseMatrix`] stores values row-major in a flat `Vec<f64>` with a fixed
//! width. Loan attribute tables are loaded one value at a time from a
//! parameter source, so rows grow by appending; the width is fixed once the
//! number of covariates is known.

use crate::types::ModelError;

/// Dense row-major matrix with a fixed width and a growable row count.
///
/// # Examples
///
/// ```
/// use loss_core::math::DenseMatrix;
///
/// let mut m = DenseMatrix::with_width(3);
/// for v in 1..=6 {
///     m.push(v as f64);
/// }
///
/// assert_eq!(m.rows(), 2);
/// assert_eq!(m.get(1, 2).unwrap(), 6.0);
/// assert_eq!(m.column_mean(0).unwrap(), 2.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseMatrix {
    width: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Creates an empty matrix with width 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty matrix with the given width.
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            data: Vec::new(),
        }
    }

    /// Fixes the width. Existing data is reinterpreted, not reshaped.
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of complete rows; 0 when the width is 0.
    #[inline]
    pub fn rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when no values are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` when the stored values fill a whole number of rows.
    pub fn is_rectangular(&self) -> bool {
        self.width != 0 && self.data.len() % self.width == 0
    }

    /// Appends a single value in row-major order.
    #[inline]
    pub fn push(&mut self, value: f64) {
        self.data.push(value);
    }

    /// Appends a full row.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `row.len()` differs from the width.
    pub fn push_row(&mut self, row: &[f64]) -> Result<(), ModelError> {
        if row.len() != self.width {
            return Err(ModelError::DimensionMismatch {
                context: "matrix row",
                expected: self.width,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    #[inline]
    fn flat_index(&self, row: usize, column: usize) -> Result<usize, ModelError> {
        if column >= self.width {
            return Err(self.out_of_bounds(row, column));
        }
        row.checked_mul(self.width)
            .and_then(|start| start.checked_add(column))
            .ok_or_else(|| self.out_of_bounds(row, column))
    }

    fn out_of_bounds(&self, row: usize, column: usize) -> ModelError {
        ModelError::IndexOutOfBounds {
            row,
            column,
            rows: self.rows(),
            columns: self.width,
        }
    }

    /// Reads element `(row, column)`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when the element is not stored.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Result<f64, ModelError> {
        let index = self.flat_index(row, column)?;
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, column))
    }

    /// Writes element `(row, column)`.
    ///
    /// Writing exactly one position past the last stored value appends it.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` for any other position outside the stored data.
    pub fn set(&mut self, row: usize, column: usize, value: f64) -> Result<(), ModelError> {
        let index = self.flat_index(row, column)?;
        match index.cmp(&self.data.len()) {
            std::cmp::Ordering::Less => {
                self.data[index] = value;
                Ok(())
            }
            std::cmp::Ordering::Equal => {
                self.data.push(value);
                Ok(())
            }
            std::cmp::Ordering::Greater => Err(self.out_of_bounds(row, column)),
        }
    }

    /// Borrows a complete row.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when the row is not complete.
    pub fn row(&self, row: usize) -> Result<&[f64], ModelError> {
        if row >= self.rows() {
            return Err(self.out_of_bounds(row, 0));
        }
        let start = row * self.width;
        Ok(&self.data[start..start + self.width])
    }

    /// Arithmetic mean of a column over all complete rows.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when the column is outside the width or there are
    /// no rows.
    pub fn column_mean(&self, column: usize) -> Result<f64, ModelError> {
        let rows = self.rows();
        if column >= self.width || rows == 0 {
            return Err(self.out_of_bounds(0, column));
        }
        let sum: f64 = (0..rows).map(|r| self.data[r * self.width + column]).sum();
        Ok(sum / rows as f64)
    }

    /// Removes all values, keeping the width.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fifteen_by_three() -> DenseMatrix {
        let mut m = DenseMatrix::with_width(3);
        for v in 1..=15 {
            m.push(v as f64);
        }
        m
    }

    // ========================================
    // Shape
    // ========================================

    #[test]
    fn test_rows_from_flat_length() {
        let m = fifteen_by_three();
        assert_eq!(m.rows(), 5);
        assert_eq!(m.width(), 3);
        assert_eq!(m.len(), 15);
        assert!(m.is_rectangular());
    }

    #[test]
    fn test_zero_width_has_no_rows() {
        let mut m = DenseMatrix::new();
        m.push(1.0);
        assert_eq!(m.rows(), 0);
        assert!(!m.is_rectangular());
    }

    #[test]
    fn test_partial_row_is_not_rectangular() {
        let mut m = DenseMatrix::with_width(3);
        m.push(1.0);
        m.push(2.0);
        assert_eq!(m.rows(), 0);
        assert!(!m.is_rectangular());
    }

    // ========================================
    // Element access
    // ========================================

    #[test]
    fn test_get_and_column_mean() {
        let m = fifteen_by_three();
        assert_eq!(m.get(3, 2).unwrap(), 12.0);
        assert_relative_eq!(m.column_mean(0).unwrap(), 7.0);
        assert_relative_eq!(m.column_mean(1).unwrap(), 8.0);
        assert_relative_eq!(m.column_mean(2).unwrap(), 9.0);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let m = fifteen_by_three();
        assert_eq!(
            m.get(5, 0),
            Err(ModelError::IndexOutOfBounds {
                row: 5,
                column: 0,
                rows: 5,
                columns: 3
            })
        );
        assert!(m.get(0, 3).is_err());
    }

    #[test]
    fn test_set_overwrites_and_appends() {
        let mut m = DenseMatrix::with_width(2);
        m.set(0, 0, 1.0).unwrap();
        m.set(0, 1, 2.0).unwrap();
        m.set(0, 0, 5.0).unwrap();
        assert_eq!(m.row(0).unwrap(), &[5.0, 2.0]);

        // skipping a position is an error
        assert!(m.set(1, 1, 3.0).is_err());
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut m = DenseMatrix::with_width(2);
        m.push_row(&[1.0, 2.0]).unwrap();
        assert!(matches!(
            m.push_row(&[1.0]),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert_eq!(m.rows(), 1);
    }

    #[test]
    fn test_clear_keeps_width() {
        let mut m = DenseMatrix::with_width(2);
        for v in 0..8 {
            m.push(f64::from(v));
        }
        assert_eq!(m.rows(), 4);
        assert_eq!(m.get(3, 1).unwrap(), 7.0);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.width(), 2);
    }

    #[test]
    fn test_huge_row_index_is_out_of_bounds() {
        let mut m = DenseMatrix::with_width(3);
        for v in 0..6 {
            m.push(f64::from(v));
        }
        assert!(matches!(
            m.get(usize::MAX, 1),
            Err(ModelError::IndexOutOfBounds {
                row: usize::MAX,
                column: 1,
                rows: 2,
                columns: 3,
            })
        ));
        assert!(matches!(
            m.set(usize::MAX / 2, 2, 1.0),
            Err(ModelError::IndexOutOfBounds { .. })
        ));
        assert_eq!(m.len(), 6);
    }

    #[test]
    fn test_column_mean_empty_is_error() {
        let m = DenseMatrix::with_width(3);
        assert!(m.column_mean(0).is_err());
    }
}
