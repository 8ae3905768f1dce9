use crate::CodingError;
use crate::common::gf256::Gf256;
use crate::common::vecops::{gf256_inplace_mul_vec_by_scalar, gf256_mul_vec_by_scalar_then_add_into_vec};
use std::ops::Index;

/// Growable row-major matrix of GF(2^8) elements, one byte per element.
///
/// Rows are owned by the matrix. The decoder engine keeps two of these in
/// lockstep (coefficients and coded payloads); every structural mutation it
/// performs — swap, scaled addition, removal — goes through the paired
/// methods below so rows of the two matrices never drift apart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Matrix {
    rows: Vec<Vec<u8>>,
}

impl Matrix {
    pub fn new() -> Self {
        Matrix { rows: Vec::new() }
    }

    pub fn with_row_capacity(capacity: usize) -> Self {
        Matrix {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        debug_assert!(rows.windows(2).all(|pair| pair[0].len() == pair[1].len()), "rows must be equal length");
        Matrix { rows }
    }

    /// #-of rows. Shrinks at runtime when linearly dependent rows are removed
    /// during row reduction.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// #-of columns, 0 for an empty matrix.
    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn row(&self, idx: usize) -> &[u8] {
        &self.rows[idx]
    }

    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows
    }

    /// Multiplies two matrices in order `self x with`, allocating the result.
    pub fn multiply(&self, with: &Matrix) -> Result<Matrix, CodingError> {
        if self.cols() != with.rows() {
            return Err(CodingError::MatrixDimensionMismatch);
        }

        let mut product = vec![vec![0u8; with.cols()]; self.rows()];

        for (lhs_row, product_row) in self.rows.iter().zip(product.iter_mut()) {
            for (j, cell) in product_row.iter_mut().enumerate() {
                let mut acc = Gf256::zero();
                for (k, &lhs_symbol) in lhs_row.iter().enumerate() {
                    acc += Gf256::new(lhs_symbol) * Gf256::new(with.rows[k][j]);
                }
                *cell = acc.get();
            }
        }

        Ok(Matrix { rows: product })
    }

    pub(crate) fn push_row(&mut self, row: Vec<u8>) {
        debug_assert!(self.rows.is_empty() || row.len() == self.cols());
        self.rows.push(row);
    }

    pub(crate) fn pop_row(&mut self) -> Option<Vec<u8>> {
        self.rows.pop()
    }

    pub(crate) fn remove_row(&mut self, idx: usize) {
        self.rows.remove(idx);
    }

    pub(crate) fn swap_rows(&mut self, row1: usize, row2: usize) {
        self.rows.swap(row1, row2);
    }

    /// Elementary row operation `rows[dst][k] ^= weight * rows[src][k]` for
    /// `k >= from_col`, over GF(2^8).
    pub(crate) fn mul_row_then_add_into(&mut self, src: usize, dst: usize, from_col: usize, weight: u8) {
        debug_assert_ne!(src, dst);

        let (src_row, dst_row) = if src < dst {
            let (head, tail) = self.rows.split_at_mut(dst);
            (&head[src], &mut tail[0])
        } else {
            let (head, tail) = self.rows.split_at_mut(src);
            (&tail[0], &mut head[dst])
        };

        gf256_mul_vec_by_scalar_then_add_into_vec(&mut dst_row[from_col..], &src_row[from_col..], weight);
    }

    /// Scales `rows[idx][k]` by `scalar` for `k >= from_col`, over GF(2^8).
    pub(crate) fn scale_row_from(&mut self, idx: usize, from_col: usize, scalar: u8) {
        gf256_inplace_mul_vec_by_scalar(&mut self.rows[idx][from_col..], scalar);
    }
}

impl Index<usize> for Matrix {
    type Output = [u8];

    fn index(&self, idx: usize) -> &Self::Output {
        &self.rows[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::Matrix;
    use crate::CodingError;

    #[test]
    fn test_multiplication() {
        let lhs = Matrix::from_rows(vec![vec![102, 82, 165, 0]]);
        let rhs = Matrix::from_rows(vec![vec![157, 233, 247], vec![160, 28, 233], vec![149, 234, 117], vec![200, 181, 55]]);
        let expected = Matrix::from_rows(vec![vec![186, 23, 11]]);

        let product = lhs.multiply(&rhs).expect("dimensions match");
        assert_eq!(product, expected);
    }

    #[test]
    fn test_multiplication_by_identity() {
        let identity = Matrix::from_rows(vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]);
        let m = Matrix::from_rows(vec![vec![11, 22, 33], vec![44, 55, 66]]);

        assert_eq!(m.multiply(&identity).expect("dimensions match"), m);
    }

    #[test]
    fn test_multiplication_dimension_mismatch() {
        let lhs = Matrix::from_rows(vec![vec![1, 2, 3]]);
        let rhs = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]);

        assert_eq!(lhs.multiply(&rhs), Err(CodingError::MatrixDimensionMismatch));
    }

    #[test]
    fn test_compare() {
        let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let b = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let c = Matrix::from_rows(vec![vec![1, 2], vec![3, 5]]);
        let d = Matrix::from_rows(vec![vec![1, 2]]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
