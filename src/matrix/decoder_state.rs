use super::matrix::Matrix;
use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use crate::common::gf256::Gf256;

/// Incremental augmented row-reduction engine.
///
/// Holds the coefficient matrix and the coded payload matrix of everything
/// admitted so far, paired row by row: every swap, scaled addition and
/// removal is applied to both matrices at the same index, so after each
/// reduction `coded[i]` still equals the combination of originals that
/// `coeffs[i]` describes. The coefficient matrix is kept in reduced row
/// echelon form with zero rows removed, which makes its row count the rank.
#[derive(Clone, Debug)]
pub struct DecoderState {
    piece_count: usize,
    coeffs: Matrix,
    coded: Matrix,
}

impl DecoderState {
    pub fn with_piece_count(piece_count: usize) -> Self {
        DecoderState {
            piece_count,
            coeffs: Matrix::with_row_capacity(piece_count),
            coded: Matrix::with_row_capacity(piece_count),
        }
    }

    /// Builds a state from already-populated matrices, pairing rows by index.
    /// Useful when the augmented rows were collected elsewhere.
    pub fn new(coeffs: Matrix, coded: Matrix) -> Self {
        debug_assert_eq!(coeffs.rows(), coded.rows());
        DecoderState {
            piece_count: coeffs.cols(),
            coeffs,
            coded,
        }
    }

    /// Number of originals coded together in this generation.
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    /// Current state of the coding coefficient matrix.
    pub fn coefficient_matrix(&self) -> &Matrix {
        &self.coeffs
    }

    /// Current state of the coded piece matrix, updated alongside the
    /// coefficient matrix during every reduction.
    pub fn coded_matrix(&self) -> &Matrix {
        &self.coded
    }

    /// Appends one coded piece as a paired row of both matrices. Callers run
    /// `rref` (or `systematic_rref`) afterwards; a linearly dependent row is
    /// removed there.
    pub fn add_piece(&mut self, coded_piece: CodedPiece) {
        let CodedPiece { vector, piece } = coded_piece;
        self.coeffs.push_row(vector);
        self.coded.push_row(piece);
    }

    /// Rank of the coefficient matrix. Expected to be invoked after `rref`;
    /// zero-row removal makes this simply the surviving row count.
    pub fn rank(&self) -> usize {
        self.coeffs.rows()
    }

    /// Brings the coefficient matrix into reduced row echelon form, mirroring
    /// every elementary row operation onto the coded matrix, then removes the
    /// rows found to be linearly dependent. In place, no allocation.
    pub fn rref(&mut self) {
        self.clean_forward();
        self.clean_backward();
        self.remove_zero_rows();
    }

    /// Row reduction that exploits systematic rows first: any row whose
    /// coefficient vector is a standard unit vector is moved onto its pivot
    /// index and its pivot column is cleared from every other row with a
    /// single fused row operation each. The general pass then only has the
    /// random tail left to grind through. Same contract as `rref`.
    pub fn systematic_rref(&mut self) {
        let systematic_rows = self.reorder_systematic_rows();

        for &pivot in &systematic_rows {
            for j in 0..self.coeffs.rows() {
                if j == pivot {
                    continue;
                }

                let weight = self.coeffs[j][pivot];
                if weight == 0 {
                    continue;
                }

                // The source row is a unit vector, so only column `pivot` of
                // the destination's coefficients changes.
                self.coeffs.mul_row_then_add_into(pivot, j, pivot, weight);
                self.coded.mul_row_then_add_into(pivot, j, 0, weight);
            }
        }

        self.rref();
    }

    /// Swaps systematic rows onto the row index matching their pivot column,
    /// in both matrices. Returns the pivot indices that ended up homed.
    fn reorder_systematic_rows(&mut self) -> Vec<usize> {
        let rows = self.coeffs.rows();

        let mut i = 0;
        while i < rows {
            match unit_pivot(&self.coeffs[i]) {
                Some(pivot) if pivot != i && pivot < rows && unit_pivot(&self.coeffs[pivot]) != Some(pivot) => {
                    self.coeffs.swap_rows(i, pivot);
                    self.coded.swap_rows(i, pivot);
                    // row `i` holds a new candidate now, re-examine it
                }
                _ => i += 1,
            }
        }

        (0..rows).filter(|&idx| unit_pivot(&self.coeffs[idx]) == Some(idx)).collect()
    }

    fn clean_forward(&mut self) {
        let rows = self.coeffs.rows();
        let cols = self.coeffs.cols();
        let boundary = rows.min(cols);

        for i in 0..boundary {
            if self.coeffs[i][i] == 0 {
                let Some(pivot) = ((i + 1)..rows).find(|&candidate| self.coeffs[candidate][i] != 0) else {
                    continue;
                };

                self.coeffs.swap_rows(i, pivot);
                self.coded.swap_rows(i, pivot);
            }

            for j in (i + 1)..rows {
                if self.coeffs[j][i] == 0 {
                    continue;
                }

                let quotient = (Gf256::new(self.coeffs[j][i]) / Gf256::new(self.coeffs[i][i])).unwrap();
                self.coeffs.mul_row_then_add_into(i, j, i, quotient.get());
                self.coded.mul_row_then_add_into(i, j, 0, quotient.get());
            }
        }
    }

    fn clean_backward(&mut self) {
        let rows = self.coeffs.rows();
        let cols = self.coeffs.cols();
        let boundary = rows.min(cols);

        for i in (0..boundary).rev() {
            if self.coeffs[i][i] == 0 {
                continue;
            }

            for j in 0..i {
                if self.coeffs[j][i] == 0 {
                    continue;
                }

                let quotient = (Gf256::new(self.coeffs[j][i]) / Gf256::new(self.coeffs[i][i])).unwrap();
                self.coeffs.mul_row_then_add_into(i, j, i, quotient.get());
                self.coded.mul_row_then_add_into(i, j, 0, quotient.get());
            }

            if self.coeffs[i][i] == 1 {
                continue;
            }

            let inv = Gf256::new(self.coeffs[i][i]).inv().unwrap().get();
            self.coeffs.scale_row_from(i, i, inv);
            self.coded.scale_row_from(i, 0, inv);
        }
    }

    /// Removes every row whose coefficient portion reduced to all zeros — a
    /// linearly dependent piece — from both matrices at the same index.
    fn remove_zero_rows(&mut self) {
        let mut i = 0;
        while i < self.coeffs.rows() {
            if self.coeffs[i].iter().any(|&coeff| coeff != 0) {
                i += 1;
                continue;
            }

            self.coeffs.remove_row(i);
            self.coded.remove_row(i);
        }
    }

    /// Requests a decoded piece by index.
    ///
    /// Full decoding need not have happened: once the algebra has revealed
    /// the requested original — its row reduced to a unit vector — the piece
    /// is returned. The payload is copied out, further admissions may still
    /// mutate the row it came from.
    pub fn get_piece(&self, piece_index: usize) -> Result<Piece, CodingError> {
        if piece_index >= self.piece_count {
            return Err(CodingError::PieceOutOfBound);
        }
        if piece_index >= self.coeffs.rows() {
            return Err(CodingError::PieceNotDecodedYet);
        }

        if self.rank() >= self.piece_count {
            return Ok(self.coded[piece_index].to_vec());
        }

        if unit_pivot(&self.coeffs[piece_index]) == Some(piece_index) {
            Ok(self.coded[piece_index].to_vec())
        } else {
            Err(CodingError::PieceNotDecodedYet)
        }
    }
}

/// `Some(k)` iff `row` is the standard unit vector with its 1 at column `k`.
fn unit_pivot(row: &[u8]) -> Option<usize> {
    let mut pivot = None;
    for (idx, &coeff) in row.iter().enumerate() {
        match coeff {
            0 => {}
            1 if pivot.is_none() => pivot = Some(idx),
            _ => return None,
        }
    }
    pivot
}
