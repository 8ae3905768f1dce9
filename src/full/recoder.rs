use crate::CodingError;
use crate::coded_piece::{CodedPiece, coded_pieces_from_flattened};
use crate::common::vecops::gf256_mul_vec_by_scalar_then_add_into_vec;
use crate::matrix::Matrix;
use rand::Rng;

/// Recoder: produces new coded pieces out of already-coded ones, without
/// ever decoding.
///
/// It draws a fresh random combination `w` over its stored pieces and emits
/// the payload `Σ w[i] · piece[i]` tagged with the vector `w · C`, where `C`
/// stacks the stored coding vectors. By associativity the emitted vector is
/// exactly the combination of *originals* the new payload carries, so a
/// downstream decoder treats recoded pieces like any other coded piece.
#[derive(Clone, Debug)]
pub struct Recoder {
    pieces: Vec<CodedPiece>,
    coding_matrix: Matrix,
    pieces_coded_together: usize,
    piece_byte_len: usize,
}

impl Recoder {
    /// Number of coded pieces held and recoded together.
    pub fn pieces_recoded_together(&self) -> usize {
        self.pieces.len()
    }

    /// Number of originals the held pieces were coded from.
    pub fn pieces_coded_together(&self) -> usize {
        self.pieces_coded_together
    }

    pub fn piece_byte_len(&self) -> usize {
        self.piece_byte_len
    }

    pub fn coded_piece_byte_len(&self) -> usize {
        self.pieces_coded_together + self.piece_byte_len
    }

    /// Creates a `Recoder` over the given coded pieces, caching the stacked
    /// coding-vector matrix once.
    pub fn new(pieces: Vec<CodedPiece>) -> Result<Recoder, CodingError> {
        if pieces.is_empty() {
            return Err(CodingError::BadPieceCount);
        }

        let pieces_coded_together = pieces[0].pieces_coded_together();
        let piece_byte_len = pieces[0].piece_byte_len();
        if pieces_coded_together == 0 {
            return Err(CodingError::CodingVectorLengthMismatch);
        }
        if piece_byte_len == 0 {
            return Err(CodingError::ZeroPieceSize);
        }
        if pieces
            .iter()
            .any(|piece| piece.pieces_coded_together() != pieces_coded_together || piece.piece_byte_len() != piece_byte_len)
        {
            return Err(CodingError::MatrixDimensionMismatch);
        }

        let coding_matrix = Matrix::from_rows(pieces.iter().map(|piece| piece.vector.clone()).collect());

        Ok(Recoder {
            pieces,
            coding_matrix,
            pieces_coded_together,
            piece_byte_len,
        })
    }

    /// Creates a `Recoder` from `piece_count` concatenated flattened coded
    /// pieces, each carrying a `pieces_coded_together`-byte coding vector.
    pub fn from_flattened(buf: &[u8], piece_count: usize, pieces_coded_together: usize) -> Result<Recoder, CodingError> {
        Recoder::new(coded_pieces_from_flattened(buf, piece_count, pieces_coded_together)?)
    }

    /// Produces a new coded piece by recoding everything held, under a fresh
    /// random recoding vector.
    pub fn coded_piece<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<CodedPiece, CodingError> {
        let mut recoding_vector = vec![0u8; self.pieces.len()];
        rng.fill_bytes(&mut recoding_vector);

        // Resulting coefficients against the original generation: the
        // 1 x R recoding vector times the R x G coding matrix.
        let vector = Matrix::from_rows(vec![recoding_vector.clone()])
            .multiply(&self.coding_matrix)?
            .into_rows()
            .swap_remove(0);

        let mut piece = vec![0u8; self.piece_byte_len];
        self.pieces
            .iter()
            .zip(&recoding_vector)
            .for_each(|(coded_piece, &coeff)| gf256_mul_vec_by_scalar_then_add_into_vec(&mut piece, &coded_piece.piece, coeff));

        Ok(CodedPiece { vector, piece })
    }
}
