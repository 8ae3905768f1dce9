use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use rand::Rng;

#[cfg(not(feature = "parallel"))]
use crate::common::vecops::gf256_mul_vec_by_scalar_then_add_into_vec;
#[cfg(feature = "parallel")]
use crate::common::vecops::{gf256_inplace_add_vectors, gf256_inplace_mul_vec_by_scalar};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Full RLNC encoder.
///
/// Owns one generation of originals as a flat zero-padded buffer and
/// produces coded pieces on demand, each a fresh random linear combination
/// of all originals. May be called unbounded times; every output carries its
/// coding vector so the decoder needs nothing else.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoder {
    data: Vec<u8>,
    piece_count: usize,
    piece_byte_len: usize,
    padding: usize,
}

impl Encoder {
    /// Number of pieces the original data got split into i.e. how many
    /// linearly independent coded pieces a decoder will need.
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    /// Bytes per piece, after padding.
    pub fn piece_byte_len(&self) -> usize {
        self.piece_byte_len
    }

    /// A full coded piece is `piece_count()` coding coefficients followed by
    /// the combined payload of `piece_byte_len()` bytes.
    pub fn coded_piece_byte_len(&self) -> usize {
        self.piece_count + self.piece_byte_len
    }

    /// Minimum #-of bytes of concatenated coded pieces a decoder must
    /// collect before reconstruction can possibly succeed.
    pub fn decodable_len(&self) -> usize {
        self.piece_count * self.coded_piece_byte_len()
    }

    /// Zero bytes appended to the tail of the original data so pieces come
    /// out equal length. The decoder cannot infer this; ship it out-of-band
    /// and truncate the concatenated decoded pieces by this much.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Creates an `Encoder` over pieces that were already split to equal
    /// length. No padding is added.
    pub fn from_pieces(pieces: Vec<Piece>) -> Result<Encoder, CodingError> {
        if pieces.len() < 2 {
            return Err(CodingError::BadPieceCount);
        }

        let piece_byte_len = pieces[0].len();
        if piece_byte_len == 0 {
            return Err(CodingError::ZeroPieceSize);
        }
        if pieces.iter().any(|piece| piece.len() != piece_byte_len) {
            return Err(CodingError::CodedDataLengthMismatch);
        }

        let piece_count = pieces.len();
        Ok(Encoder {
            data: pieces.concat(),
            piece_count,
            piece_byte_len,
            padding: 0,
        })
    }

    /// Creates an `Encoder` splitting `data` into exactly `piece_count`
    /// pieces of `ceil(data.len() / piece_count)` bytes, zero-padding the
    /// tail.
    pub fn with_piece_count(mut data: Vec<u8>, piece_count: usize) -> Result<Encoder, CodingError> {
        if piece_count < 2 {
            return Err(CodingError::BadPieceCount);
        }
        if piece_count > data.len() {
            return Err(CodingError::PieceCountMoreThanTotalBytes);
        }

        let piece_byte_len = data.len().div_ceil(piece_count);
        let padded_byte_len = piece_count * piece_byte_len;
        let padding = padded_byte_len - data.len();
        data.resize(padded_byte_len, 0);

        Ok(Encoder {
            data,
            piece_count,
            piece_byte_len,
            padding,
        })
    }

    /// Creates an `Encoder` splitting `data` into pieces of `piece_size`
    /// bytes each, zero-padding the tail.
    pub fn with_piece_size(mut data: Vec<u8>, piece_size: usize) -> Result<Encoder, CodingError> {
        if piece_size == 0 {
            return Err(CodingError::ZeroPieceSize);
        }
        if piece_size >= data.len() {
            return Err(CodingError::BadPieceCount);
        }

        let piece_count = data.len().div_ceil(piece_size);
        let padded_byte_len = piece_count * piece_size;
        let padding = padded_byte_len - data.len();
        data.resize(padded_byte_len, 0);

        Ok(Encoder {
            data,
            piece_count,
            piece_byte_len: piece_size,
            padding,
        })
    }

    /// Original piece at `piece_index`, borrowed out of the flat buffer.
    pub(crate) fn original_piece(&self, piece_index: usize) -> &[u8] {
        let begins_at = piece_index * self.piece_byte_len;
        &self.data[begins_at..begins_at + self.piece_byte_len]
    }

    /// Combines all originals under the provided coding vector, writing only
    /// the payload portion into `coded_data`. Allocation-free inner path,
    /// also used by callers that bring their own vector.
    #[cfg(not(feature = "parallel"))]
    pub(crate) fn code_with_vector(&self, coding_vector: &[u8], coded_data: &mut [u8]) -> Result<(), CodingError> {
        if coding_vector.len() != self.piece_count {
            return Err(CodingError::CodingVectorLengthMismatch);
        }
        if coded_data.len() != self.piece_byte_len {
            return Err(CodingError::CodedDataLengthMismatch);
        }

        coded_data.fill(0);

        self.data
            .chunks_exact(self.piece_byte_len)
            .zip(coding_vector)
            .for_each(|(piece, &coeff)| gf256_mul_vec_by_scalar_then_add_into_vec(coded_data, piece, coeff));

        Ok(())
    }

    /// Combines all originals under the provided coding vector, writing only
    /// the payload portion into `coded_data`. This variant spreads the
    /// per-piece scaling across the rayon pool and folds the partial sums
    /// with bytewise XOR.
    #[cfg(feature = "parallel")]
    pub(crate) fn code_with_vector(&self, coding_vector: &[u8], coded_data: &mut [u8]) -> Result<(), CodingError> {
        if coding_vector.len() != self.piece_count {
            return Err(CodingError::CodingVectorLengthMismatch);
        }
        if coded_data.len() != self.piece_byte_len {
            return Err(CodingError::CodedDataLengthMismatch);
        }

        let combined = self
            .data
            .par_chunks_exact(self.piece_byte_len)
            .zip(coding_vector)
            .map(|(piece, &coeff)| {
                let mut scaled = piece.to_vec();
                gf256_inplace_mul_vec_by_scalar(&mut scaled, coeff);
                scaled
            })
            .reduce(
                || vec![0u8; self.piece_byte_len],
                |mut acc, cur| {
                    gf256_inplace_add_vectors(&mut acc, &cur);
                    acc
                },
            );

        coded_data.copy_from_slice(&combined);
        Ok(())
    }

    /// Produces a new coded piece: a fresh uniformly random coding vector and
    /// the corresponding linear combination of all originals.
    pub fn coded_piece<R: Rng + ?Sized>(&self, rng: &mut R) -> CodedPiece {
        let mut vector = vec![0u8; self.piece_count];
        rng.fill_bytes(&mut vector);

        let mut piece = vec![0u8; self.piece_byte_len];
        unsafe { self.code_with_vector(&vector, &mut piece).unwrap_unchecked() };

        CodedPiece { vector, piece }
    }
}
