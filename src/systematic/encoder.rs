use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use crate::full;
use rand::Rng;

/// Systematic RLNC encoder.
///
/// The first `piece_count` outputs are the originals themselves, tagged with
/// the standard unit vectors in order, so a receiver that loses nothing pays
/// no decoding cost at all. Every output after that is a full-RLNC random
/// combination.
#[derive(Clone, Debug)]
pub struct Encoder {
    encoder: full::Encoder,
    next_piece_index: usize,
}

impl Encoder {
    pub fn from_pieces(pieces: Vec<Piece>) -> Result<Encoder, CodingError> {
        Ok(Encoder {
            encoder: full::Encoder::from_pieces(pieces)?,
            next_piece_index: 0,
        })
    }

    pub fn with_piece_count(data: Vec<u8>, piece_count: usize) -> Result<Encoder, CodingError> {
        Ok(Encoder {
            encoder: full::Encoder::with_piece_count(data, piece_count)?,
            next_piece_index: 0,
        })
    }

    pub fn with_piece_size(data: Vec<u8>, piece_size: usize) -> Result<Encoder, CodingError> {
        Ok(Encoder {
            encoder: full::Encoder::with_piece_size(data, piece_size)?,
            next_piece_index: 0,
        })
    }

    pub fn piece_count(&self) -> usize {
        self.encoder.piece_count()
    }

    pub fn piece_byte_len(&self) -> usize {
        self.encoder.piece_byte_len()
    }

    pub fn coded_piece_byte_len(&self) -> usize {
        self.encoder.coded_piece_byte_len()
    }

    pub fn decodable_len(&self) -> usize {
        self.encoder.decodable_len()
    }

    pub fn padding(&self) -> usize {
        self.encoder.padding()
    }

    /// Originals not yet emitted as part of the systematic prefix.
    pub fn remaining_systematic_piece_count(&self) -> usize {
        self.piece_count() - self.next_piece_index
    }

    /// Produces the next coded piece: while the systematic prefix lasts, the
    /// original at the running index with a unit coding vector (the payload
    /// is a copy, the encoder keeps its originals); afterwards a random
    /// combination like the full encoder.
    pub fn coded_piece<R: Rng + ?Sized>(&mut self, rng: &mut R) -> CodedPiece {
        if self.next_piece_index < self.piece_count() {
            let piece_index = self.next_piece_index;
            self.next_piece_index += 1;

            let mut vector = vec![0u8; self.piece_count()];
            vector[piece_index] = 1;

            return CodedPiece {
                vector,
                piece: self.encoder.original_piece(piece_index).to_vec(),
            };
        }

        self.encoder.coded_piece(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::Encoder;
    use rand::Rng;

    #[test]
    fn test_systematic_prefix_carries_originals() {
        let mut rng = rand::rng();

        let piece_count = 4usize;
        let originals: Vec<Vec<u8>> = (0..piece_count).map(|_| (0..8).map(|_| rng.random()).collect()).collect();

        let mut encoder = Encoder::from_pieces(originals.clone()).expect("encoder must construct");
        assert_eq!(encoder.remaining_systematic_piece_count(), piece_count);

        for (piece_index, original) in originals.iter().enumerate() {
            let coded_piece = encoder.coded_piece(&mut rng);

            let mut expected_vector = vec![0u8; piece_count];
            expected_vector[piece_index] = 1;

            assert!(coded_piece.is_systematic());
            assert_eq!(coded_piece.vector, expected_vector);
            assert_eq!(&coded_piece.piece, original);
        }

        assert_eq!(encoder.remaining_systematic_piece_count(), 0);

        // Once the prefix is exhausted, outputs are random combinations. A
        // random vector collides with a unit vector with probability ~2^-30
        // here, so this assertion is sound.
        let coded_piece = encoder.coded_piece(&mut rng);
        assert_eq!(coded_piece.pieces_coded_together(), piece_count);
        assert!(!coded_piece.is_systematic());
    }
}
