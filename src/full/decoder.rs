use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use crate::matrix::DecoderState;

/// Full RLNC decoder.
///
/// Admits coded pieces one at a time, keeping the augmented
/// (coefficients | payload) system in reduced row echelon form, and recovers
/// the original pieces once enough linearly independent combinations
/// arrived. Order of arrival does not matter.
#[derive(Clone, Debug)]
pub struct Decoder {
    piece_byte_len: usize,
    required_piece_count: usize,
    received_piece_count: usize,
    useful_piece_count: usize,
    state: DecoderState,
}

impl Decoder {
    /// Creates a `Decoder` expecting `piece_count` originals of
    /// `piece_byte_len` bytes each.
    pub fn new(piece_byte_len: usize, piece_count: usize) -> Result<Decoder, CodingError> {
        if piece_byte_len == 0 {
            return Err(CodingError::ZeroPieceSize);
        }
        if piece_count < 2 {
            return Err(CodingError::BadPieceCount);
        }

        Ok(Decoder {
            piece_byte_len,
            required_piece_count: piece_count,
            received_piece_count: 0,
            useful_piece_count: 0,
            state: DecoderState::with_piece_count(piece_count),
        })
    }

    /// Number of originals coded together in this generation.
    pub fn piece_count(&self) -> usize {
        self.required_piece_count
    }

    pub fn piece_byte_len(&self) -> usize {
        self.piece_byte_len
    }

    pub fn coded_piece_byte_len(&self) -> usize {
        self.required_piece_count + self.piece_byte_len
    }

    /// Pieces admitted so far, the linearly dependent ones included.
    pub fn received_piece_count(&self) -> usize {
        self.received_piece_count
    }

    /// Linearly independent pieces held so far i.e. current rank.
    pub fn useful_piece_count(&self) -> usize {
        self.useful_piece_count
    }

    /// How many more useful pieces decoding still needs.
    pub fn remaining_piece_count(&self) -> usize {
        self.required_piece_count - self.useful_piece_count
    }

    pub fn is_decoded(&self) -> bool {
        self.useful_piece_count >= self.required_piece_count
    }

    /// Admits one coded piece, re-reducing the augmented system.
    ///
    /// A linearly dependent piece is not an error: it is dropped during
    /// reduction, `received_piece_count` still increments and `Ok(())` is
    /// returned. `AllUsefulPiecesReceived` signals the feeder to stop.
    pub fn add_piece(&mut self, coded_piece: CodedPiece) -> Result<(), CodingError> {
        if self.is_decoded() {
            return Err(CodingError::AllUsefulPiecesReceived);
        }
        if coded_piece.pieces_coded_together() != self.required_piece_count {
            return Err(CodingError::CodingVectorLengthMismatch);
        }
        if coded_piece.piece_byte_len() != self.piece_byte_len {
            return Err(CodingError::CodedPieceSizeMismatch);
        }

        self.state.add_piece(coded_piece);
        self.received_piece_count += 1;
        self.state.rref();
        self.useful_piece_count = self.state.rank();

        Ok(())
    }

    /// Requests a decoded piece by index. Full decoding need not have
    /// happened, see [`DecoderState::get_piece`].
    pub fn get_piece(&self, piece_index: usize) -> Result<Piece, CodingError> {
        self.state.get_piece(piece_index)
    }

    /// All original pieces in order, once decoding completed.
    pub fn get_pieces(&self) -> Result<Vec<Piece>, CodingError> {
        if !self.is_decoded() {
            return Err(CodingError::MoreUsefulPiecesRequired);
        }

        (0..self.required_piece_count).map(|piece_index| self.get_piece(piece_index)).collect()
    }

    /// Concatenation of all decoded pieces. Any encoder-side padding is
    /// still attached; the caller truncates using the out-of-band padding
    /// count.
    pub fn decoded_data(&self) -> Result<Vec<u8>, CodingError> {
        Ok(self.get_pieces()?.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::{CodingError, Decoder};
    use crate::coded_piece::CodedPiece;
    use crate::full::Encoder;
    use rand::Rng;

    #[test]
    fn test_decoder_new_invalid_inputs() {
        assert!(matches!(Decoder::new(0, 10), Err(CodingError::ZeroPieceSize)));
        assert!(matches!(Decoder::new(10, 0), Err(CodingError::BadPieceCount)));
        assert!(matches!(Decoder::new(10, 1), Err(CodingError::BadPieceCount)));
        assert!(Decoder::new(10, 5).is_ok());
    }

    #[test]
    fn test_decoder_rejects_wrong_sized_pieces() {
        let mut rng = rand::rng();

        let data: Vec<u8> = (0..1024).map(|_| rng.random()).collect();
        let encoder = Encoder::with_piece_count(data, 32).expect("encoder must construct");
        let mut decoder = Decoder::new(encoder.piece_byte_len(), encoder.piece_count()).expect("decoder must construct");

        let coded_piece = encoder.coded_piece(&mut rng);

        let short_vector = CodedPiece::new(coded_piece.vector[1..].to_vec(), coded_piece.piece.clone());
        assert_eq!(decoder.add_piece(short_vector), Err(CodingError::CodingVectorLengthMismatch));

        let short_payload = CodedPiece::new(coded_piece.vector.clone(), coded_piece.piece[1..].to_vec());
        assert_eq!(decoder.add_piece(short_payload), Err(CodingError::CodedPieceSizeMismatch));

        // State must be untouched after rejected admissions.
        assert_eq!(decoder.received_piece_count(), 0);
        assert_eq!(decoder.useful_piece_count(), 0);

        assert!(decoder.add_piece(coded_piece).is_ok());
        assert_eq!(decoder.received_piece_count(), 1);
        assert_eq!(decoder.useful_piece_count(), 1);
    }

    #[test]
    fn test_dependent_piece_is_not_an_error() {
        let mut rng = rand::rng();

        let data: Vec<u8> = (0..512).map(|_| rng.random()).collect();
        let encoder = Encoder::with_piece_count(data, 8).expect("encoder must construct");
        let mut decoder = Decoder::new(encoder.piece_byte_len(), encoder.piece_count()).expect("decoder must construct");

        let coded_piece = encoder.coded_piece(&mut rng);
        decoder.add_piece(coded_piece.clone()).expect("first admission must succeed");
        decoder.add_piece(coded_piece).expect("a dependent piece is silently dropped");

        assert_eq!(decoder.received_piece_count(), 2);
        assert_eq!(decoder.useful_piece_count(), 1);
        assert_eq!(decoder.remaining_piece_count(), 7);
    }

    #[test]
    fn test_excess_admission_after_decoding() {
        let mut rng = rand::rng();

        let data: Vec<u8> = (0..512).map(|_| rng.random()).collect();
        let encoder = Encoder::with_piece_count(data, 8).expect("encoder must construct");
        let mut decoder = Decoder::new(encoder.piece_byte_len(), encoder.piece_count()).expect("decoder must construct");

        while !decoder.is_decoded() {
            decoder.add_piece(encoder.coded_piece(&mut rng)).expect("admission must succeed");
        }

        let pieces_before = decoder.get_pieces().expect("decoded");
        assert_eq!(decoder.add_piece(encoder.coded_piece(&mut rng)), Err(CodingError::AllUsefulPiecesReceived));
        assert_eq!(decoder.get_pieces().expect("still decoded"), pieces_before);
        assert_eq!(decoder.useful_piece_count(), 8);
    }
}
