use crate::CodingError;
use crate::coded_piece::{CodedPiece, Piece};
use crate::matrix::DecoderState;

/// Systematic RLNC decoder.
///
/// Same contract as the full decoder, but row reduction goes through the
/// systematic-aware path: unit-vector rows are homed onto their pivot index
/// and cleared with single fused row operations before the general pass
/// touches whatever random tail is left. When most received pieces are the
/// systematic prefix, decoding degenerates to a handful of XORs.
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

    /// Admits one coded piece. Same error policy as the full decoder:
    /// linear dependence is silently dropped, `AllUsefulPiecesReceived`
    /// signals the feeder to stop.
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
        self.state.systematic_rref();
        self.useful_piece_count = self.state.rank();

        Ok(())
    }

    /// Requests a decoded piece by index. Systematic pieces are readable as
    /// soon as they settle onto their pivot row, well before full decoding.
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

    /// Concatenation of all decoded pieces, encoder-side padding attached.
    pub fn decoded_data(&self) -> Result<Vec<u8>, CodingError> {
        Ok(self.get_pieces()?.concat())
    }
}
