//! Piece and coded piece model, plus the chunk-to-pieces split.
//!
//! A generation codes `G` equal-length original pieces together. A coded
//! piece carries its `G`-byte coding vector followed by the combined payload;
//! the flattened wire form is exactly `vector || piece`, `G + S` bytes, with
//! no framing around it.

use crate::CodingError;

/// A piece of data is nothing but a byte vector.
pub type Piece = Vec<u8>;

/// Coding coefficients describing how original pieces were combined, one
/// GF(2^8) element per original.
pub type CodingVector = Vec<u8>;

/// A coded piece: the coding vector together with the linearly combined
/// payload it describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodedPiece {
    pub vector: CodingVector,
    pub piece: Piece,
}

impl CodedPiece {
    pub fn new(vector: CodingVector, piece: Piece) -> Self {
        CodedPiece { vector, piece }
    }

    /// Number of original pieces coded together i.e. length of the coding vector.
    pub fn pieces_coded_together(&self) -> usize {
        self.vector.len()
    }

    /// Byte length of the combined payload.
    pub fn piece_byte_len(&self) -> usize {
        self.piece.len()
    }

    /// Byte length of the flattened wire form.
    pub fn len(&self) -> usize {
        self.vector.len() + self.piece.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into the wire form `vector || piece`.
    pub fn flatten(&self) -> Vec<u8> {
        let mut flattened = Vec::with_capacity(self.len());
        flattened.extend_from_slice(&self.vector);
        flattened.extend_from_slice(&self.piece);
        flattened
    }

    /// Parses one flattened coded piece of `piece_count + piece_byte_len` bytes.
    pub fn parse(buf: &[u8], piece_count: usize, piece_byte_len: usize) -> Result<Self, CodingError> {
        if buf.len() != piece_count + piece_byte_len {
            return Err(CodingError::CodedDataLengthMismatch);
        }

        let (vector, piece) = buf.split_at(piece_count);
        Ok(CodedPiece {
            vector: vector.to_vec(),
            piece: piece.to_vec(),
        })
    }

    /// A coded piece is systematic iff its vector is a standard unit vector:
    /// exactly one coefficient is 1 and every other is 0. The position of the
    /// 1 is the index of the original piece carried verbatim.
    pub fn is_systematic(&self) -> bool {
        let mut ones = 0usize;
        for &coeff in &self.vector {
            match coeff {
                0 => {}
                1 => ones += 1,
                _ => return false,
            }
        }
        ones == 1
    }
}

/// Splits a concatenation of `piece_count` equal-length flattened coded
/// pieces back into structured ones, for feeding a recoder.
///
/// Per-piece length is derived as `buf.len() / piece_count`; the coding
/// vector of `pieces_coded_together` bytes must fit strictly inside it.
pub fn coded_pieces_from_flattened(buf: &[u8], piece_count: usize, pieces_coded_together: usize) -> Result<Vec<CodedPiece>, CodingError> {
    if piece_count == 0 {
        return Err(CodingError::BadPieceCount);
    }
    if buf.is_empty() || buf.len() % piece_count != 0 {
        return Err(CodingError::CodedDataLengthMismatch);
    }

    let coded_piece_byte_len = buf.len() / piece_count;
    if pieces_coded_together >= coded_piece_byte_len {
        return Err(CodingError::CodingVectorLengthMismatch);
    }

    let piece_byte_len = coded_piece_byte_len - pieces_coded_together;
    let pieces: Vec<CodedPiece> = buf
        .chunks_exact(coded_piece_byte_len)
        .map(|flattened| CodedPiece::parse(flattened, pieces_coded_together, piece_byte_len))
        .collect::<Result<_, _>>()?;

    if pieces.len() != piece_count {
        return Err(CodingError::CopyFailedDuringPieceConstruction);
    }
    Ok(pieces)
}

/// Splits `data` into pieces of `piece_size` bytes each, zero-padding the
/// tail. Returns the pieces and the number of padding bytes appended, which
/// must travel to the receiver out-of-band so it can truncate after decoding.
pub fn split_by_piece_size(data: &[u8], piece_size: usize) -> Result<(Vec<Piece>, usize), CodingError> {
    if piece_size == 0 {
        return Err(CodingError::ZeroPieceSize);
    }
    // A single piece is not a generation, nothing would be coded together.
    if piece_size >= data.len() {
        return Err(CodingError::BadPieceCount);
    }

    let piece_count = data.len().div_ceil(piece_size);
    Ok(split_padded(data, piece_count, piece_size))
}

/// Splits `data` into exactly `piece_count` equal-length pieces, zero-padding
/// the tail. Piece size is `ceil(data.len() / piece_count)`.
pub fn split_by_piece_count(data: &[u8], piece_count: usize) -> Result<(Vec<Piece>, usize), CodingError> {
    if piece_count < 2 {
        return Err(CodingError::BadPieceCount);
    }
    if piece_count > data.len() {
        return Err(CodingError::PieceCountMoreThanTotalBytes);
    }

    let piece_size = data.len().div_ceil(piece_count);
    Ok(split_padded(data, piece_count, piece_size))
}

fn split_padded(data: &[u8], piece_count: usize, piece_size: usize) -> (Vec<Piece>, usize) {
    let padded_byte_len = piece_count * piece_size;
    let padding = padded_byte_len - data.len();

    let mut padded = data.to_vec();
    padded.resize(padded_byte_len, 0);

    let pieces: Vec<Piece> = padded.chunks_exact(piece_size).map(<[u8]>::to_vec).collect();
    (pieces, padding)
}

#[cfg(test)]
mod tests {
    use super::{CodedPiece, coded_pieces_from_flattened, split_by_piece_count, split_by_piece_size};
    use crate::CodingError;
    use rand::Rng;

    #[test]
    fn test_flatten_parse_round_trip() {
        let mut rng = rand::rng();

        let piece_count = 16usize;
        let piece_byte_len = 37usize;

        let mut vector = vec![0u8; piece_count];
        let mut piece = vec![0u8; piece_byte_len];
        rng.fill(&mut vector[..]);
        rng.fill(&mut piece[..]);

        let coded_piece = CodedPiece::new(vector, piece);
        let flattened = coded_piece.flatten();
        assert_eq!(flattened.len(), coded_piece.len());

        let parsed = CodedPiece::parse(&flattened, piece_count, piece_byte_len).expect("round trip must parse");
        assert_eq!(parsed, coded_piece);
    }

    #[test]
    fn test_parse_rejects_bad_lengths() {
        let buf = vec![0u8; 20];

        assert_eq!(CodedPiece::parse(&buf, 16, 5), Err(CodingError::CodedDataLengthMismatch));
        assert_eq!(CodedPiece::parse(&buf, 16, 3), Err(CodingError::CodedDataLengthMismatch));
        assert!(CodedPiece::parse(&buf, 16, 4).is_ok());
    }

    #[test]
    fn test_is_systematic() {
        let make = |vector: Vec<u8>| CodedPiece::new(vector, vec![0u8; 4]);

        assert!(make(vec![1, 0, 0, 0]).is_systematic());
        assert!(make(vec![0, 0, 0, 1]).is_systematic());
        assert!(!make(vec![0, 0, 0, 0]).is_systematic());
        assert!(!make(vec![1, 1, 0, 0]).is_systematic());
        assert!(!make(vec![0, 2, 0, 0]).is_systematic());
        assert!(!make(vec![1, 0, 3, 0]).is_systematic());
    }

    #[test]
    fn test_batch_parse_for_recoding() {
        let mut rng = rand::rng();

        let piece_count = 8usize;
        let pieces_coded_together = 16usize;
        let piece_byte_len = 32usize;
        let coded_piece_byte_len = pieces_coded_together + piece_byte_len;

        let mut buf = vec![0u8; piece_count * coded_piece_byte_len];
        rng.fill(&mut buf[..]);

        let pieces = coded_pieces_from_flattened(&buf, piece_count, pieces_coded_together).expect("valid batch must parse");
        assert_eq!(pieces.len(), piece_count);
        for (idx, coded_piece) in pieces.iter().enumerate() {
            assert_eq!(coded_piece.flatten(), buf[idx * coded_piece_byte_len..(idx + 1) * coded_piece_byte_len]);
        }

        // Total length not divisible by piece count.
        assert_eq!(
            coded_pieces_from_flattened(&buf[1..], piece_count, pieces_coded_together),
            Err(CodingError::CodedDataLengthMismatch)
        );
        // Coding vector must fit strictly inside the per-piece length.
        assert_eq!(
            coded_pieces_from_flattened(&buf, piece_count, coded_piece_byte_len),
            Err(CodingError::CodingVectorLengthMismatch)
        );
        assert_eq!(coded_pieces_from_flattened(&buf, 0, pieces_coded_together), Err(CodingError::BadPieceCount));
        assert_eq!(
            coded_pieces_from_flattened(&[], piece_count, pieces_coded_together),
            Err(CodingError::CodedDataLengthMismatch)
        );
    }

    #[test]
    fn test_split_by_piece_count() {
        let mut rng = rand::rng();

        let mut data = vec![0u8; 1500];
        rng.fill(&mut data[..]);

        let (pieces, padding) = split_by_piece_count(&data, 64).expect("split must succeed");
        assert_eq!(pieces.len(), 64);
        assert!(pieces.iter().all(|piece| piece.len() == 24));
        assert_eq!(padding, 64 * 24 - 1500);

        // Pieces concatenate back to data followed by `padding` zero bytes.
        let rejoined: Vec<u8> = pieces.concat();
        assert_eq!(&rejoined[..1500], &data[..]);
        assert!(rejoined[1500..].iter().all(|&byte| byte == 0));

        assert_eq!(split_by_piece_count(&data, 0), Err(CodingError::BadPieceCount));
        assert_eq!(split_by_piece_count(&data, 1), Err(CodingError::BadPieceCount));
        assert_eq!(split_by_piece_count(&data, 1501), Err(CodingError::PieceCountMoreThanTotalBytes));
        assert!(split_by_piece_count(&data, 1500).is_ok());
    }

    #[test]
    fn test_split_by_piece_size() {
        let mut rng = rand::rng();

        let mut data = vec![0u8; 1000];
        rng.fill(&mut data[..]);

        let (pieces, padding) = split_by_piece_size(&data, 48).expect("split must succeed");
        assert_eq!(pieces.len(), 1000usize.div_ceil(48));
        assert!(pieces.iter().all(|piece| piece.len() == 48));
        assert_eq!(padding, pieces.len() * 48 - 1000);

        assert_eq!(split_by_piece_size(&data, 0), Err(CodingError::ZeroPieceSize));
        assert_eq!(split_by_piece_size(&data, 1000), Err(CodingError::BadPieceCount));
        assert_eq!(split_by_piece_size(&data, 1024), Err(CodingError::BadPieceCount));
        assert!(split_by_piece_size(&data, 999).is_ok());
    }
}
