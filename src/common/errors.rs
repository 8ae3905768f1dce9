use thiserror::Error;

/// Closed set of failures surfaced by the coding, recoding and decoding APIs.
///
/// Linear dependence of a received piece is deliberately *not* part of this
/// enum: a dependent piece is dropped during row reduction and the admission
/// still succeeds. `AllUsefulPiecesReceived` is a stop signal for feeders,
/// not a failure.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodingError {
    #[error("matrices can't be multiplied, inner dimensions differ")]
    MatrixDimensionMismatch,
    #[error("no more pieces required for decoding")]
    AllUsefulPiecesReceived,
    #[error("not enough pieces received yet to decode")]
    MoreUsefulPiecesRequired,
    #[error("copying bytes into piece failed")]
    CopyFailedDuringPieceConstruction,
    #[error("#-of pieces in one generation can't exceed total byte length of data")]
    PieceCountMoreThanTotalBytes,
    #[error("piece byte length must be non-zero")]
    ZeroPieceSize,
    #[error("#-of pieces in one generation must be at least 2 and fit the data")]
    BadPieceCount,
    #[error("coded data byte length doesn't match generation geometry")]
    CodedDataLengthMismatch,
    #[error("coding vector length doesn't match #-of pieces coded together")]
    CodingVectorLengthMismatch,
    #[error("requested piece index is >= #-of pieces coded together")]
    PieceOutOfBound,
    #[error("piece not yet decoded, more useful pieces required")]
    PieceNotDecodedYet,
    #[error("coded piece byte length doesn't match decoder geometry")]
    CodedPieceSizeMismatch,
    #[error("0 is the additive identity of GF(2^8), it has no multiplicative inverse")]
    CannotInvertGf256AdditiveIdentity,
    #[error("decoder was cancelled, it can't make progress anymore")]
    DecodingCancelled,
}
