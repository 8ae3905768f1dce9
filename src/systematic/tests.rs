use super::{Decoder, Encoder};
use crate::CodingError;
use crate::coded_piece::CodedPiece;
use rand::Rng;
use rand::seq::SliceRandom;

#[test]
fn test_systematic_round_trip_without_losses() {
    let mut rng = rand::rng();

    let data: Vec<u8> = (0..4096).map(|_| rng.random()).collect();
    let piece_count = 16usize;

    let mut encoder = Encoder::with_piece_count(data.clone(), piece_count).expect("encoder must construct");
    let mut decoder = Decoder::new(encoder.piece_byte_len(), piece_count).expect("decoder must construct");

    // Lossless path: the systematic prefix alone completes decoding.
    for _ in 0..piece_count {
        decoder.add_piece(encoder.coded_piece(&mut rng)).expect("admission must succeed");
    }
    assert!(decoder.is_decoded());
    assert_eq!(decoder.received_piece_count(), piece_count);

    let mut decoded = decoder.decoded_data().expect("decoded");
    decoded.truncate(decoded.len() - encoder.padding());
    assert_eq!(decoded, data);
}

#[test]
fn test_systematic_round_trip_with_losses() {
    let mut rng = rand::rng();

    let data: Vec<u8> = (0..4096).map(|_| rng.random()).collect();
    let piece_count = 16usize;

    let mut encoder = Encoder::with_piece_count(data.clone(), piece_count).expect("encoder must construct");

    // The systematic prefix plus some random redundancy, shuffled, with a
    // third of everything lost in transit.
    let mut coded_pieces: Vec<CodedPiece> = (0..(2 * piece_count)).map(|_| encoder.coded_piece(&mut rng)).collect();
    coded_pieces.shuffle(&mut rng);
    coded_pieces.truncate(2 * piece_count - (2 * piece_count) / 3);

    let mut decoder = Decoder::new(encoder.piece_byte_len(), piece_count).expect("decoder must construct");
    for coded_piece in coded_pieces {
        match decoder.add_piece(coded_piece) {
            Ok(()) => {}
            Err(CodingError::AllUsefulPiecesReceived) => break,
            Err(e) => panic!("unexpected error while decoding: {e:?}"),
        }
    }

    while !decoder.is_decoded() {
        let _ = decoder.add_piece(encoder.coded_piece(&mut rng));
    }

    let mut decoded = decoder.decoded_data().expect("decoded");
    decoded.truncate(decoded.len() - encoder.padding());
    assert_eq!(decoded, data);
}

#[test]
fn test_systematic_pieces_readable_before_full_decoding() {
    let mut rng = rand::rng();

    let piece_count = 8usize;
    let originals: Vec<Vec<u8>> = (0..piece_count).map(|_| (0..32).map(|_| rng.random()).collect()).collect();

    let mut encoder = Encoder::from_pieces(originals.clone()).expect("encoder must construct");
    let mut decoder = Decoder::new(encoder.piece_byte_len(), piece_count).expect("decoder must construct");

    // Admit only the first half of the systematic prefix.
    for _ in 0..(piece_count / 2) {
        decoder.add_piece(encoder.coded_piece(&mut rng)).expect("admission must succeed");
    }

    assert!(!decoder.is_decoded());
    for piece_index in 0..(piece_count / 2) {
        assert_eq!(decoder.get_piece(piece_index).expect("systematic piece is revealed"), originals[piece_index]);
    }
    for piece_index in (piece_count / 2)..piece_count {
        assert_eq!(decoder.get_piece(piece_index), Err(CodingError::PieceNotDecodedYet));
    }
    assert_eq!(decoder.get_piece(piece_count), Err(CodingError::PieceOutOfBound));
    assert_eq!(decoder.get_pieces(), Err(CodingError::MoreUsefulPiecesRequired));
}

#[test]
fn test_systematic_decoder_handles_duplicate_prefix_pieces() {
    let mut rng = rand::rng();

    let piece_count = 4usize;
    let originals: Vec<Vec<u8>> = (0..piece_count).map(|_| (0..16).map(|_| rng.random()).collect()).collect();

    let mut encoder = Encoder::from_pieces(originals.clone()).expect("encoder must construct");
    let first = encoder.coded_piece(&mut rng);

    let mut decoder = Decoder::new(encoder.piece_byte_len(), piece_count).expect("decoder must construct");
    decoder.add_piece(first.clone()).expect("admission must succeed");
    decoder.add_piece(first).expect("duplicate systematic piece is silently dropped");

    assert_eq!(decoder.received_piece_count(), 2);
    assert_eq!(decoder.useful_piece_count(), 1);

    while !decoder.is_decoded() {
        let _ = decoder.add_piece(encoder.coded_piece(&mut rng));
    }
    assert_eq!(decoder.get_pieces().expect("decoded"), originals);
}
