//! # lincode: Random Linear Network Coding over GF(2^8)
//!
//! `lincode` splits a data blob into equal-sized pieces and codes them as
//! random linear combinations over $GF(2^8)$, tagged with their coding
//! vectors. Any node holding coded pieces can *recode* them into fresh
//! combinations without decoding first, and a receiver reconstructs the
//! originals as soon as enough linearly independent combinations arrive —
//! which pieces were lost, and in what order the rest showed up, does not
//! matter. That droppable, recodable redundancy is what makes RLNC a good
//! fit for erasure-resilient transports and overlay networks.
//!
//! The building blocks:
//!
//! - [`full::Encoder`] — owns one generation of originals (zero-padded to
//!   equal piece length, padding surfaced via
//!   [`padding`](full::Encoder::padding)) and emits unbounded random
//!   combinations.
//! - [`systematic::Encoder`] — emits the originals themselves first, tagged
//!   with unit vectors, then falls back to random combinations; a lossless
//!   receiver decodes for free.
//! - [`full::Recoder`] — combines already-coded pieces under a fresh random
//!   vector, composing the coefficients in one matrix product, so relays add
//!   redundancy mid-path without ever seeing plaintext pieces.
//! - [`full::Decoder`] / [`systematic::Decoder`] — incremental Gaussian
//!   elimination over the augmented (coefficients | payload) system, kept in
//!   reduced row echelon form after every admission; individual pieces become
//!   readable the moment their row reduces to a unit vector.
//! - [`matrix::ParallelDecoderState`] — the same decoding algebra with
//!   payload row operations fanned out across a worker pool, for generations
//!   with large pieces.
//!
//! ## Example
//!
//! ```rust
//! use lincode::{
//!     CodingError,
//!     full::{Decoder, Encoder, Recoder},
//! };
//!
//! let mut rng = rand::rng();
//!
//! // 1. Split 10 kB of data into 32 pieces coded together.
//! let original_data: Vec<u8> = (0..10 * 1024).map(|_| rand::Rng::random(&mut rng)).collect();
//! let piece_count = 32;
//!
//! let encoder = Encoder::with_piece_count(original_data.clone(), piece_count).expect("failed to create encoder");
//!
//! // 2. A relay somewhere collected half a generation worth of coded pieces
//! //    and recodes them into new ones.
//! let relayed: Vec<_> = (0..piece_count / 2).map(|_| encoder.coded_piece(&mut rng)).collect();
//! let recoder = Recoder::new(relayed).expect("failed to create recoder");
//!
//! // 3. The receiver decodes from a mix of recoded and first-hand pieces.
//! let mut decoder = Decoder::new(encoder.piece_byte_len(), piece_count).expect("failed to create decoder");
//!
//! let recoded_piece = recoder.coded_piece(&mut rng).expect("failed to recode");
//! decoder.add_piece(recoded_piece).expect("first coded piece must be useful");
//!
//! while !decoder.is_decoded() {
//!     match decoder.add_piece(encoder.coded_piece(&mut rng)) {
//!         Ok(()) => {}                                       // useful, or dependent and silently dropped
//!         Err(CodingError::AllUsefulPiecesReceived) => break, // stop feeding
//!         Err(e) => panic!("unexpected error during decoding: {e:?}"),
//!     }
//! }
//!
//! // 4. Padding travels out-of-band: truncate after reassembly.
//! let mut decoded = decoder.decoded_data().expect("failed to read decoded data");
//! decoded.truncate(decoded.len() - encoder.padding());
//! assert_eq!(decoded, original_data);
//! ```
//!
//! Entropy comes from the caller: every piece-producing operation takes a
//! `rand::Rng`. Enable the `parallel` feature to spread the encoder's
//! combination loop across a rayon pool; the parallel *decoder* engine is
//! always available and manages its own threads.

mod common;

pub mod coded_piece;
pub mod full;
pub mod matrix;
pub mod systematic;

pub use crate::coded_piece::{CodedPiece, CodingVector, Piece, coded_pieces_from_flattened, split_by_piece_count, split_by_piece_size};
pub use crate::common::errors::CodingError;
pub use crate::common::gf256::Gf256;
