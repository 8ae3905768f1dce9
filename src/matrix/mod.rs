mod decoder_state;
mod matrix;
mod parallel;

pub use decoder_state::DecoderState;
pub use matrix::Matrix;
pub use parallel::ParallelDecoderState;
