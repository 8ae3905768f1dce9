mod decoder;
mod encoder;
mod recoder;


pub use decoder::Decoder;
pub use encoder::Encoder;
pub use recoder::Recoder;
