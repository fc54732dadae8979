//! Fixed-width binary encoding used for proofs and service payloads.
//!
//! All integers are little-endian regardless of host byte order, so encoded
//! bytes are portable between machines.

mod errors;
pub use errors::{CodecError, CodecResult};

mod types;
pub use types::{Codec, Decoder, Encoder};

mod buf_decoder;
pub use buf_decoder::BufDecoder;

mod slice_encoder;
pub use slice_encoder::{SizeCounter, SliceEncoder};

mod macros;

mod util;
pub use util::{decode_buf_exact, encode_to_slice, encode_to_vec, encoded_len};

#[cfg(test)]
mod tests;
