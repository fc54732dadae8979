//! High-level util functions.

use crate::{BufDecoder, Codec, CodecError, SizeCounter, SliceEncoder};

/// Decodes a buffer from a buffer, throwing an error if there's leftover bytes.
pub fn decode_buf_exact<T: Codec>(buf: &[u8]) -> Result<T, CodecError> {
    let mut dec = BufDecoder::new(buf);
    let v = T::decode(&mut dec)?;
    if !dec.rest().is_empty() {
        return Err(CodecError::ExtraInput);
    }
    Ok(v)
}

/// Encodes the value into a newly allocated vec.
pub fn encode_to_vec<T: Codec>(v: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    v.encode(&mut buf)?;
    Ok(buf)
}

/// Encodes the value into `out`, returning the number of bytes written.
///
/// The length is checked up front, so on [`CodecError::BufferTooSmall`]
/// nothing has been written and `needed` is the full encoded length.
pub fn encode_to_slice<T: Codec>(v: &T, out: &mut [u8]) -> Result<usize, CodecError> {
    let needed = encoded_len(v)?;
    if needed > out.len() {
        return Err(CodecError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let mut enc = SliceEncoder::new(out);
    v.encode(&mut enc)?;
    Ok(enc.written())
}

/// Returns the number of bytes `v` encodes to, without allocating.
pub fn encoded_len<T: Codec>(v: &T) -> Result<usize, CodecError> {
    let mut counter = SizeCounter::new();
    v.encode(&mut counter)?;
    Ok(counter.len())
}
