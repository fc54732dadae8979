//! Binary payload layouts carried in requests and responses.
//!
//! All integers are little-endian, byte strings are prefixed with their
//! length as a `u64`.
//!
//! | Operation | Request payload | Response payload |
//! |---|---|---|
//! | `CreateTree` | [`CreateTreeParams`] | [`TreeInfo`] |
//! | `BuildTree` | concatenated leaf records | root digest |
//! | `UpdateLeaf` | one leaf record | root digest |
//! | `GenerateProof` | empty | proof bytes |
//! | `VerifyProof` | length-prefixed proof, then the record | one byte, 1 if verified |
//! | `BatchGenerate` | empty | `u64` count, then length-prefixed proofs |
//! | `BatchVerify` | per entry, length-prefixed proof and record | `u64` count, then one byte per entry |
//! | `TreeInfo` | empty | [`TreeInfo`] |
//! | `DestroyTree` | empty | empty |

use spi_codec::{BufDecoder, Codec, CodecError, Decoder, Encoder, impl_type_flat_struct};

impl_type_flat_struct! {
    /// Parameters for creating a tree.
    ///
    /// A zero `leaf_size` selects the context's default.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct CreateTreeParams {
        num_leaves: u64,
        hash_type: u8,
        leaf_size: u32,
    }
}

impl_type_flat_struct! {
    /// Description of a registered tree.
    ///
    /// `root` is all zeros until the tree is built.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct TreeInfo {
        tree_id: u64,
        num_leaves: u64,
        depth: u8,
        hash_type: u8,
        leaf_size: u32,
        built: bool,
        root: [u8; 32],
    }
}

/// Request payload for `VerifyProof`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifyProofPayload {
    /// Encoded proof.
    pub proof: Vec<u8>,

    /// Leaf record the proof is for.
    pub record: Vec<u8>,
}

impl Codec for VerifyProofPayload {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let proof = Vec::<u8>::decode(dec)?;
        // The record takes up whatever is left.
        let mut record = vec![0; dec.remaining()];
        dec.read_buf(&mut record)?;
        Ok(Self { proof, record })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.proof.encode(enc)?;
        enc.write_buf(&self.record)
    }
}

/// One entry of a `BatchVerify` request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchVerifyEntry {
    /// Encoded proof.
    pub proof: Vec<u8>,

    /// Leaf record the proof is for.
    pub record: Vec<u8>,
}

impl Codec for BatchVerifyEntry {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let proof = Vec::<u8>::decode(dec)?;
        let record = Vec::<u8>::decode(dec)?;
        Ok(Self { proof, record })
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        self.proof.encode(enc)?;
        self.record.encode(enc)
    }
}

/// Decodes `BatchVerify` entries until the payload is used up.
///
/// Fails with [`CodecError::OverflowContainer`] as soon as input remains
/// after `max_entries` entries, without decoding the rest.
pub fn decode_batch_verify(
    payload: &[u8],
    max_entries: usize,
) -> Result<Vec<BatchVerifyEntry>, CodecError> {
    let mut dec = BufDecoder::new(payload);
    let mut entries = Vec::new();
    while dec.remaining() > 0 {
        if entries.len() == max_entries {
            return Err(CodecError::OverflowContainer);
        }
        entries.push(BatchVerifyEntry::decode(&mut dec)?);
    }
    Ok(entries)
}

/// Encodes `BatchVerify` entries.
pub fn encode_batch_verify(entries: &[BatchVerifyEntry]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    for e in entries {
        e.encode(&mut buf)?;
    }
    Ok(buf)
}

/// Encodes a list of byte strings as a `u64` count followed by each one
/// length-prefixed.
pub fn encode_byte_list(items: &[Vec<u8>]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    (items.len() as u64).encode(&mut buf)?;
    for item in items {
        item.encode(&mut buf)?;
    }
    Ok(buf)
}

/// Inverse of [`encode_byte_list`].
pub fn decode_byte_list(payload: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut dec = BufDecoder::new(payload);
    let count = u64::decode(&mut dec)?;
    // Every item costs at least its 8-byte length prefix.
    if count > (dec.remaining() / 8) as u64 {
        return Err(CodecError::OverrunInput);
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(Vec::<u8>::decode(&mut dec)?);
    }
    if dec.remaining() > 0 {
        return Err(CodecError::ExtraInput);
    }
    Ok(items)
}

/// Encodes per-entry results as a `u64` count followed by one byte each.
pub fn encode_results(results: &[bool]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(8 + results.len());
    (results.len() as u64).encode(&mut buf)?;
    for r in results {
        r.encode(&mut buf)?;
    }
    Ok(buf)
}

/// Inverse of [`encode_results`].
pub fn decode_results(payload: &[u8]) -> Result<Vec<bool>, CodecError> {
    let mut dec = BufDecoder::new(payload);
    let count = u64::decode(&mut dec)?;
    if count != dec.remaining() as u64 {
        return Err(CodecError::MalformedField("results.count"));
    }
    (0..count).map(|_| bool::decode(&mut dec)).collect()
}
