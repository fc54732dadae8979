#![allow(unreachable_pub)] // testing the macro
#![expect(unused)] // testing the macro

use proptest::prelude::*;

use crate::*;

impl_type_flat_struct! {
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct Coordinate {
        x: i32,
        y: i32,
        theta: u16,
    }
}

impl_type_flat_struct! {
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct Blob {
        tag: u8,
        data: Vec<u8>,
        ok: bool,
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Id(u32);
impl_wrapper_codec!(Id => u32);

#[test]
fn test_macro_gen() {
    let c = Coordinate::new(1, -2, 12345);

    let f = format!("{c:?}");
    assert_eq!(f, "Coordinate { x: 1, y: -2, theta: 12345 }");
    assert_eq!(*c.theta(), 12345);

    let b = encode_to_vec(&c).expect("test: encode_to_vec");
    assert_eq!(&b, &[1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff, 0x39, 0x30]);

    let back: Coordinate = decode_buf_exact(&b).expect("test: decode");
    assert_eq!(back, c);
}

#[test]
fn test_wrapper() {
    let b = encode_to_vec(&Id(0x0102_0304)).unwrap();
    assert_eq!(b, [4, 3, 2, 1]);
    assert_eq!(decode_buf_exact::<Id>(&b).unwrap(), Id(0x0102_0304));
}

#[test]
fn test_decoder_advances() {
    let mut dec = BufDecoder::new([1u8, 0, 2, 0, 0, 0]);
    assert_eq!(u16::decode(&mut dec).unwrap(), 1);
    assert_eq!(dec.position(), 2);
    assert_eq!(u32::decode(&mut dec).unwrap(), 2);
    assert_eq!(dec.remaining(), 0);
    assert_eq!(u8::decode(&mut dec).unwrap_err(), CodecError::OverrunInput);
}

#[test]
fn test_extra_input() {
    assert_eq!(
        decode_buf_exact::<u16>(&[1, 2, 3]).unwrap_err(),
        CodecError::ExtraInput
    );
}

#[test]
fn test_bool_strict() {
    assert_eq!(
        decode_buf_exact::<bool>(&[2]).unwrap_err(),
        CodecError::InvalidVariant("bool")
    );
}

#[test]
fn test_vec_length_overrun() {
    // Claims 100 bytes but only carries 2.
    let mut buf = encode_to_vec(&100u64).unwrap();
    buf.extend_from_slice(&[1, 2]);
    assert_eq!(
        decode_buf_exact::<Vec<u8>>(&buf).unwrap_err(),
        CodecError::OverrunInput
    );
}

#[test]
fn test_slice_encoder() {
    let blob = Blob::new(9, vec![1, 2, 3], true);
    let len = encoded_len(&blob).unwrap();
    assert_eq!(len, 1 + 8 + 3 + 1);

    let mut small = [0u8; 5];
    assert_eq!(
        encode_to_slice(&blob, &mut small).unwrap_err(),
        CodecError::BufferTooSmall {
            needed: len,
            available: 5
        }
    );
    assert_eq!(small, [0; 5]);

    let mut out = [0u8; 32];
    let n = encode_to_slice(&blob, &mut out).unwrap();
    assert_eq!(n, len);
    assert_eq!(&out[..n], encode_to_vec(&blob).unwrap().as_slice());

    let mut enc = SliceEncoder::new(&mut small);
    enc.write_buf(&[1, 2, 3]).unwrap();
    assert_eq!(
        enc.write_buf(&[4, 5, 6]).unwrap_err(),
        CodecError::BufferTooSmall {
            needed: 6,
            available: 5
        }
    );
    assert_eq!(enc.written(), 3);
}

proptest! {
    #[test]
    fn blob_roundtrip(tag in any::<u8>(), data in prop::collection::vec(any::<u8>(), 0..64), ok in any::<bool>()) {
        let blob = Blob::new(tag, data, ok);
        let bytes = encode_to_vec(&blob).unwrap();
        prop_assert_eq!(bytes.len(), encoded_len(&blob).unwrap());
        prop_assert_eq!(decode_buf_exact::<Blob>(&bytes).unwrap(), blob);
    }

    #[test]
    fn truncated_blob_rejected(data in prop::collection::vec(any::<u8>(), 1..64), cut in 1usize..10) {
        let bytes = encode_to_vec(&Blob::new(0, data, false)).unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(decode_buf_exact::<Blob>(&bytes[..bytes.len() - cut]).is_err());
    }
}
