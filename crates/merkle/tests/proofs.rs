//! End-to-end proof properties: round trips through the wire format and
//! tamper sensitivity.
#![allow(missing_docs)]
#![allow(unused_crate_dependencies)]

use proptest::prelude::*;
use sha2::{Digest as _, Sha256};
use spi_merkle::{
    HashAlgorithm, MerkleError, MerkleProof, MerkleTree, ProofVerifier, SiblingSide, TreeConfig,
};

fn records(n: usize, leaf_size: usize, seed: u8) -> Vec<Vec<u8>> {
    (0..n)
        .map(|i| {
            (0..leaf_size)
                .map(|j| (i as u8).wrapping_mul(31) ^ (j as u8) ^ seed)
                .collect()
        })
        .collect()
}

fn sha(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[test]
fn four_leaf_scenario_against_sha2() {
    let recs: Vec<[u8; 32]> = (0..4u8).map(|i| [i; 32]).collect();
    let tree = MerkleTree::from_records(TreeConfig::default(), &recs).unwrap();

    let h: Vec<[u8; 32]> = recs.iter().map(|r| sha(r)).collect();
    let left = sha(&[h[0], h[1]].concat());
    let right = sha(&[h[2], h[3]].concat());
    let root = sha(&[left, right].concat());
    assert_eq!(tree.root().unwrap(), root);

    let proof = tree.prove(2).unwrap();
    assert_eq!(proof.siblings().len(), 2);
    assert_eq!(proof.siblings()[0].digest(), &h[3]);
    assert_eq!(proof.siblings()[0].side(), SiblingSide::Right);
    assert_eq!(proof.siblings()[1].digest(), &left);
    assert_eq!(proof.siblings()[1].side(), SiblingSide::Left);

    let bytes = proof.to_bytes().unwrap();
    assert_eq!(bytes.len(), 32 + 8 + 8 + 2 * 33 + 32);
    let decoded = MerkleProof::from_bytes(&bytes).unwrap();

    let v = ProofVerifier::new(HashAlgorithm::Sha256);
    assert!(v.verify(&decoded, &recs[2], &root));
    assert!(!v.verify(&decoded, &recs[0], &root));
}

#[test]
fn boundary_cases() {
    let tree = MerkleTree::from_records(TreeConfig::default(), &records(1, 32, 0)).unwrap();
    let proof = tree.prove(0).unwrap();
    assert!(proof.siblings().is_empty());
    assert_eq!(proof.leaf_digest(), proof.root_digest());

    assert!(matches!(
        MerkleTree::create(0, TreeConfig::default()),
        Err(MerkleError::InvalidSize(_))
    ));

    let tree = MerkleTree::from_records(TreeConfig::default(), &records(8, 32, 0)).unwrap();
    assert!(matches!(
        tree.prove(8),
        Err(MerkleError::LeafOutOfBounds { index: 8, num_leaves: 8 })
    ));
}

fn tree_params() -> impl Strategy<Value = (u32, usize, HashAlgorithm, u8)> {
    (
        0u32..=7,
        1usize..=48,
        prop_oneof![Just(HashAlgorithm::Sha256), Just(HashAlgorithm::Blake2b256)],
        any::<u8>(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_verifies((shift, leaf_size, alg, seed) in tree_params(), pick in any::<u64>()) {
        let n = 1usize << shift;
        let recs = records(n, leaf_size, seed);
        let config = TreeConfig::default()
            .with_hash_algorithm(alg)
            .with_leaf_size(leaf_size);
        let tree = MerkleTree::from_records(config, &recs).unwrap();
        let root = tree.root().unwrap();

        let i = pick % n as u64;
        let bytes = tree.prove(i).unwrap().to_bytes().unwrap();
        let proof = MerkleProof::from_bytes(&bytes).unwrap();

        prop_assert_eq!(proof.depth(), shift as usize);
        let v = ProofVerifier::new(alg);
        prop_assert!(v.verify(&proof, &recs[i as usize], &root));
        prop_assert_eq!(v.verify_strict(&proof, &recs[i as usize], &root), Ok(()));
    }

    #[test]
    fn flipped_record_bit_fails((shift, leaf_size, alg, seed) in tree_params(), pick in any::<u64>(), bit in any::<usize>()) {
        let n = 1usize << shift;
        let recs = records(n, leaf_size, seed);
        let config = TreeConfig::default()
            .with_hash_algorithm(alg)
            .with_leaf_size(leaf_size);
        let tree = MerkleTree::from_records(config, &recs).unwrap();
        let root = tree.root().unwrap();

        let i = (pick % n as u64) as usize;
        let proof = tree.prove(i as u64).unwrap();

        let mut rec = recs[i].clone();
        let bit = bit % (leaf_size * 8);
        rec[bit / 8] ^= 1 << (bit % 8);
        prop_assert!(!ProofVerifier::new(alg).verify(&proof, &rec, &root));
    }

    #[test]
    fn flipped_sibling_or_side_fails((shift, leaf_size, alg, seed) in tree_params(), pick in any::<u64>(), level in any::<usize>(), bit in 0usize..256, flip_side in any::<bool>()) {
        prop_assume!(shift > 0);
        let n = 1usize << shift;
        let recs = records(n, leaf_size, seed);
        let config = TreeConfig::default()
            .with_hash_algorithm(alg)
            .with_leaf_size(leaf_size);
        let tree = MerkleTree::from_records(config, &recs).unwrap();
        let root = tree.root().unwrap();

        let i = (pick % n as u64) as usize;
        let mut bytes = tree.prove(i as u64).unwrap().to_bytes().unwrap();

        // Sibling entries start after the leaf digest, index and count.
        let entry = 48 + (level % shift as usize) * 33;
        if flip_side {
            bytes[entry + 32] ^= 1;
        } else {
            bytes[entry + bit / 8] ^= 1 << (bit % 8);
        }

        let proof = MerkleProof::from_bytes(&bytes).unwrap();
        prop_assert!(!ProofVerifier::new(alg).verify(&proof, &recs[i], &root));
    }

    #[test]
    fn truncated_encoding_rejected(shift in 0u32..=6, cut in 1usize..40) {
        let n = 1usize << shift;
        let tree = MerkleTree::from_records(TreeConfig::default(), &records(n, 32, 0)).unwrap();
        let bytes = tree.prove(0).unwrap().to_bytes().unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(matches!(
            MerkleProof::from_bytes(&bytes[..bytes.len() - cut]),
            Err(MerkleError::InvalidProof(_))
        ));
    }

    #[test]
    fn same_leaves_same_root(shift in 0u32..=6, seed in any::<u8>()) {
        let recs = records(1 << shift, 32, seed);
        let a = MerkleTree::from_records(TreeConfig::default(), &recs).unwrap();
        let b = MerkleTree::from_records(TreeConfig::default(), &recs).unwrap();
        prop_assert_eq!(a.root().unwrap(), b.root().unwrap());
    }
}
