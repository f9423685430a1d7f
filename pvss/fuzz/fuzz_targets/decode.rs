#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pvss::{
    bit_pair::BitPair,
    cipher_text::CipherText,
    knowledge::KnowledgeProof,
    primitives::{
        group::{Element, Point, Scalar, G1, G2},
        poly::Poly,
        suite::{Bls12381G1, G1ToG2},
    },
    share::Share,
    PlayerIndex, ShareSet, MAX_PLAYERS, MIN_PLAYERS,
};
use pvss_codec::{Decode, DecodeExt, Encode, EncodeSize};

type Suite = Bls12381G1;
type Translation = G1ToG2;

#[derive(Arbitrary, Debug)]
enum Target {
    Scalar(Vec<u8>),
    G1(Vec<u8>),
    G2(Vec<u8>),
    PlayerIndex(Vec<u8>),
    Poly { data: Vec<u8>, max: u8 },
    BitPair(Vec<u8>),
    KnowledgeProof(Vec<u8>),
    CipherText(Vec<u8>),
    Share(Vec<u8>),
    ShareSet { data: Vec<u8>, players: u8 },
}

/// Re-encodes a successfully decoded value and checks it matches the input.
fn check<T: Encode>(value: &T, data: &[u8]) {
    assert_eq!(value.encode_size(), data.len());
    assert_eq!(&value.encode()[..], data);
}

fn fuzz(target: Target) {
    match target {
        Target::Scalar(data) => {
            if let Ok(value) = Scalar::decode(data.as_slice()) {
                check(&value, &data);
            }
        }
        Target::G1(data) => {
            if let Ok(value) = G1::decode(data.as_slice()) {
                assert_ne!(value, G1::zero());
                check(&value, &data);
            }
        }
        Target::G2(data) => {
            if let Ok(value) = G2::decode(data.as_slice()) {
                assert_ne!(value, G2::zero());
                check(&value, &data);
            }
        }
        Target::PlayerIndex(data) => {
            if let Ok(value) = PlayerIndex::decode(data.as_slice()) {
                assert!(value.get() as usize <= MAX_PLAYERS);
                check(&value, &data);
            }
        }
        Target::Poly { data, max } => {
            let range = (1..=max.max(1) as usize).into();
            if let Ok(value) = Poly::<G1>::decode_cfg(data.as_slice(), &range) {
                assert!(value.required() as usize <= max.max(1) as usize);
                check(&value, &data);
            }
        }
        Target::BitPair(data) => {
            if let Ok(value) = BitPair::<Suite>::decode(data.as_slice()) {
                check(&value, &data);
                let pk = G1::one();
                let _ = value.verify(b"fuzz", &pk);
                let _ = value.decrypt(&Scalar::one());
            }
        }
        Target::KnowledgeProof(data) => {
            if let Ok(value) = KnowledgeProof::decode(data.as_slice()) {
                check(&value, &data);
                let _ = value.verify(b"fuzz", &G1::one(), &G1::one());
            }
        }
        Target::CipherText(data) => {
            if let Ok(value) = CipherText::<Suite>::decode(data.as_slice()) {
                check(&value, &data);
                let (receiver, pk) = (value.receiver(), value.encryption_key());
                let _ = value.verify(b"fuzz", receiver, pk, &G1::one());
                let _ = value.decrypt(&Scalar::one());
            }
        }
        Target::Share(data) => {
            if let Ok(value) = Share::<Suite, Translation>::decode(data.as_slice()) {
                check(&value, &data);
            }
        }
        Target::ShareSet { data, players } => {
            let players = MIN_PLAYERS + players as usize % 4;
            let decoded = ShareSet::<Suite, Translation>::decode_cfg(data.as_slice(), &players);
            if let Ok(value) = decoded {
                check(&value, &data);
                let keys = vec![G1::times(&G1::one(), &Scalar::from_u64(7)); players];
                let _ = value.verify(b"fuzz", &keys);
            }
        }
    }
}

fuzz_target!(|input: Target| {
    fuzz(input);
});
