#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pvss::{
    bit_pair::BitPair,
    primitives::{
        group::{Element, Point, Scalar, G1},
        suite::Bls12381G1,
    },
    Error,
};
use pvss_codec::DecodeExt;
use rand::{rngs::StdRng, SeedableRng};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    seed: u64,
    domain: Vec<u8>,
    symbol: u8,
    tamper: Option<(u16, u8)>,
}

fn fuzz(input: FuzzInput) {
    let mut rng = StdRng::seed_from_u64(input.seed);
    let sk = Scalar::rand(&mut rng);
    let pk = G1::times(&G1::one(), &sk);

    let encrypted = BitPair::<Bls12381G1>::encrypt(&mut rng, &input.domain, &pk, input.symbol);
    let (pair, _) = match encrypted {
        Ok(result) => result,
        Err(Error::InvalidSymbol(symbol)) => {
            assert!(symbol > 3);
            return;
        }
        Err(err) => panic!("unexpected error: {:?}", err),
    };
    assert!(input.symbol <= 3);
    pair.verify(&input.domain, &pk).unwrap();
    assert_eq!(pair.decrypt(&sk).unwrap(), input.symbol);

    // Any single-byte change is either undecodable or unverifiable
    if let Some((position, mask)) = input.tamper {
        if mask == 0 {
            return;
        }
        let mut bytes = pair.to_bytes();
        let position = position as usize % bytes.len();
        bytes[position] ^= mask;
        if let Ok(tampered) = BitPair::<Bls12381G1>::decode(bytes.as_slice()) {
            assert!(tampered.verify(&input.domain, &pk).is_err());
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
