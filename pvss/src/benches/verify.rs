use criterion::{criterion_group, BatchSize, Criterion};
use pvss::{
    primitives::{
        group::{Element, Point, Scalar, G1},
        suite::{Bls12381G1, G1ToG2},
    },
    PlayerIndex, ShareSet,
};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

// Configure players based on context
#[cfg(not(full_bench))]
const PLAYERS: &[u16] = &[5, 10, 20];
#[cfg(full_bench)]
const PLAYERS: &[u16] = &[5, 10, 20, 50, 100];

fn benchmark_verify(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for &n in PLAYERS {
        let t = (n - 1) as u32 / 3;
        c.bench_function(&format!("{}/n={} t={}", module_path!(), n, t), |b| {
            b.iter_batched(
                || {
                    let players = (0..n)
                        .map(|_| G1::times(&G1::one(), &Scalar::rand(&mut rng)))
                        .collect::<Vec<_>>();
                    let dealer = PlayerIndex::new(1).unwrap();
                    let share_set = ShareSet::<Bls12381G1, G1ToG2>::deal(
                        &mut rng, b"bench", t, dealer, &players,
                    )
                    .unwrap();
                    (share_set, players)
                },
                |(share_set, players)| {
                    share_set.verify(b"bench", &players).unwrap();
                    black_box(share_set);
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_verify
}
