use criterion::criterion_main;

mod deal;
mod verify;

criterion_main!(deal::benches, verify::benches, decrypt::benches);
