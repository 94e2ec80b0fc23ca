use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qoa::{decode, encode, StreamDescriptor};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::time::Duration;

fn white_noise(samples: usize, channels: usize) -> Vec<i16> {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    (0..samples * channels)
        .map(|_| rng.gen_range(-20000..20000))
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let pcm = white_noise(5 * 5120, 2);
    let mut group = c.benchmark_group("encode");
    group.sample_size(20).measurement_time(Duration::new(10, 0));
    group.bench_function("encode_stereo_5_frames", |b| {
        b.iter(|| {
            let mut desc = StreamDescriptor::new(2, 48000, (pcm.len() / 2) as u32);
            black_box(encode(black_box(&pcm), &mut desc).unwrap())
        })
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let pcm = white_noise(5 * 5120, 2);
    let mut desc = StreamDescriptor::new(2, 48000, (pcm.len() / 2) as u32);
    let bytes = encode(&pcm, &mut desc).unwrap();

    let mut group = c.benchmark_group("decode");
    group.sample_size(20).measurement_time(Duration::new(10, 0));
    group.bench_function("decode_stereo_5_frames", |b| {
        b.iter(|| black_box(decode(black_box(&bytes)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
