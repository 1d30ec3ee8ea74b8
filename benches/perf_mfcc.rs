use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use recit_dsp::features::{extract_mfcc, process_audio_frames, NUM_MFCC_COEFFS};

fn random_signal(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn bench_extract_mfcc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mfcc_extract");
    for &len in &[256usize, 512, 1024] {
        group.bench_function(format!("frame_{len}"), |b| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(17);
                    random_signal(&mut rng, len)
                },
                |frame| {
                    let coeffs = extract_mfcc(&frame, len, NUM_MFCC_COEFFS);
                    criterion::black_box(coeffs);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_process_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("mfcc_frames");
    group.sample_size(10);
    for &frames in &[16usize, 64] {
        let audio_len = 512 + (frames - 1) * 256;
        group.bench_function(format!("frames_{frames}"), |b| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(29);
                    random_signal(&mut rng, audio_len)
                },
                |audio| {
                    let features = process_audio_frames(&audio, 512, 256);
                    criterion::black_box(features);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_mfcc, bench_process_frames);
criterion_main!(benches);
