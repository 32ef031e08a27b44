use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mic_stream_controller::audio::{apply_gain, GainFactor, SampleBuffer};
use mic_stream_controller::constants::STREAM_BUFFER_BYTES;

/// One capture buffer of a 440 Hz tone at 16 kHz
fn tone_block(samples: usize) -> Vec<i16> {
    (0..samples)
        .map(|i| {
            let phase = i as f32 * 440.0 * std::f32::consts::TAU / 16_000.0;
            (phase.sin() * 8_000.0) as i16
        })
        .collect()
}

fn bench_apply_gain(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_gain");
    let block = tone_block(STREAM_BUFFER_BYTES / 2);

    for factor in [1, 10, 20] {
        let gain = GainFactor::clamped(factor);
        group.bench_with_input(BenchmarkId::from_parameter(gain), &gain, |b, gain| {
            let mut samples = block.clone();
            b.iter(|| {
                samples.copy_from_slice(&block);
                apply_gain(black_box(&mut samples), *gain);
            })
        });
    }
    group.finish();
}

fn bench_buffer_commit(c: &mut Criterion) {
    let mut buffer = SampleBuffer::with_capacity_bytes(STREAM_BUFFER_BYTES).unwrap();
    c.bench_function("commit_and_amplify", |b| {
        b.iter(|| {
            buffer.storage_mut().fill(1_000);
            let n = buffer.commit_bytes(black_box(STREAM_BUFFER_BYTES)).unwrap();
            apply_gain(buffer.samples_mut(), GainFactor::MAX);
            black_box(n)
        })
    });
}

criterion_group!(benches, bench_apply_gain, bench_buffer_commit);
criterion_main!(benches);
