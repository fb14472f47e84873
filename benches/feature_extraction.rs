use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ragasense::analysis::audio::AudioSignal;
use ragasense::analysis::pipeline::{self, DEFAULT_N_MFCC};
use ragasense::analysis::ANALYSIS_SAMPLE_RATE;
use ragasense::analyzers::instrument::feature_tensor;

fn tone_signal(seconds: f32) -> AudioSignal {
    let sr = ANALYSIS_SAMPLE_RATE;
    let samples: Vec<f32> = (0..(seconds * sr as f32) as usize)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin() * 0.7)
        .collect();
    AudioSignal::new(samples, sr)
}

fn bench_extract(c: &mut Criterion) {
    for seconds in [3.0_f32, 10.0] {
        let signal = tone_signal(seconds);
        c.bench_with_input(
            BenchmarkId::new("extract", format!("{seconds}s")),
            &signal,
            |b, signal| {
                b.iter(|| pipeline::extract(black_box(signal), DEFAULT_N_MFCC).expect("extract"));
            },
        );
    }
}

fn bench_instrument_tensor(c: &mut Criterion) {
    let signal = tone_signal(5.0);
    c.bench_with_input(
        BenchmarkId::new("instrument_tensor", "5s"),
        &signal,
        |b, signal| {
            b.iter(|| feature_tensor(black_box(signal), 216).expect("tensor"));
        },
    );
}

criterion_group!(benches, bench_extract, bench_instrument_tensor);
criterion_main!(benches);
