use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use voice_fixtures::{SampleBuffer, SynthesisRequest, SynthesisStyle, Synthesizer, fixture_rng};

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize");
    let synth = Synthesizer::default();

    for style in [SynthesisStyle::Steady, SynthesisStyle::Varied] {
        for duration in [0.5, 1.5, 3.5].iter() {
            let request = SynthesisRequest::with_default_rate(style, *duration).unwrap();

            group.bench_with_input(
                BenchmarkId::new(style.to_string(), duration),
                &request,
                |b, request| {
                    let mut rng = fixture_rng(42, 0);
                    b.iter(|| {
                        let _buffer = synth.synthesize(black_box(request), &mut rng).unwrap();
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_sample_rates(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_rates");
    let synth = Synthesizer::default();

    for sample_rate in [8000u32, 16000, 44100, 48000].iter() {
        let request = SynthesisRequest::new(SynthesisStyle::Varied, 1.0, *sample_rate).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(sample_rate),
            &request,
            |b, request| {
                let mut rng = fixture_rng(7, 0);
                b.iter(|| {
                    let _buffer = synth.synthesize(black_box(request), &mut rng).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    // One second of a 440Hz tone at 16kHz
    let signal: Vec<f64> = (0..16000)
        .map(|i| 0.8 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 16000.0).sin())
        .collect();

    c.bench_function("quantize_1s", |b| {
        b.iter(|| {
            let _buffer = SampleBuffer::quantize(black_box(signal.iter().copied()), 16000);
        });
    });
}

criterion_group!(benches, bench_synthesize, bench_sample_rates, bench_quantize);
criterion_main!(benches);
