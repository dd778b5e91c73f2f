use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wavematic::nodes::{Noise, Oscillator};
use wavematic::{Evaluator, SignalGraph, TimeDomain, Waveform};

pub fn criterion_benchmark(c: &mut Criterion) {
    let domain = TimeDomain::new(0.0, 48_000.0, 4_800).unwrap();

    c.bench_function("Noise.sample() x8 octaves", |b| {
        let noise = Noise::new(42).with_octaves(8).unwrap();
        let mut t = 0.0;
        b.iter(|| {
            t += 1.0 / 48_000.0;
            black_box(noise.sample(black_box(t)))
        })
    });

    c.bench_function("evaluate fm voice", |b| {
        let mut graph = SignalGraph::new();
        let carrier = graph.add(Oscillator::sine(440.0, 1.0, 0.0).unwrap());
        let vibrato = graph.add(Oscillator::sine(5.0, 2.0, 0.0).unwrap());
        let fm = graph.frequency_modulate(carrier, vibrato).unwrap();
        let root = graph.clip(fm, -0.8, 0.8).unwrap();

        b.iter(|| graph.evaluate(black_box(root), &domain).unwrap())
    });

    // one noise field read by many shifted parents
    let mut graph = SignalGraph::new();
    let terrain = graph.add(Noise::new(7).with_octaves(6).unwrap());
    let taps: Vec<_> = (0..16)
        .map(|k| graph.shift(terrain, k as f64 * 1e-3).unwrap())
        .collect();
    let root = graph.sum(&taps).unwrap();

    c.bench_function("evaluate shared subgraph", |b| {
        b.iter(|| graph.evaluate(black_box(root), &domain).unwrap())
    });

    c.bench_function("evaluate shared subgraph (parallel)", |b| {
        let evaluator = Evaluator::new().with_parallel(true);
        b.iter(|| evaluator.evaluate(&graph, black_box(root), &domain).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
