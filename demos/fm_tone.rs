//! FM bell tone with an attack/decay envelope
//!
//! Run with: cargo run --example fm_tone --features parallel

use tracing::info;

use wavematic::nodes::{Oscillator, Ramp};
use wavematic::{Evaluator, SignalGraph, TimeDomain};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut graph = SignalGraph::new();

    let carrier = graph.add(Oscillator::sine(220.0, 1.0, 0.0)?);
    let modulator = graph.add(Oscillator::sine(308.0, 3.0, 0.0)?);
    // the modulation index decays with the note
    let brightness = graph.add(Ramp::new(vec![(0.0, 1.0), (1.5, 0.1)])?);
    let index = graph.product(&[modulator, brightness])?;
    let bell = graph.frequency_modulate(carrier, index)?;

    let envelope = graph.add(Ramp::new(vec![(0.0, 0.0), (0.01, 1.0), (1.5, 0.0)])?);
    let note = graph.envelope(bell, envelope)?;
    let echo = graph.shift(note, 0.25)?;
    let out = graph.weighted_sum(&[(note, 0.7), (echo, 0.3)])?;

    let domain = TimeDomain::from_duration(0.0, 48_000.0, 2.0)?;
    let evaluator = Evaluator::new().with_parallel(true);
    let samples = evaluator.evaluate(&graph, out, &domain)?;

    let peak = samples.iter().fold(0.0_f64, |peak, s| peak.max(s.abs()));
    info!(samples = samples.len(), peak, parallel = evaluator.is_parallel(), "rendered tone");

    // coarse RMS per 100 ms window
    for (i, window) in samples.chunks(4_800).enumerate() {
        let rms = (window.iter().map(|s| s * s).sum::<f64>() / window.len() as f64).sqrt();
        println!("{:>4} ms  {rms:.3}", i * 100);
    }

    Ok(())
}
