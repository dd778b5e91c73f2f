//! Layered terrain height profile
//!
//! Run with: cargo run --example terrain_profile

use tracing::info;

use wavematic::nodes::{Noise, Oscillator};
use wavematic::{SignalGraph, TimeDomain};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut graph = SignalGraph::new();

    // broad hills with fine detail on top
    let hills = graph.add(
        Noise::new(1337)
            .with_frequency(0.05)?
            .with_amplitude(40.0)?
            .with_octaves(6)?
            .with_persistence(0.5)?,
    );
    let swell = graph.add(Oscillator::sine(0.01, 10.0, 0.0)?.with_offset(50.0)?);
    let ground = graph.sum(&[hills, swell])?;
    // water level
    let terrain = graph.clip(ground, 25.0, f64::INFINITY)?;
    graph.set_name(terrain, "height")?;

    let domain = TimeDomain::from_duration(0.0, 1.0, 200.0)?;
    let series = graph.render(terrain, &domain)?;
    info!(samples = series.len(), "rendered terrain");

    for (x, height) in series.iter().step_by(4) {
        let bar = "#".repeat((height / 2.0).max(0.0) as usize);
        println!("{x:>6.1} {height:>7.2} {bar}");
    }

    Ok(())
}
