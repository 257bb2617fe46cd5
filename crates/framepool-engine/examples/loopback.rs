//! Push a decoded stream through the dual-clock engine and print what
//! comes out the wide read port.
//!
//! ```text
//! RUST_LOG=debug cargo run -p framepool-engine --example loopback
//! ```

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use framepool_arena::PoolConfig;
use framepool_core::Width;
use framepool_engine::{
    ClockConfig, EngineConfig, EngineError, FrameAssembler, FrameEngine, StreamBeat,
};

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = EngineConfig::new(PoolConfig::new(64).with_rd_width(Width::Bits32));
    config.read_clock = ClockConfig::with_period(Duration::from_micros(100));
    let mut engine = FrameEngine::start(config)?;

    let lengths = [14usize, 18, 3, 16, 8];
    let mut asm = FrameAssembler::default();
    for (n, &len) in lengths.iter().enumerate() {
        let units: Vec<u64> = (0..len as u64).map(|i| (n as u64) << 4 | (i & 0xf)).collect();
        for beat in StreamBeat::frame(&units) {
            if let Some(frame) = asm.push(beat) {
                engine.submit(frame)?;
            }
        }
    }

    loop {
        match engine.recv(Duration::from_millis(200)) {
            Ok(frame) => println!(
                "{} units @ {} in {} words: {:02x?}",
                frame.units.len(),
                frame.addr,
                frame.words,
                frame.units
            ),
            Err(EngineError::Timeout) => break,
            Err(e) => return Err(e),
        }
    }

    let report = engine.shutdown();
    println!("{:#?}", report.metrics);
    Ok(())
}
