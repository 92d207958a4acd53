//! Choosing the audio output

use promptdj_audio::{AudioOutput, DeviceOutput, OutputChain};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// How often the headless clock renders
const HEADLESS_TICK: Duration = Duration::from_millis(10);

/// Open the default device, or a headless chain when there is none
pub fn open_output(headless: bool, sample_rate: u32, channels: u16) -> Arc<dyn AudioOutput> {
    if !headless {
        match DeviceOutput::open() {
            Ok(device) => return Arc::new(device),
            Err(e) => warn!("{}; continuing without sound", e),
        }
    }

    let chain = OutputChain::new(sample_rate, channels);
    tokio::spawn(run_headless_clock(chain.clone()));
    info!(sample_rate, channels, "Using headless output");
    Arc::new(chain)
}

/// Render a chain into nowhere at real-time pace so its clock advances
async fn run_headless_clock(chain: OutputChain) {
    let started = Instant::now();
    let channels = chain.channels().max(1) as usize;
    let mut rendered: u64 = 0;
    let mut block = Vec::new();
    let mut ticks = tokio::time::interval(HEADLESS_TICK);

    loop {
        ticks.tick().await;
        let due = (started.elapsed().as_secs_f64() * chain.sample_rate() as f64) as u64;
        let frames = due.saturating_sub(rendered) as usize;
        if frames == 0 {
            continue;
        }
        block.resize(frames * channels, 0.0);
        chain.render(&mut block);
        rendered += frames as u64;
    }
}
