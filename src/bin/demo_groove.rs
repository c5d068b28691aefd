// Quick demonstration of the sequencer engine over a real MIDI output
// Run with: cargo run --bin demo_groove [port-name-substring]

use std::thread::sleep;
use std::time::Duration;

use stepline::voice::midi::MidiVoiceBackend;
use stepline::{
    presets_for, Engine, InstrumentKind, Pattern, PatternChain, SessionConfig, TrackConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🥁 Stepline - Step Sequencer Demo");
    println!("==================================");

    let ports = MidiVoiceBackend::ports()?;
    if ports.is_empty() {
        println!("No MIDI output ports found. Start a software synth and retry.");
        return Ok(());
    }
    println!("Available MIDI outputs:");
    for name in &ports {
        println!("   - {name}");
    }

    let backend = match std::env::args().nth(1) {
        Some(name) => MidiVoiceBackend::connect(&name)?,
        None => MidiVoiceBackend::connect_default()?,
    };
    let engine = Engine::new(backend);

    let kick = engine.add_instrument(InstrumentKind::Kick)?;
    let snare = engine.add_instrument(InstrumentKind::Snare)?;
    let hat = engine.add_instrument(InstrumentKind::HiHat)?;
    println!("\n✅ Created kick, snare and hi-hat instances");

    // Four-on-the-floor with a backbeat, 16 steps per bar
    let mut kick_steps = vec![false; 16];
    for i in [0, 4, 8, 12] {
        kick_steps[i] = true;
    }
    let mut snare_steps = vec![false; 16];
    for i in [4, 12] {
        snare_steps[i] = true;
    }
    let hat_steps: Vec<bool> = (0..16).map(|i| i % 2 == 0).collect();

    let groove = SessionConfig::new(480.0)
        .with_track(
            kick,
            TrackConfig::new(
                PatternChain::from(vec![Pattern::from_steps(kick_steps)]),
                presets_for(InstrumentKind::Kick)[0].preset(),
            ),
        )
        .with_track(
            snare,
            TrackConfig::new(
                PatternChain::from(vec![Pattern::from_steps(snare_steps)]),
                presets_for(InstrumentKind::Snare)[0].preset(),
            ),
        )
        .with_track(
            hat,
            TrackConfig::new(
                PatternChain::from(vec![Pattern::from_steps(hat_steps.clone())]),
                presets_for(InstrumentKind::HiHat)[0].preset(),
            ),
        );

    println!("▶️  Playing the groove at 120 BPM (sixteenth-note grid)...");
    engine.start(groove.clone())?;
    sleep(Duration::from_secs(4));

    // Double-time hats at the next bar boundary, without a hiccup
    let double_time = Pattern::new(hat_steps, 2.0, 1)?;
    let mut busy = groove;
    busy.set_track(
        hat,
        TrackConfig::new(
            PatternChain::from(vec![double_time]),
            presets_for(InstrumentKind::HiHat)[0].preset(),
        ),
    );
    println!("🔁 Switching to double-time hats at the next bar...");
    engine.update_session_on_next_bar(busy, 4)?;
    sleep(Duration::from_secs(4));

    println!("⏹  Stopping");
    engine.stop()?;
    sleep(Duration::from_millis(200));
    engine.shutdown()?;

    Ok(())
}
