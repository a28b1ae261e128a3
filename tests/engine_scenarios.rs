//! End-to-end scenarios driven through the pull-based output.

use piano_tone::backend::OfflineBackend;
use piano_tone::keyboard::key_by_id;
use piano_tone::notes::note_to_frequency;
use piano_tone::{ContextState, EngineConfig, ToneEngine};

const SR: u32 = 48000;
const BLOCK: usize = 480; // 10 ms

fn running_engine() -> (ToneEngine, OfflineBackend) {
    let output = OfflineBackend::mono(SR);
    let mut engine = ToneEngine::new(EngineConfig::default(), output.clone()).unwrap();
    engine.resume().unwrap();
    (engine, output)
}

/// Render `seconds` of audio in 10 ms blocks, returning per-block peaks.
fn run(output: &OfflineBackend, engine: &mut ToneEngine, seconds: f64) -> Vec<f32> {
    let blocks = (seconds * SR as f64 / BLOCK as f64).round() as usize;
    (0..blocks)
        .map(|_| {
            let block = output.render_frames(BLOCK);
            engine.reclaim();
            block.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
        })
        .collect()
}

/// Magnitude of one DFT bin (Goertzel), to tell which pitches are present.
fn tone_energy(samples: &[f32], frequency: f64) -> f64 {
    let w = 2.0 * std::f64::consts::PI * frequency / SR as f64;
    let coeff = 2.0 * w.cos();
    let (mut s1, mut s2) = (0.0_f64, 0.0_f64);
    for &x in samples {
        let s0 = x as f64 + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    (s1 * s1 + s2 * s2 - coeff * s1 * s2).sqrt() / samples.len() as f64
}

#[test]
fn chord_of_two_keys_sounds_together_and_each_completes() {
    let (mut engine, output) = running_engine();
    let c4 = note_to_frequency("C4").unwrap();
    let e4 = note_to_frequency("E4").unwrap();
    engine.play_tone(c4);
    engine.play_tone(e4);

    // 100 ms in, both pitches are present.
    output.render_frames(2400);
    let window = output.render_frames(4800);
    let off_pitch = tone_energy(&window, 370.0);
    let c_energy = tone_energy(&window, c4);
    let e_energy = tone_energy(&window, e4);
    assert!(c_energy > 5.0 * off_pitch, "C4 {c_energy} vs {off_pitch}");
    assert!(e_energy > 5.0 * off_pitch, "E4 {e_energy} vs {off_pitch}");
    assert_eq!(engine.live_voices(), 2);

    // Deep in the release, around 2.0 s, both are still sounding.
    run(&output, &mut engine, 1.8);
    let late = output.render_frames(4800);
    let off_pitch = tone_energy(&late, 370.0);
    let c_energy = tone_energy(&late, c4);
    let e_energy = tone_energy(&late, e4);
    assert!(c_energy > 5.0 * off_pitch, "C4 {c_energy} vs {off_pitch} at 2.0 s");
    assert!(e_energy > 5.0 * off_pitch, "E4 {e_energy} vs {off_pitch} at 2.0 s");
    assert!(c_energy > 0.0 && e_energy > 0.0);
    assert_eq!(engine.live_voices(), 2);

    // Both tear down at 2.6 s and the output returns to silence.
    let peaks = run(&output, &mut engine, 0.7);
    assert_eq!(engine.live_voices(), 0);
    assert_eq!(*peaks.last().unwrap(), 0.0);
}

#[test]
fn resume_is_idempotent() {
    let (mut engine, output) = running_engine();
    run(&output, &mut engine, 0.1);
    let t = engine.current_time();
    engine.resume().unwrap();
    engine.resume().unwrap();
    assert_eq!(engine.state(), ContextState::Running);
    assert_eq!(engine.current_time(), t);
}

#[test]
fn many_voices_share_one_bus_without_clipping() {
    let (mut engine, output) = running_engine();
    for id in ["C3", "E3", "G3", "C4", "E4", "G4", "B4", "C5"] {
        engine.press(key_by_id(id).unwrap()).unwrap();
    }
    let peaks = run(&output, &mut engine, 0.5);
    assert_eq!(engine.live_voices(), 8);
    let loudest = peaks.iter().cloned().fold(0.0_f32, f32::max);
    assert!(loudest > 0.0);
    assert!(loudest < 1.0, "compressed chord reached full scale: {loudest}");
}

#[test]
fn voices_are_torn_down_after_two_point_six_seconds() {
    let (mut engine, output) = running_engine();
    run(&output, &mut engine, 0.5);
    engine.play_tone(440.0);
    let t0 = engine.current_time();

    run(&output, &mut engine, 2.5);
    assert!(engine.current_time() - t0 < 2.6);
    assert_eq!(engine.live_voices(), 1, "voice must stay connected until teardown");

    run(&output, &mut engine, 0.2);
    assert_eq!(engine.live_voices(), 0);
}

#[test]
fn voices_scheduled_while_suspended_sound_on_resume() {
    let output = OfflineBackend::mono(SR);
    let mut engine = ToneEngine::new(EngineConfig::default(), output.clone()).unwrap();
    engine.play_tone(440.0);
    assert_eq!(engine.state(), ContextState::Suspended);

    let silent = run(&output, &mut engine, 0.1);
    assert!(silent.iter().all(|&p| p == 0.0));
    assert_eq!(engine.current_time(), 0.0);

    engine.resume().unwrap();
    let heard = run(&output, &mut engine, 0.1);
    assert!(heard.iter().any(|&p| p > 0.0));
}

#[test]
fn retriggering_a_key_overlaps_instead_of_restarting() {
    let (mut engine, output) = running_engine();
    let a4 = key_by_id("A4").unwrap();
    engine.press(a4).unwrap();
    run(&output, &mut engine, 0.3);
    engine.press(a4).unwrap();
    run(&output, &mut engine, 0.1);
    assert_eq!(engine.live_voices(), 2);

    // The first press tears down 0.3 s before the second.
    run(&output, &mut engine, 2.3);
    assert_eq!(engine.live_voices(), 1);
    run(&output, &mut engine, 0.3);
    assert_eq!(engine.live_voices(), 0);
}

#[test]
fn closing_releases_live_voices() {
    let (mut engine, output) = running_engine();
    engine.play_tone(261.63);
    engine.play_tone(329.63);
    run(&output, &mut engine, 0.05);
    engine.close();
    assert_eq!(engine.state(), ContextState::Closed);
    assert_eq!(engine.live_voices(), 0);
    assert!(output.render_frames(BLOCK).iter().all(|&s| s == 0.0));
}
