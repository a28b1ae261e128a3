//! piano - play the piano tone engine from the terminal
//!
//! Type shortcut keys (`zsxdcvgbhnjm` for octave 3, `q2w3er5t6y7ui` for
//! octave 4) or note names (`C4 E4 G4`) and press enter. Everything on one
//! line sounds together. `keys` lists the keyboard, `quit` exits.
//!
//! Run with: cargo run --bin piano

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use piano_tone::keyboard::{KeyColor, PIANO_KEYS, key_by_id, key_for_shortcut};
use piano_tone::notes::note_to_frequency_with_tuning;
use piano_tone::{EngineConfig, ToneEngine, ToneError};

fn main() -> Result<(), ToneError> {
    logger(env_logger::Env::default()).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let lifetime = config.voice_lifetime();
    let tuning = config.tuning_pitch;

    let mut engine = ToneEngine::native(config)?;
    engine.resume()?;
    println!(
        "piano ready at {} Hz. Type keys or notes, then enter ('keys' to list, 'quit' to exit).",
        engine.sample_rate().unwrap_or_default()
    );

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "keys" => {
                print_keys();
                continue;
            }
            _ => {}
        }

        let mut played = Vec::new();
        for token in line.split_whitespace() {
            if let Some(key) = key_by_id(token) {
                engine.press(key)?;
                played.push(key.id.to_string());
            } else if let Ok(frequency) = note_to_frequency_with_tuning(token, tuning) {
                engine.resume()?;
                engine.play_tone(frequency);
                played.push(format!("{token} ({frequency:.2} Hz)"));
            } else {
                for c in token.chars() {
                    match key_for_shortcut(c) {
                        Some(key) => {
                            engine.press(key)?;
                            played.push(key.id.to_string());
                        }
                        None => println!("  no key bound to '{c}'"),
                    }
                }
            }
        }
        if !played.is_empty() {
            println!(
                "  {} @ {:.3}s ({} voice(s) live)",
                played.join(" "),
                engine.current_time(),
                engine.live_voices()
            );
        }
        engine.reclaim();
    }

    // Let the last notes ring out before releasing the device.
    thread::sleep(Duration::from_secs_f64(lifetime));
    engine.close();
    Ok(())
}

/// Engine logs at info unless the environment (RUST_LOG) says otherwise.
fn logger(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or("info"))
}

fn print_keys() {
    for key in &PIANO_KEYS {
        let color = match key.color {
            KeyColor::White => "white",
            KeyColor::Black => "black",
        };
        println!(
            "  {:>3}  {:<5} {:>8.2} Hz  [{}]",
            key.id,
            color,
            key.frequency(),
            key.shortcut
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_warnings_reach_the_log() {
        let env = env_logger::Env::new().filter("PIANO_LOG_UNSET_IN_TESTS");
        let logger = logger(env).build();
        assert_eq!(logger.filter(), log::LevelFilter::Info);
        let warn = log::Metadata::builder()
            .level(log::Level::Warn)
            .target("piano_tone::engine")
            .build();
        assert!(log::Log::enabled(&logger, &warn));
    }
}
