// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;

use anyhow::{anyhow, Context, Result};
use notegen::generators::presets;
use notegen::{Chord, ChordProgressionGenerator, RomanNumeral, ScaleInfo, SessionFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("notegen - Music theory and note sequence generator");
    println!();
    println!("Usage: notegen [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --scale <ROOT> <TYPE>                      Print the notes of a scale");
    println!("  --chord <SYMBOL>                           Print the notes of a chord (e.g. F#m7b5)");
    println!("  --roman <NUMERAL> <KEY> <TYPE>             Resolve a Roman numeral in a key");
    println!("  --progression <GENRE|PRESET> <KEY> <TYPE> [LEN]");
    println!("                                             Generate a chord progression (default length 4)");
    println!("  --generate <SESSION.yaml>                  Generate a note sequence and print it as YAML");
    println!("  --help                                     Show this help message");
    println!();
    println!("Set RUST_LOG=debug for generator details.");
}

fn require<'a>(args: &'a [String], count: usize, option: &str, usage: &str) -> Result<&'a [String]> {
    if args.len() < count + 2 {
        return Err(anyhow!("{} requires {}", option, usage));
    }
    Ok(&args[2..])
}

fn show_scale(root: &str, scale_type: &str) -> Result<()> {
    let scale = ScaleInfo::from_key(root, scale_type)?.scale()?;
    let notes: Vec<String> = scale.notes().iter().map(|n| n.full_name()).collect();
    println!("{}: {}", scale, notes.join(" "));
    println!("Intervals: {:?}", scale.calculate_intervals());
    Ok(())
}

fn show_chord(symbol: &str) -> Result<()> {
    let chord = Chord::from_symbol(symbol, 4)?;
    let notes: Vec<String> = chord.notes().iter().map(|n| n.full_name()).collect();
    println!("{}: {}", chord.symbol(), notes.join(" "));
    println!("MIDI: {:?}", chord.midi_numbers());
    Ok(())
}

fn show_roman(numeral: &str, key: &str, scale_type: &str) -> Result<()> {
    let info = ScaleInfo::from_key(key, scale_type)?;
    let roman: RomanNumeral = numeral.parse()?;
    let chord = roman.to_chord(&info)?;
    let notes: Vec<String> = chord.notes().iter().map(|n| n.full_name()).collect();
    println!("{} in {}: {} ({})", roman, info, chord.symbol(), notes.join(" "));
    Ok(())
}

fn show_progression(source: &str, key: &str, scale_type: &str, length: usize) -> Result<()> {
    let info = ScaleInfo::from_key(key, scale_type)?;
    let generator = ChordProgressionGenerator::new(info);
    let progression = if presets::progression_preset(source).is_some() {
        generator.generate_preset(source)?
    } else {
        generator.generate_genre(source, length)?
    };
    info!(name = progression.name(), key = %info, chords = progression.len(), "generated progression");

    let symbols: Vec<String> = progression.chords().iter().map(|c| c.symbol()).collect();
    let numerals: Vec<String> = progression.roman_numerals()?.iter().map(|r| r.to_string()).collect();
    println!("{} in {}", progression.name(), info);
    println!("Chords:   {}", symbols.join(" | "));
    println!("Numerals: {}", numerals.join(" | "));
    if let Some(complexity) = progression.complexity() {
        println!("Complexity: {:.2}", complexity);
    }
    Ok(())
}

fn generate(path: &str) -> Result<()> {
    let session = SessionFile::load(path)?;
    info!(session = %session.session.name, "loaded session");
    let generated = session.generate()?;
    info!(
        events = generated.sequence.len(),
        skipped = generated.skipped.len(),
        violations = generated.report.violations.len(),
        "generation complete"
    );
    for violation in &generated.report.violations {
        eprintln!("{} at beat {}: {}", violation.rule, violation.position, violation.message);
    }
    let yaml = serde_yaml::to_string(&generated.sequence).context("Failed to serialize sequence")?;
    print!("{}", yaml);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("notegen - Music theory and note sequence generator");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--scale" => {
            let rest = require(&args, 2, "--scale", "a root and a scale type")?;
            show_scale(&rest[0], &rest[1])?;
        }
        "--chord" => {
            let rest = require(&args, 1, "--chord", "a chord symbol")?;
            show_chord(&rest[0])?;
        }
        "--roman" => {
            let rest = require(&args, 3, "--roman", "a numeral, a key and a scale type")?;
            show_roman(&rest[0], &rest[1], &rest[2])?;
        }
        "--progression" => {
            let rest = require(&args, 3, "--progression", "a genre or preset, a key and a scale type")?;
            let length = match rest.get(3) {
                Some(len) => len.parse().map_err(|_| anyhow!("Invalid progression length: {}", len))?,
                None => 4,
            };
            show_progression(&rest[0], &rest[1], &rest[2], length)?;
        }
        "--generate" => {
            let rest = require(&args, 1, "--generate", "a session file")?;
            generate(&rest[0])?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
