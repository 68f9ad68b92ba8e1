//! ps2snd command-line tool
//!
//! Inspects PS2 HD/BD sound banks, renders single tones to WAV, exports the
//! instrument model and traces SPU ADSR envelopes.

mod args;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use args::{CliArgs, Command};
use ps2snd::bank_loader::load_bank_pair;
use ps2snd::envelope::{simulate_timecents, AdsrPhase, HardwareAdsr, MAX_SIMULATION_SECONDS, REFERENCE_SAMPLE_RATE};
use ps2snd::export::json::JsonWriter;
use ps2snd::export::{export_bank, sustain_attenuation, ExportOptions};
use ps2snd::{Bank, Tone};

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn attack_mode(tone: &Tone) -> &'static str {
    if tone.attack_exponential() {
        "exponential"
    } else {
        "linear"
    }
}

fn print_tone_line(index: usize, tone: &Tone) {
    println!(
        "  [{:2}] keys {:3}-{:3}  root {:3}  fine {:4}  vol {:3}  pan {:3}  ADSR {:04X}/{:04X}  VAG 0x{:08X} @ {} Hz{}",
        index,
        tone.min_note,
        tone.max_note,
        tone.root_key,
        tone.pitch_fine,
        tone.volume,
        tone.pan,
        tone.adsr1,
        tone.adsr2,
        tone.bd_offset,
        tone.sample_rate,
        if tone.reverb_enabled { "  reverb" } else { "" }
    );
}

fn print_bank(bank: &Bank) {
    println!(
        "{} programs, {} tones",
        bank.programs.len(),
        bank.tone_count()
    );
    for program in &bank.programs {
        println!(
            "{} (id {}): {} tones, master vol {}, master pan {}{}",
            program.name,
            program.id,
            program.tones.len(),
            program.master_vol,
            program.master_pan,
            if program.is_layered { ", layered" } else { "" }
        );
        for (index, tone) in program.tones.iter().enumerate() {
            print_tone_line(index, tone);
        }
    }
}

fn run_info(hd: &Path, bd: Option<&Path>) -> Result<()> {
    let (bank, bd) = load_bank_pair(hd, bd)
        .with_context(|| format!("Failed to load bank {}", hd.display()))?;
    println!("BD data: {} bytes", bd.len());
    print_bank(&bank);
    Ok(())
}

fn run_tone(
    hd: &Path,
    bd: Option<&Path>,
    program_id: u32,
    tone_index: usize,
    wav: Option<&Path>,
    loops: u32,
) -> Result<()> {
    let (bank, bd) = load_bank_pair(hd, bd)
        .with_context(|| format!("Failed to load bank {}", hd.display()))?;
    let program = bank
        .program(program_id)
        .with_context(|| format!("No program with id {}", program_id))?;
    let tone = program.tones.get(tone_index).with_context(|| {
        format!(
            "{} has {} tones, no tone {}",
            program.name,
            program.tones.len(),
            tone_index
        )
    })?;

    let decoded = bd.decode_tone(tone);
    let reg = tone.adsr_register();

    println!("{} tone {}", program.name, tone_index);
    println!("  Key range:      {}-{}", tone.min_note, tone.max_note);
    println!("  Root key:       {}", tone.root_key);
    println!("  Fine pitch:     {}", tone.pitch_fine);
    println!("  Volume:         {}", tone.volume);
    println!("  Pan:            {}", tone.pan);
    println!("  ADSR1:          0x{:04X}", tone.adsr1);
    println!("  ADSR2:          0x{:04X}", tone.adsr2);
    println!("  Attack mode:    {}", attack_mode(tone));
    println!("  Sustain level:  {}", tone.sustain_level());
    println!("  VAG offset:     0x{:08X}", tone.bd_offset);
    println!("  Sample rate:    {} Hz", tone.sample_rate);
    println!("  Reverb:         {}", if tone.reverb_enabled { "yes" } else { "no" });
    println!(
        "  Samples:        {} ({:.3} s)",
        decoded.len(),
        decoded.duration_secs()
    );
    println!("  Looping:        {}", if decoded.looping { "yes" } else { "no" });
    if decoded.looping {
        println!("  Loop start:     {}", decoded.loop_start);
        println!("  Loop end:       {}", decoded.loop_end);
    }
    println!(
        "  Envelope (tc):  attack {}  decay {}  release {}  sustain {} cB",
        simulate_timecents(reg, AdsrPhase::Attack),
        simulate_timecents(reg, AdsrPhase::Decay),
        simulate_timecents(reg, AdsrPhase::Release),
        sustain_attenuation(reg)
    );

    if let Some(path) = wav {
        write_tone_wav(&decoded, path, loops)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "export-wav")]
fn write_tone_wav(decoded: &ps2snd::DecodedSample, path: &Path, loops: u32) -> Result<()> {
    ps2snd::export::wav::export_tone_to_wav(decoded, path, loops)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(not(feature = "export-wav"))]
fn write_tone_wav(_decoded: &ps2snd::DecodedSample, _path: &Path, _loops: u32) -> Result<()> {
    anyhow::bail!("WAV output requires the \"export-wav\" feature. Rebuild with `--features export-wav`.")
}

fn run_export(
    hd: &Path,
    bd: Option<&Path>,
    output: &Path,
    bank_name: Option<String>,
    pretty: bool,
) -> Result<()> {
    let (bank, bd) = load_bank_pair(hd, bd)
        .with_context(|| format!("Failed to load bank {}", hd.display()))?;

    let mut options = ExportOptions::new();
    if let Some(name) = bank_name {
        options = options.bank_name(name);
    }

    let mut writer = JsonWriter::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?
        .pretty(pretty);
    let model = export_bank(&bank, &bd, &options, &mut writer)
        .with_context(|| format!("Failed to export to {}", output.display()))?;

    let zones: usize = model.instruments.iter().map(|i| i.zones.len()).sum();
    println!(
        "Exported {} instruments, {} zones, {} samples to {}",
        model.instruments.len(),
        zones,
        model.samples.len(),
        output.display()
    );
    Ok(())
}

/// Key on, key off at `release_at` and sample the level every `step` samples
///
/// The sample that reaches Off is always included, once.
fn trace_envelope(adsr: &mut HardwareAdsr, release_at: u32, step: u32) -> Vec<(u32, AdsrPhase, i16)> {
    let limit = release_at.saturating_add(REFERENCE_SAMPLE_RATE * MAX_SIMULATION_SECONDS);
    let mut rows = Vec::new();
    adsr.key_on();
    for sample in 0..limit {
        if sample == release_at {
            adsr.key_off();
        }
        let level = adsr.tick();
        let on_grid = sample % step == 0;
        if on_grid {
            rows.push((sample, adsr.phase(), level));
        }
        if adsr.phase() == AdsrPhase::Off {
            if !on_grid {
                rows.push((sample, AdsrPhase::Off, 0));
            }
            break;
        }
    }
    rows
}

fn run_envelope(adsr1: u16, adsr2: u16, release_at: u32, step: u32) -> Result<()> {
    let mut adsr = HardwareAdsr::from_pair(adsr1, adsr2);
    let reg = adsr.register();
    println!("ADSR 0x{:08X}", reg);
    for phase in [AdsrPhase::Attack, AdsrPhase::Decay, AdsrPhase::Release] {
        println!("  {:8} {} tc", phase.to_string(), simulate_timecents(reg, phase));
    }
    println!("  sustain  {} cB", sustain_attenuation(reg));

    println!("{:>8}  {:8}  {:>6}", "sample", "phase", "level");
    for (sample, phase, level) in trace_envelope(&mut adsr, release_at, step) {
        println!("{:>8}  {:8}  {:>6}", sample, phase.to_string(), level);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Info { hd, bd } => run_info(&hd, bd.as_deref()),
        Command::Tone {
            hd,
            program,
            tone,
            bd,
            wav,
            loops,
        } => run_tone(&hd, bd.as_deref(), program, tone, wav.as_deref(), loops),
        Command::Export {
            hd,
            output,
            bd,
            bank_name,
            pretty,
        } => run_export(&hd, bd.as_deref(), &output, bank_name, pretty),
        Command::Envelope {
            adsr1,
            adsr2,
            release_at,
            step,
        } => run_envelope(adsr1, adsr2, release_at, step),
    }
}
