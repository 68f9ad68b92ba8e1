//! Command-line argument parsing for the ps2snd CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse a 16-bit register value written in hex (`0x` prefix optional)
fn parse_hex_u16(value: &str) -> Result<u16, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex register '{}': {}", value, e))
}

/// Parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "ps2snd")]
#[command(about = "Inspect and convert PS2 HD/BD sound banks")]
#[command(version)]
pub struct CliArgs {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List programs and tones of a bank
    Info {
        /// HD header file
        hd: PathBuf,

        /// BD data file (defaults to the HD path with a .bd extension)
        #[arg(long)]
        bd: Option<PathBuf>,
    },

    /// Show one tone and optionally render it to WAV
    Tone {
        /// HD header file
        hd: PathBuf,

        /// Program id
        #[arg(short, long)]
        program: u32,

        /// Tone index within the program
        #[arg(short, long)]
        tone: usize,

        /// BD data file (defaults to the HD path with a .bd extension)
        #[arg(long)]
        bd: Option<PathBuf>,

        /// Write the decoded tone to this WAV file
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Extra loop repetitions in the WAV output
        #[arg(long, default_value_t = 0)]
        loops: u32,
    },

    /// Map the bank to instruments and write the model as JSON
    Export {
        /// HD header file
        hd: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// BD data file (defaults to the HD path with a .bd extension)
        #[arg(long)]
        bd: Option<PathBuf>,

        /// Bank name written to the model
        #[arg(long)]
        bank_name: Option<String>,

        /// Pretty print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Trace the ADSR envelope of a register pair
    Envelope {
        /// ADSR1 register (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        adsr1: u16,

        /// ADSR2 register (hex)
        #[arg(long, value_parser = parse_hex_u16)]
        adsr2: u16,

        /// Sample at which key-off happens
        #[arg(long, default_value_t = 44_100)]
        release_at: u32,

        /// Print every Nth sample
        #[arg(long, default_value_t = 1_000, value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,
    },
}
