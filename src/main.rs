mod config;
mod logging;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use config::RunConfig;
use midi_to_ticks::TimingMode;
use tick_core::codec;

#[derive(Parser, Debug)]
#[command(name = "tickscribe")]
#[command(about = "Convert MIDI files and notation event lists to [MIDI:...] training strings", long_about = None)]
struct Cli {
    /// JSON run configuration; command-line flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress informational messages (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a MIDI file
    Midi {
        /// Path to the MIDI file (default: uses first .mid file in current directory)
        file: Option<PathBuf>,

        /// How note times are read from the file
        #[arg(long, value_enum)]
        timing: Option<TimingArg>,

        /// Tempo for converting elapsed seconds to ticks in seconds timing
        #[arg(long)]
        seconds_bpm: Option<f64>,

        #[command(flatten)]
        conversion: ConversionArgs,
    },
    /// Convert a notation event list (`-` reads stdin)
    Notation {
        /// Path to the notation text
        file: Option<PathBuf>,

        /// Ticks per beat of the event list positions
        #[arg(long)]
        source_ticks_per_beat: Option<u32>,

        #[command(flatten)]
        conversion: ConversionArgs,
    },
    /// Decode a [MIDI:...] string and print it as JSON
    Decode {
        /// The wrapped string
        payload: String,
    },
    /// Find every [MIDI:...] string in a text file (`-` reads stdin) and print them as JSON
    Extract {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConversionArgs {
    /// Description written after the notes
    #[arg(short, long)]
    label: Option<String>,

    /// Playback tempo written after the label (implies --include-tempo)
    #[arg(short, long)]
    tempo: Option<f64>,

    /// Append the source tempo after the label
    #[arg(long)]
    include_tempo: bool,

    /// Semitones added to every pitch (e.g. 12 for an octave up)
    #[arg(long, allow_hyphen_values = true)]
    transpose: Option<i32>,

    /// Keep only notes starting within this many seconds
    #[arg(short, long)]
    window_seconds: Option<f64>,

    /// Keep only the first N chord groups
    #[arg(short, long)]
    max_groups: Option<usize>,

    /// Ticks within which note starts count as one chord
    #[arg(long)]
    chord_tolerance: Option<u64>,

    /// Keep notes whose duration is zero or negative
    #[arg(long)]
    keep_zero_duration: bool,

    /// Resolution of the output timeline
    #[arg(long)]
    ticks_per_beat: Option<u32>,
}

impl ConversionArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(label) = &self.label {
            config.label = label.clone();
        }
        if let Some(tempo) = self.tempo {
            config.tempo_bpm = Some(tempo);
            config.include_tempo = true;
        }
        if self.include_tempo {
            config.include_tempo = true;
        }
        if let Some(transpose) = self.transpose {
            config.transpose = transpose;
        }
        if let Some(seconds) = self.window_seconds {
            config.window_seconds = Some(seconds);
        }
        if let Some(groups) = self.max_groups {
            config.max_groups = Some(groups);
        }
        if let Some(tolerance) = self.chord_tolerance {
            config.chord_tolerance = tolerance;
        }
        if self.keep_zero_duration {
            config.drop_zero_duration = false;
        }
        if let Some(tpb) = self.ticks_per_beat {
            config.target_ticks_per_beat = tpb;
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TimingArg {
    /// Raw delta ticks, rescaled to the output resolution
    Ticks,
    /// Elapsed seconds through the tempo map, converted at --seconds-bpm
    Seconds,
}

impl From<TimingArg> for TimingMode {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Ticks => TimingMode::Ticks,
            TimingArg::Seconds => TimingMode::Seconds,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.quiet, cli.verbose);

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Commands::Midi {
            file,
            timing,
            seconds_bpm,
            conversion,
        } => {
            conversion.apply(&mut config);
            if let Some(timing) = timing {
                config.timing = timing.into();
            }
            if let Some(bpm) = seconds_bpm {
                config.seconds_bpm = bpm;
            }
            config.validate()?;

            // Find MIDI file
            let midi_path = match file.or_else(|| config.source.clone()) {
                Some(path) => {
                    if !path.exists() {
                        anyhow::bail!("MIDI file not found: {}", path.display());
                    }
                    path
                }
                None => find_first_midi_file()?,
            };

            let payload = pipeline::convert_midi(&config, &midi_path)?;
            println!("{}", payload.encode());
        }
        Commands::Notation {
            file,
            source_ticks_per_beat,
            conversion,
        } => {
            conversion.apply(&mut config);
            if let Some(tpb) = source_ticks_per_beat {
                config.source_ticks_per_beat = tpb;
            }
            config.validate()?;

            let path = file
                .or_else(|| config.source.clone())
                .context("No notation file given (pass a path or `-` for stdin)")?;
            let text = read_input(&path)?;

            let payload = pipeline::convert_notation(&config, &text)?;
            println!("{}", payload.encode());
        }
        Commands::Decode { payload } => {
            let decoded = codec::decode(&payload)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        Commands::Extract { file } => {
            let text = read_input(&file)?;
            let found: Vec<_> = codec::extract(&text)
                .into_iter()
                .map(|extracted| extracted.payload)
                .collect();
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn find_first_midi_file() -> Result<PathBuf> {
    let entries = fs::read_dir(".").context("Failed to read current directory")?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) == Some("mid") {
            return Ok(path);
        }
    }

    anyhow::bail!("No MIDI files found in current directory")
}
