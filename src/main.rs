//! `dfx-player` CLI: load a drum font, play it against an output device,
//! or run the font/sample-file debug tools (SPEC_FULL.md ambient CLI
//! section). Grounded on the teacher's `main.rs` for subscriber setup
//! and argument-parsing shape.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dfx_player::audio::output::AudioOutput;
use dfx_player::audio::soundfile::{ScaleCode, SoundFile};
use dfx_player::config::Config;
use dfx_player::error::{DfxError, Result};
use dfx_player::font::{parse, validate};
use dfx_player::kit::build as build_kit;
use dfx_player::playback::callback::PlaybackCallback;
use dfx_player::playback::midi::midi_queue;
use dfx_player::playback::PolyDrummer;

#[derive(Parser, Debug)]
#[command(name = "dfx-player")]
#[command(about = "Real-time multi-layered drum sample player")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the bootstrap TOML config.
    #[arg(short, long, default_value = "dfx-player.toml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the font, open the output device, and play until interrupted.
    Play {
        /// Drum-font path override.
        #[arg(short, long)]
        font: Option<PathBuf>,

        /// Output device name override.
        #[arg(short, long)]
        device: Option<String>,

        /// Polyphony override.
        #[arg(short, long)]
        polyphony: Option<usize>,

        /// Robin scale code override: load robins at raw scale (true) or
        /// normalize by each robin's declared peak (false).
        #[arg(long)]
        au_naturale: Option<bool>,
    },
    /// Parse and validate a font file; report every accumulated error.
    Validate {
        /// Drum-font path.
        font: PathBuf,
    },
    /// Print channel count, frame count, rate, peak, and windowed RMS of
    /// a sample file.
    Inspect {
        /// Sample file path (WAV/AIFF/AU, auto-detected).
        wav_path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dfx_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Play { font: None, device: None, polyphony: None, au_naturale: None }) {
        Command::Play { font, device, polyphony, au_naturale } => {
            run_play(&args.config, font, device, polyphony, au_naturale)
        }
        Command::Validate { font } => run_validate(&font),
        Command::Inspect { wav_path } => run_inspect(&wav_path),
    }
}

fn run_play(
    config_path: &PathBuf,
    font_override: Option<PathBuf>,
    device_override: Option<String>,
    polyphony_override: Option<usize>,
    au_naturale_override: Option<bool>,
) -> Result<()> {
    let config = Config::load(config_path, font_override, device_override, polyphony_override, au_naturale_override)?;
    info!(font = %config.font_path.display(), "loading drum font");

    let font_dir = config.font_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let src = std::fs::read_to_string(&config.font_path)?;
    let mut tree = parse(&src)?;
    let log = validate(&mut tree, font_dir);
    if !log.is_ok() {
        for err in &log.errors {
            error!("{err}");
        }
        return Err(DfxError::Config(format!("font failed validation with {} error(s)", log.errors.len())));
    }

    let mut output = AudioOutput::open(config.output_device.as_deref(), config.output_rate)?;
    let output_rate = output.sample_rate() as f64;

    let drum_font = build_kit(&tree, font_dir, output_rate, config.au_naturale)?;
    let kit = drum_font
        .kits
        .into_iter()
        .next()
        .ok_or_else(|| DfxError::Config("font contains no kits".into()))?;
    info!(kit = %kit.name, polyphony = config.polyphony, "kit built");

    let drummer = PolyDrummer::new(kit, config.polyphony);
    let (_midi_in, midi_out) = midi_queue(256);
    let mut callback = PlaybackCallback::new(drummer, midi_out);
    callback.attenuation = config.attenuation_gain();

    output.start(callback)?;
    info!("stream started; press enter to stop");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
    output.stop();

    Ok(())
}

fn run_validate(font_path: &PathBuf) -> Result<()> {
    let font_dir = font_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let src = std::fs::read_to_string(font_path)?;
    let mut tree = parse(&src)?;
    let log = validate(&mut tree, font_dir);

    if log.is_ok() {
        println!("{}: valid", font_path.display());
        return Ok(());
    }

    for err in &log.errors {
        println!("{err}");
    }
    std::process::exit(1);
}

fn run_inspect(wav_path: &PathBuf) -> Result<()> {
    let mut sf = SoundFile::open(wav_path)?;
    let frame_count = sf.frame_count();
    let buffer = sf.read(0, frame_count, ScaleCode::FullScale)?;

    println!("path:        {}", wav_path.display());
    println!("channels:    {}", sf.channels());
    println!("frame_count: {}", frame_count);
    println!("rate:        {} Hz", sf.rate());
    println!("peak:        {:.6}", buffer.find_max(0.0));
    println!("windowed_rms:{:.6}", buffer.windowed_rms());

    Ok(())
}
