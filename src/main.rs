use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wavmark::config::{Config, MetadataMode};
use wavmark::markers::{marker_spans, OratureCueType};
use wavmark::wav::{WavFile, WavMetadata, WavStreamWriter, WavType};
use wavmark::{parse_biblical_reference, OratureAudioFile};

#[derive(Parser)]
#[command(name = "wavmark")]
#[command(version, about = "Inspect and edit verse markers embedded in WAV files")]
#[command(long_about = "Read and write the cue/label chunks that store book, chapter, chunk and verse markers inside WAV recordings.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the audio format and header layout
    Info { file: PathBuf },

    /// List the cues stored in the file
    Cues {
        file: PathBuf,

        /// Show labels exactly as stored, without verse normalization
        #[arg(long)]
        raw: bool,
    },

    /// List typed markers with the frames they cover
    Markers {
        file: PathBuf,

        /// Print markers as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a cue and write it back to the file
    Add {
        file: PathBuf,

        /// Frame offset of the cue
        #[arg(long)]
        location: u32,

        /// Cue label, e.g. orature-vm-3
        #[arg(long)]
        label: String,
    },

    /// Remove all markers of one kind: verse, chunk, chapter, book, unknown
    Clear {
        file: PathBuf,

        #[arg(long)]
        kind: String,
    },

    /// Convert a scripture reference such as "MAT 1:3-5" into a cue label
    Reference { text: String },

    /// Write a silent WAV file using the configured format
    Create {
        file: PathBuf,

        /// Length of silence in seconds
        #[arg(long, default_value = "0")]
        seconds: f64,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

fn silent_bytes(config: &Config, seconds: f64) -> usize {
    let frame_size = config.channels as usize * (config.bits_per_sample as usize / 8);
    let frames = (seconds.max(0.0) * config.sample_rate as f64).round() as usize;
    frames * frame_size
}

fn print_info(path: &Path) -> Result<()> {
    let wav = WavFile::open_with_metadata(path, WavMetadata::cues())
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let kind = match wav.wav_type() {
        WavType::Normal => "normal",
        WavType::ExtendedHeader => "extended",
    };

    println!("\n{}", style("═══ WAV ═══").bold());
    println!("  File:          {}", style(path.display()).cyan());
    println!("  Header:        {} ({} bytes)", kind, wav.header_size());
    println!("  Sample rate:   {} Hz", wav.sample_rate());
    println!("  Channels:      {}", wav.channels());
    println!("  Bit depth:     {}", wav.bits_per_sample());
    println!("  Audio length:  {} bytes", wav.total_audio_length());
    println!("  Frames:        {}", wav.total_frames());
    println!("  Cues:          {}", wav.cues().len());
    Ok(())
}

fn print_cues(path: &Path, mode: MetadataMode) -> Result<()> {
    let wav = WavFile::open_with_metadata(path, mode.metadata())
        .with_context(|| format!("Failed to open {}", path.display()))?;

    println!("\n{}", style(format!("═══ Cues ({}) ═══", mode)).bold());
    let mut cues = wav.cues();
    cues.sort_by_key(|c| c.location);
    for cue in cues {
        println!("  {:>10}  {}", cue.location, style(&cue.label).cyan());
    }
    Ok(())
}

fn print_markers(path: &Path, json: bool) -> Result<()> {
    let audio = OratureAudioFile::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spans = marker_spans(&audio.all_markers(), audio.total_frames());

    if json {
        println!("{}", serde_json::to_string_pretty(&spans)?);
        return Ok(());
    }

    println!("\n{}", style("═══ Markers ═══").bold());
    for span in spans {
        println!(
            "  {:>10} - {:<10}  {:<8} {}",
            span.start,
            span.end,
            span.marker.cue_type(),
            style(span.marker.formatted_label()).cyan()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    match cli.command {
        Command::Info { file } => {
            ensure_exists(&file)?;
            print_info(&file)?;
        }
        Command::Cues { file, raw } => {
            ensure_exists(&file)?;
            let mode = if raw {
                MetadataMode::Cue
            } else {
                config.metadata_mode
            };
            print_cues(&file, mode)?;
        }
        Command::Markers { file, json } => {
            ensure_exists(&file)?;
            print_markers(&file, json)?;
        }
        Command::Add {
            file,
            location,
            label,
        } => {
            ensure_exists(&file)?;
            let mut audio = OratureAudioFile::open_with_metadata(&file, config.metadata_mode.metadata())
                .with_context(|| format!("Failed to open {}", file.display()))?;
            if location > audio.total_frames() {
                anyhow::bail!(
                    "Location {} is past the end of the audio ({} frames)",
                    location,
                    audio.total_frames()
                );
            }
            audio.add_cue(location, label.clone());
            audio.update().context("Failed to write markers")?;
            println!("{} Added {} at frame {}", style("✓").green(), style(&label).cyan(), location);
        }
        Command::Clear { file, kind } => {
            ensure_exists(&file)?;
            let kind: OratureCueType = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut audio = OratureAudioFile::open_with_metadata(&file, config.metadata_mode.metadata())
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let removed = audio.markers(kind).len();
            audio.clear_markers_of_type(kind);
            audio.update().context("Failed to write markers")?;
            println!("{} Removed {} {} markers", style("✓").green(), removed, kind);
        }
        Command::Reference { text } => {
            println!("{}", parse_biblical_reference(&text));
        }
        Command::Create { file, seconds } => {
            let mut wav = WavFile::create(
                &file,
                config.channels,
                config.sample_rate,
                config.bits_per_sample,
                config.metadata_mode.metadata(),
            )
            .with_context(|| format!("Failed to create {}", file.display()))?;

            let bytes = silent_bytes(&config, seconds);
            let mut writer = WavStreamWriter::new(&mut wav, false)?;
            writer.write_pcm(&vec![0u8; bytes])?;
            writer.close().context("Failed to finish writing audio")?;

            info!("Created {} with {} frames", file.display(), wav.total_frames());
        }
    }

    Ok(())
}
