use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use voicerig_core::{
    AudioAsset, ClipFormat, Emotion, EngineConfig, NullOutput, OutputBackend, RigEngine, RigError,
    SnapshotHandle, SurfaceFrame, VisualSurface,
};

mod speaker;

use speaker::CpalOutput;

fn main() -> voicerig_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Animate {
            input,
            seconds,
            fps,
            volume,
            emotion,
            mute,
            json,
        } => run_animate(&input, seconds, fps, volume, &emotion, mute, json),
        Commands::Export {
            input,
            output,
            format,
            width,
            height,
        } => run_export(&input, &output, format, width, height),
    }
}

/// Plays an audio file through the engine, printing the animation stream.
fn run_animate(
    input: &PathBuf,
    seconds: Option<f64>,
    fps: u32,
    volume: f32,
    emotions: &[String],
    mute: bool,
    json: bool,
) -> voicerig_core::Result<()> {
    tracing::info!(?input, mute, "starting animate mode");

    let asset = AudioAsset::decode(std::fs::read(input)?)?;
    let output: Box<dyn OutputBackend> = if mute {
        Box::new(NullOutput)
    } else {
        Box::new(CpalOutput::new())
    };

    let mut engine = RigEngine::new(EngineConfig::default(), output);
    for spec in emotions {
        let (emotion, value) = parse_emotion(spec)?;
        engine.set_emotion(emotion, value);
    }
    engine.set_volume(volume);
    engine.load_asset(asset)?;
    engine.play()?;

    let fps = fps.max(1);
    let frame = Duration::from_secs_f64(1.0 / fps as f64);
    let started = Instant::now();
    let mut frames: u64 = 0;

    loop {
        let now = started.elapsed().as_secs_f64();
        if seconds.map(|limit| now >= limit).unwrap_or(false) {
            break;
        }

        let snapshot = engine.tick(now);
        if json {
            println!(
                "{}",
                serde_json::to_string(&snapshot)
                    .map_err(|e| RigError::msg(format!("could not serialize snapshot: {e}")))?
            );
        } else if frames % fps as u64 == 0 {
            println!(
                "t={now:6.2}s mouth={:.2} blink={:.2} wave={:.2} energy={:.2} progress={:.2}",
                snapshot.mouth_open,
                snapshot.blink,
                snapshot.hand_wave,
                snapshot.energy,
                engine.status().playback_progress,
            );
        }
        frames += 1;

        if !engine.status().is_playing {
            break;
        }
        std::thread::sleep(frame);
    }

    tracing::info!(frames, "animate mode finished");
    Ok(())
}

/// Records the engine output for an audio file into a clip on disk.
fn run_export(
    input: &PathBuf,
    output: &PathBuf,
    format: FormatArg,
    width: u32,
    height: u32,
) -> voicerig_core::Result<()> {
    tracing::info!(?input, ?output, "starting export mode");

    let asset = AudioAsset::decode(std::fs::read(input)?)?;
    let mut engine = RigEngine::headless(EngineConfig::default());
    engine.load_asset(asset)?;

    let surface = ParameterSurface::new(engine.snapshot_handle(), width, height);
    engine.export_video(Box::new(surface), format.into())?;

    let started = Instant::now();
    let clip = loop {
        engine.tick(started.elapsed().as_secs_f64());
        if let Some(result) = engine.take_export_result() {
            break result?;
        }
        std::thread::sleep(Duration::from_millis(5));
    };

    std::fs::write(output, &clip.bytes)?;
    tracing::info!(
        path = %output.display(),
        bytes = clip.bytes.len(),
        format = clip.format.extension(),
        "clip written"
    );
    println!("wrote {} ({} bytes)", output.display(), clip.bytes.len());
    Ok(())
}

/// Parses `name=value` emotion assignments from the command line.
fn parse_emotion(spec: &str) -> voicerig_core::Result<(Emotion, f32)> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| RigError::msg(format!("expected name=value, got '{spec}'")))?;
    let emotion = match name.trim().to_ascii_lowercase().as_str() {
        "happy" => Emotion::Happy,
        "sad" => Emotion::Sad,
        "angry" => Emotion::Angry,
        "surprised" => Emotion::Surprised,
        "neutral" => Emotion::Neutral,
        other => return Err(RigError::msg(format!("unknown emotion '{other}'"))),
    };
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| RigError::msg(format!("invalid emotion value in '{spec}'")))?;
    Ok((emotion, value))
}

/// Diagnostic recording surface: fills the frame with a colour that
/// encodes the current animation parameters, so exported video carries a
/// visible signal without a real renderer attached.
struct ParameterSurface {
    handle: SnapshotHandle,
    width: u32,
    height: u32,
}

impl ParameterSurface {
    fn new(handle: SnapshotHandle, width: u32, height: u32) -> Self {
        Self {
            handle,
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl VisualSurface for ParameterSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn capture_frame(&mut self) -> voicerig_core::Result<SurfaceFrame> {
        let snapshot = self.handle.get()?;
        let pixel = [
            (snapshot.mouth_open.clamp(0.0, 1.0) * 255.0) as u8,
            (snapshot.intensity.clamp(0.0, 1.0) * 255.0) as u8,
            ((1.0 - snapshot.blink.clamp(0.0, 1.0)) * 255.0) as u8,
            255,
        ];

        let pixels = (self.width * self.height) as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&pixel);
        }
        Ok(SurfaceFrame {
            width: self.width,
            height: self.height,
            rgba,
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-driven avatar animation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play an audio file and stream animation snapshots to the terminal.
    Animate {
        /// Path to the audio file to animate from.
        input: PathBuf,
        /// Stop after this many seconds instead of at the end of the audio.
        #[arg(long)]
        seconds: Option<f64>,
        /// Animation tick rate.
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// Output volume in [0, 1].
        #[arg(long, default_value_t = 1.0)]
        volume: f32,
        /// Base emotion assignments, e.g. --emotion happy=0.8.
        #[arg(long)]
        emotion: Vec<String>,
        /// Skip speaker output.
        #[arg(long)]
        mute: bool,
        /// Print one JSON snapshot per tick instead of the summary lines.
        #[arg(long)]
        json: bool,
    },
    /// Record the animation for an audio file into a media clip.
    Export {
        /// Path to the audio file to record.
        input: PathBuf,
        /// Output path for the clip.
        output: PathBuf,
        /// Clip container format. wav is built in; webm and mp4 need a
        /// host-provided transcoder.
        #[arg(long, value_enum, default_value_t = FormatArg::Wav)]
        format: FormatArg,
        /// Capture width in pixels.
        #[arg(long, default_value_t = 320)]
        width: u32,
        /// Capture height in pixels.
        #[arg(long, default_value_t = 240)]
        height: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Wav,
    Webm,
    Mp4,
}

impl From<FormatArg> for ClipFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Wav => ClipFormat::Wav,
            FormatArg::Webm => ClipFormat::Webm,
            FormatArg::Mp4 => ClipFormat::Mp4,
        }
    }
}
