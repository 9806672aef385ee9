use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tenebra::{
    AudioHost, Clock, CommandNarrator, CpuPainter, ManualClock, Painter as _, PcmCapture,
    PlaybackController, PlaybackOpts, RecordingHost, Sequence, SessionEvent, SharedNarrator,
    SilentNarrator, SynthHost, SynthOpts, SystemClock, TimeMs, TranscriptNarrator, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "tenebra", version)]
struct Cli {
    /// Sequence JSON to play instead of the built-in one.
    #[arg(long, global = true)]
    sequence: Option<PathBuf>,

    /// More logging (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Play a full session.
    Play(PlayArgs),
    /// Dry-run a session and print the audio and narration schedule as JSON lines.
    Schedule(ScheduleArgs),
    /// Print the effective sequence as JSON.
    Sequence,
}

#[derive(Parser, Debug)]
struct ViewArgs {
    /// Viewport width in CSS pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Viewport height in CSS pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Device pixel ratio (capped at 2).
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Seed for grain and noise.
    #[arg(long)]
    seed: Option<u64>,
}

impl ViewArgs {
    fn opts(&self) -> PlaybackOpts {
        let defaults = PlaybackOpts::default();
        PlaybackOpts {
            viewport: Viewport::new(self.width, self.height).with_dpr(self.dpr),
            seed: self.seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Elapsed time in milliseconds.
    #[arg(long)]
    at: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Follow the system clock instead of simulating time.
    #[arg(long)]
    realtime: bool,

    /// Frame interval in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Directory for PNG snapshots.
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Snapshot interval in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    snapshot_every: u64,

    /// Capture the synthesized master bus as stereo f32le.
    #[arg(long)]
    audio_out: Option<PathBuf>,

    /// Speech backend.
    #[arg(long, value_enum, default_value_t = SpeechChoice::Transcript)]
    speech: SpeechChoice,

    /// Replays after the first run.
    #[arg(long, default_value_t = 0)]
    replays: u32,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// Simulation step in milliseconds.
    #[arg(long, default_value_t = 10)]
    step_ms: u64,

    /// Seed for noise buffers.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpeechChoice {
    Off,
    Transcript,
    Espeak,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let sequence = load_sequence(cli.sequence.as_deref())?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(sequence, args),
        Command::Play(args) => cmd_play(sequence, args),
        Command::Schedule(args) => cmd_schedule(sequence, args),
        Command::Sequence => {
            println!("{}", sequence.to_json_pretty()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_sequence(path: Option<&Path>) -> anyhow::Result<Sequence> {
    let sequence = match path {
        Some(p) => Sequence::from_path(p)
            .with_context(|| format!("load sequence '{}'", p.display()))?,
        None => Sequence::house_that_remembers()?,
    };
    Ok(sequence)
}

fn cmd_frame(sequence: Sequence, args: FrameArgs) -> anyhow::Result<()> {
    let clock = ManualClock::new(TimeMs::ZERO);
    let mut ctl = PlaybackController::new(
        clock.clone(),
        sequence,
        Box::new(tenebra::NullHost),
        tenebra::shared(SilentNarrator),
        args.view.opts(),
    )?;
    ctl.start()?;
    clock.set(TimeMs(args.at));

    let surface = ctl.surface();
    let mut painter = CpuPainter::new(surface.width, surface.height)?;
    let report = ctl.frame(&mut painter).context("frame loop did not run")?;
    let frame = painter.finish();
    tenebra::write_png(&frame, &args.out)?;
    ctl.stop();

    eprintln!(
        "scene: {}",
        report.scene.map_or("(blank)", |k| k.name())
    );
    if let Some(caption) = &report.subtitle {
        eprintln!("subtitle: {caption}");
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn make_narrator(choice: SpeechChoice) -> SharedNarrator {
    match choice {
        SpeechChoice::Off => tenebra::shared(SilentNarrator),
        SpeechChoice::Transcript => tenebra::shared(TranscriptNarrator::new()),
        SpeechChoice::Espeak => tenebra::shared(CommandNarrator::detect()),
    }
}

fn cmd_play(sequence: Sequence, args: PlayArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.frame_ms > 0, "--frame-ms must be > 0");
    anyhow::ensure!(args.snapshot_every > 0, "--snapshot-every must be > 0");

    let capture = args.audio_out.as_ref().map(|_| PcmCapture::new());
    let host: Box<dyn AudioHost> = Box::new(SynthHost::new(SynthOpts {
        capture: capture.clone(),
        ..SynthOpts::default()
    }));
    let narrator = make_narrator(args.speech);
    let opts = args.view.opts();
    let frame_step = TimeMs(args.frame_ms);

    if args.realtime {
        let ctl = PlaybackController::new(SystemClock::new(), sequence, host, narrator, opts)?;
        let wait = Duration::from_millis(args.frame_ms);
        run_session(ctl, &args, true, || std::thread::sleep(wait))?;
    } else {
        let clock = ManualClock::new(TimeMs::ZERO);
        let ctl = PlaybackController::new(clock.clone(), sequence, host, narrator, opts)?;
        run_session(ctl, &args, false, || clock.advance(frame_step))?;
    }

    if let (Some(path), Some(capture)) = (&args.audio_out, &capture) {
        capture.write_stereo_f32le(path)?;
        eprintln!(
            "wrote {} ({} Hz stereo f32le, {} frames)",
            path.display(),
            tenebra::MIX_SAMPLE_RATE,
            capture.len()
        );
    }
    Ok(())
}

fn run_session<C: Clock>(
    mut ctl: PlaybackController<C>,
    args: &PlayArgs,
    rasterize_every_frame: bool,
    mut wait: impl FnMut(),
) -> anyhow::Result<()> {
    let surface = ctl.surface();
    let mut painter = CpuPainter::new(surface.width, surface.height)?;
    let done_at = ctl
        .sequence()
        .total()
        .saturating_add(ctl.opts().teardown_grace);

    for run in 0..=args.replays {
        if run == 0 {
            ctl.start()?;
        } else {
            ctl.replay()?;
        }
        let generation = ctl.session().generation();
        let mut next_snapshot = TimeMs::ZERO;
        let mut caption: Option<String> = None;
        let mut frames = 0u64;

        loop {
            wait();
            let Some(elapsed) = ctl.tick() else {
                break;
            };
            let surface = ctl.surface();
            if painter.size() != (surface.width, surface.height) {
                painter.resize(surface.width, surface.height)?;
            } else {
                painter.begin_frame();
            }
            let Some(report) = ctl.frame(&mut painter) else {
                break;
            };
            frames += 1;

            if report.subtitle != caption {
                if let Some(text) = &report.subtitle {
                    println!("[{}] {text}", format_clock(report.elapsed));
                }
                caption = report.subtitle.clone();
            }

            let snapshot_due = args.snapshots.is_some() && report.elapsed >= next_snapshot;
            if snapshot_due || rasterize_every_frame {
                let frame = painter.finish();
                if snapshot_due && let Some(dir) = &args.snapshots {
                    let path = dir.join(format!(
                        "run{generation:02}_{:06}.png",
                        report.elapsed.0
                    ));
                    tenebra::write_png(&frame, &path)?;
                    tracing::info!(path = %path.display(), "snapshot");
                    next_snapshot = report
                        .elapsed
                        .saturating_add(TimeMs(args.snapshot_every));
                }
            }

            for event in ctl.drain_events() {
                log_event(&event);
            }
            if elapsed >= done_at && !ctl.session().holds_live_handles() {
                break;
            }
        }
        eprintln!("run {generation}: {frames} frames");
    }

    ctl.stop();
    for event in ctl.drain_events() {
        log_event(&event);
    }
    Ok(())
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::AudioUnavailable { reason } | SessionEvent::NarrationUnavailable { reason } => {
            tracing::warn!(?event, "{reason}");
        }
        _ => tracing::info!(?event, "session event"),
    }
}

fn format_clock(t: TimeMs) -> String {
    format!("{:02}:{:02}.{:03}", t.0 / 60_000, (t.0 / 1_000) % 60, t.0 % 1_000)
}

fn cmd_schedule(sequence: Sequence, args: ScheduleArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.step_ms > 0, "--step-ms must be > 0");

    let clock = ManualClock::new(TimeMs::ZERO);
    let host = RecordingHost::new();
    let log = host.log();
    let narrator = TranscriptNarrator::new();
    let transcript = narrator.transcript();
    let defaults = PlaybackOpts::default();
    let opts = PlaybackOpts {
        seed: args.seed.unwrap_or(defaults.seed),
        ..defaults
    };
    let mut ctl = PlaybackController::new(
        clock.clone(),
        sequence,
        Box::new(host),
        tenebra::shared(narrator),
        opts,
    )?;

    ctl.start()?;
    let mut events = ctl.drain_events();
    while ctl.session().holds_live_handles() {
        clock.advance(TimeMs(args.step_ms));
        if ctl.tick().is_none() {
            break;
        }
        events.extend(ctl.drain_events());
    }
    ctl.stop();
    events.extend(ctl.drain_events());

    for record in log.records() {
        let line = serde_json::json!({ "source": "audio", "record": record });
        println!("{line}");
    }
    for entry in transcript.entries() {
        let line = serde_json::json!({ "source": "narration", "entry": entry });
        println!("{line}");
    }
    for event in events {
        let line = serde_json::json!({ "source": "session", "event": event });
        println!("{line}");
    }
    Ok(())
}
