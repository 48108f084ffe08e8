//! Head pose to MIDI application: reads head pose samples and drives MIDI controllers.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use head_pose_midi::{
    app::TrackingSession,
    calibration::Bound,
    config::{lock_config, Config, SharedConfig},
    constants::DEFAULT_CONFIG_FILE,
    midi::{MidiTransport, NullTransport},
    pose::Axis,
    pose_source::{LinePoseSource, PoseSource},
    sequencer::{CalibrationStep, SequencerEvent},
    wizard::{run_wizard, WizardCommand, WizardOutcome, WizardTiming},
};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("live_action").conflicts_with("calibrate")))]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Compute MIDI values without sending anything
    #[arg(long)]
    no_midi: bool,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// MIDI output port index (overrides the configuration)
    #[arg(short, long)]
    port: Option<usize>,

    /// Create a virtual MIDI port with this name
    #[arg(long, conflicts_with = "port")]
    virtual_port: Option<String>,

    /// Read poses from this file instead of stdin (`pitch yaw roll` per line)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Run the guided calibration while tracking
    #[arg(long)]
    calibrate: bool,

    /// Use the first detected pose as the neutral position
    #[arg(long, group = "live_action")]
    zero: bool,

    /// Use the first detected pose as the lower input bound of an axis
    #[arg(long, value_name = "AXIS", group = "live_action")]
    set_min: Option<Axis>,

    /// Use the first detected pose as the upper input bound of an axis
    #[arg(long, value_name = "AXIS", group = "live_action")]
    set_max: Option<Axis>,

    /// Pose input rate in frames per second (defaults to the camera fps)
    #[arg(long)]
    fps: Option<u32>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{}", head_pose_midi::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    if args.list_ports {
        return list_ports();
    }

    info!("Head Pose to MIDI");

    let config = Config::load_or_default(&args.config);
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;
    let fps = args.fps.unwrap_or(config.camera.fps).max(1);
    let shared = config.into_shared();

    let transport = open_transport(&args, &shared);
    let mut session = TrackingSession::new(Arc::clone(&shared), transport, args.no_midi)?;

    let reader: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => {
            info!("Reading poses from {}", path.display());
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
            ))
        }
        None => {
            info!("Reading poses from stdin");
            Box::new(BufReader::new(std::io::stdin()))
        }
    };
    let mut source = LinePoseSource::new(reader);

    let stop = Arc::new(AtomicBool::new(false));
    let calibrating = Arc::new(AtomicBool::new(false));
    let (command_tx, command_rx) = mpsc::channel();
    setup_interrupt_handler(Arc::clone(&stop), Arc::clone(&calibrating), command_tx.clone());

    if let Some(action) = LiveAction::from_args(&args) {
        if apply_to_first_pose(&mut session, &mut source, action) {
            save_config(&shared, &args.config);
        }
    }

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(fps));

    if !args.calibrate {
        session.run(&mut source, &stop, frame_interval);
        return Ok(());
    }

    if args.input.is_some() {
        spawn_command_reader(command_tx);
    } else {
        warn!("Poses come from stdin; use Ctrl+C to cancel calibration");
    }

    let mut latest = session.latest();
    let producer = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || session.run(&mut source, &stop, frame_interval))
    };

    calibrating.store(true, Ordering::SeqCst);
    let outcome = run_wizard(&shared, &mut latest, &command_rx, WizardTiming::default(), print_event);
    calibrating.store(false, Ordering::SeqCst);

    if let WizardOutcome::Completed { .. } = outcome {
        save_config(&shared, &args.config);
    }

    if producer.join().is_err() {
        warn!("Tracking thread panicked");
    }

    Ok(())
}

/// Stop tracking on Ctrl+C, or only cancel the calibration while it runs
fn setup_interrupt_handler(stop: Arc<AtomicBool>, calibrating: Arc<AtomicBool>, commands: Sender<WizardCommand>) {
    if let Err(e) = ctrlc::set_handler(move || {
        if calibrating.load(Ordering::SeqCst) {
            commands.send(WizardCommand::Cancel).ok();
        } else {
            stop.store(true, Ordering::SeqCst);
        }
    }) {
        warn!("Could not set Ctrl+C handler: {e}");
    }
}

/// Forward `s` (skip) and `c` (cancel) lines from stdin to the wizard
fn spawn_command_reader(commands: Sender<WizardCommand>) {
    println!("Calibration controls: 's' + Enter = skip step, 'c' + Enter = cancel");
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "s" | "skip" => WizardCommand::Skip,
                "c" | "cancel" => WizardCommand::Cancel,
                _ => continue,
            };
            if commands.send(command).is_err() {
                break;
            }
        }
    });
}

fn print_event(event: &SequencerEvent) {
    match event {
        SequencerEvent::StepStarted { step, duration_secs } => {
            let info = step.info();
            println!("\n[{}] {}", step.label(), info.title);
            println!("{}", info.instruction);
            println!("Hold for {duration_secs}s...");
        }
        SequencerEvent::Countdown { remaining, .. } => println!("  {remaining}"),
        SequencerEvent::Captured { step, recorded } => {
            if *recorded {
                println!("  Captured: {}", step.info().title);
            } else {
                println!("  No face detected, {} not recorded", step.info().title);
            }
        }
        SequencerEvent::Completed(_) => {
            let info = CalibrationStep::Complete.info();
            println!("\n{}\n{}", info.title, info.instruction);
        }
        SequencerEvent::Cancelled => println!("\nCalibration cancelled; settings unchanged"),
        SequencerEvent::Idle => {}
    }
}

/// One-shot edit taken from the first detected pose
#[derive(Debug, Clone, Copy, PartialEq)]
enum LiveAction {
    Zero,
    SetBound(Axis, Bound),
}

impl LiveAction {
    fn from_args(args: &Args) -> Option<Self> {
        if args.zero {
            Some(Self::Zero)
        } else if let Some(axis) = args.set_min {
            Some(Self::SetBound(axis, Bound::Min))
        } else {
            args.set_max.map(|axis| Self::SetBound(axis, Bound::Max))
        }
    }
}

fn apply_to_first_pose<T, R>(session: &mut TrackingSession<T>, source: &mut LinePoseSource<R>, action: LiveAction) -> bool
where
    T: MidiTransport,
    R: BufRead,
{
    while !source.is_finished() {
        if session.process_frame(source.current_pose()).is_some() {
            return match action {
                LiveAction::Zero => session.zero_now().is_some(),
                LiveAction::SetBound(axis, bound) => session.set_bound_from_live(axis, bound).is_some(),
            };
        }
    }
    warn!("Pose input ended before a face was detected; configuration unchanged");
    false
}

fn save_config(shared: &SharedConfig, path: &Path) {
    match lock_config(shared).to_file(path) {
        Ok(()) => info!("Configuration saved to {}", path.display()),
        Err(e) => warn!("Failed to save configuration to {}: {e}", path.display()),
    }
}

#[cfg(feature = "midi-io")]
fn list_ports() -> Result<()> {
    let ports = head_pose_midi::midi::port::MidiPort::list_ports(env!("CARGO_PKG_NAME"))?;
    if ports.is_empty() {
        println!("No MIDI output ports found");
    }
    for (index, name) in ports.iter().enumerate() {
        println!("{index}: {name}");
    }
    Ok(())
}

#[cfg(not(feature = "midi-io"))]
fn list_ports() -> Result<()> {
    anyhow::bail!("Built without MIDI port support; rebuild with --features midi-io")
}

#[cfg(feature = "midi-io")]
fn open_transport(args: &Args, shared: &SharedConfig) -> Box<dyn MidiTransport> {
    use head_pose_midi::midi::port::MidiPort;

    if args.no_midi {
        return Box::new(NullTransport);
    }

    let midi = lock_config(shared).midi.clone();
    let mut port = MidiPort::new(env!("CARGO_PKG_NAME"));
    let opened = match (&args.virtual_port, args.port.or(midi.port_index)) {
        (Some(name), _) => port.open_virtual(name),
        (None, Some(index)) => port.open(index),
        (None, None) => port.open_virtual(&midi.virtual_port_name),
    };
    if let Err(e) = opened {
        warn!("{e}; continuing without MIDI output");
    }
    Box::new(port)
}

#[cfg(not(feature = "midi-io"))]
fn open_transport(args: &Args, _shared: &SharedConfig) -> Box<dyn MidiTransport> {
    if args.no_midi {
        return Box::new(NullTransport);
    }
    if args.port.is_some() || args.virtual_port.is_some() {
        warn!("Built without MIDI port support; --port and --virtual-port are ignored");
    }
    warn!("MIDI messages are written to the debug log only");
    Box::new(head_pose_midi::midi::LogTransport::default())
}
