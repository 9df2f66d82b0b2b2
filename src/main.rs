//! Head-tracking parallax demo driven by a simulated camera and face.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use parallax_head_tracking::calibration::Viewport;
use parallax_head_tracking::config::{Config, TuningProfile};
use parallax_head_tracking::presentation::LogSink;
use parallax_head_tracking::session::ParallaxSession;
use parallax_head_tracking::simulation::{FacePlacement, ScriptedDetector, SimClock, SyntheticCamera, SyntheticLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Tuning profile (predictive, simple); overrides the config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Simulated run length in milliseconds
    #[arg(long, default_value = "5000")]
    duration_ms: f64,

    /// Display refresh rate
    #[arg(long, default_value = "60")]
    render_fps: f64,

    /// Side-to-side head sway amplitude in millimeters
    #[arg(long, default_value = "40")]
    sway_mm: f64,

    /// Sway period in milliseconds
    #[arg(long, default_value = "2000")]
    sway_period_ms: f64,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800")]
    viewport: String,

    /// Recalibrate at this time in milliseconds
    #[arg(long)]
    calibrate_at_ms: Option<f64>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn parse_viewport(text: &str) -> Result<Viewport> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("viewport must look like 1280x800, got {text}"))?;
    let w: f64 = w.trim().parse().with_context(|| format!("invalid viewport width in {text}"))?;
    let h: f64 = h.trim().parse().with_context(|| format!("invalid viewport height in {text}"))?;
    Ok(Viewport::new(w, h))
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Parallax Head Tracking");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(profile) = &args.profile {
        let profile: TuningProfile = profile.parse()?;
        config.apply_profile(profile);
    }

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let viewport = parse_viewport(&args.viewport)?;
    let frame_ms = 1000.0 / args.render_fps.max(1.0);
    let (amplitude, period) = (args.sway_mm, args.sway_period_ms);

    let clock = SimClock::new();
    let detector = ScriptedDetector::from_fn(move |t| Some(FacePlacement::sway(t, amplitude, period)))
        .with_estimator(config.estimator.clone());
    let mut session = ParallaxSession::new(
        config,
        SyntheticCamera::new(clock.clone()),
        SyntheticLoader::new(detector),
        LogSink::new(),
        viewport,
    )?;

    session.start()?;
    let mut calibrate_at = args.calibrate_at_ms;
    while clock.now() < args.duration_ms {
        clock.advance(frame_ms);
        if calibrate_at.is_some_and(|at| clock.now() >= at) {
            session.calibrate();
            calibrate_at = None;
        }
        session.frame(clock.now());
    }

    let target = session.target();
    info!(
        "Final target ({:.1}, {:.1}) px after {} detections, {} origin writes",
        target.offset.target_x,
        target.offset.target_y,
        target.sequence,
        session.sink().origins_written()
    );
    session.stop();

    Ok(())
}
