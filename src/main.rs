//! Dual Capture CLI
//!
//! Command-line demonstration of the dual-camera capture pipeline: runs
//! authorization, starts both sessions, captures a series of composites
//! while cycling the inset corner and flash mode, and prints metrics.

use clap::Parser;
use dual_capture::{
    auth::StaticAuthorization,
    capture::{CameraPosition, DeviceDiscovery, FileConfig, MockDiscovery},
    controller::DualSessionController,
    metrics::MetricsRegistry,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "dual-capture", version, about = "Simultaneous front/back capture demo")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of dual captures to take.
    #[arg(short = 'n', long, default_value_t = 3)]
    shots: u32,

    /// Use attached webcams (index 0 = front, 1 = back) instead of mock devices.
    #[cfg(feature = "camera")]
    #[arg(long)]
    webcam: bool,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Dual Capture v{}", dual_capture::VERSION);

    let config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    if let Some(code) = run_webcam(&config, &args).await {
        std::process::exit(code);
    }

    info!("This is a demonstration using mock camera input");
    let discovery = MockDiscovery::pair(
        config.capture.dimensions(CameraPosition::Front),
        config.capture.dimensions(CameraPosition::Back),
    );
    std::process::exit(run(discovery, &config, &args).await);
}

#[cfg(feature = "camera")]
async fn run_webcam(config: &FileConfig, args: &Args) -> Option<i32> {
    if !args.webcam {
        return None;
    }
    let discovery = dual_capture::capture::WebcamDiscovery::default();
    Some(run(discovery, config, args).await)
}

#[cfg(not(feature = "camera"))]
async fn run_webcam(_config: &FileConfig, _args: &Args) -> Option<i32> {
    None
}

async fn run<S>(discovery: S, config: &FileConfig, args: &Args) -> i32
where
    S: DeviceDiscovery + Send + 'static,
{
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut controller =
        match DualSessionController::new(discovery, StaticAuthorization::granted(), config) {
            Ok(controller) => controller,
            Err(e) => {
                eprintln!("Failed to create controller: {}", e);
                return 1;
            }
        };

    if !controller.check_authorization().await {
        eprintln!("Camera access not authorized");
        return 1;
    }
    if let Some(e) = controller.snapshot().error {
        warn!("Sessions partially configured: {}", e);
    }

    match controller.start_sessions().await {
        Ok(status) if status.is_running() => info!(?status, "Sessions running"),
        Ok(_) => {
            eprintln!("No capture session could start");
            return 1;
        }
        Err(e) => {
            eprintln!("Failed to start sessions: {}", e);
            return 1;
        }
    }

    let mut succeeded = 0;
    for shot in 0..args.shots {
        if interrupted.load(Ordering::SeqCst) {
            info!("Interrupted");
            break;
        }

        match controller.capture_dual_photo().await {
            Ok(()) => {
                let snapshot = controller.snapshot();
                match controller.result().composite_image() {
                    Some(composite) => {
                        succeeded += 1;
                        info!(
                            shot,
                            width = composite.width(),
                            height = composite.height(),
                            pip = %snapshot.pip_position,
                            flash = ?snapshot.flash_mode,
                            "Composite ready"
                        );
                    }
                    None => warn!(shot, "Stills captured but compositing failed"),
                }
            }
            Err(e) => warn!(shot, "Capture failed: {}", e),
        }

        // Show the same pair in another corner before moving on
        let position = controller.toggle_pip_position();
        info!(shot, pip = %position, "Recomposited");
        controller.toggle_flash();
        controller.clear_captures();
    }

    if let Err(e) = controller.stop_sessions().await {
        warn!("Failed to stop sessions: {}", e);
    }

    info!("Done. {} of {} captures composited", succeeded, args.shots);

    if args.metrics {
        match MetricsRegistry::new() {
            Ok(registry) => {
                registry.update(&controller.metrics_snapshot());
                match registry.encode() {
                    Ok(text) => println!("{}", text),
                    Err(e) => warn!("Failed to encode metrics: {}", e),
                }
            }
            Err(e) => warn!("Failed to create metrics registry: {}", e),
        }
    }

    0
}
