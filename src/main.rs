//! PhotoCam CLI
//!
//! Runs a camera session, captures a few photos and hands each one to a
//! dispatcher. Without the `camera` feature (or with `--mock`) the
//! synthetic camera is used.

use clap::Parser;
use photocam::{
    config::FileConfig,
    media::{MediaCapability, MockMedia},
    metrics::{MetricsRegistry, MetricsSnapshot},
    transport::{Dispatcher, LogDispatcher},
    PhotoCam,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Command-line options; each one overrides the config file.
#[derive(Debug, Parser)]
#[command(name = "photocam", version, about = "Capture webcam photos and hand them to a server")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Widget identifier.
    #[arg(long)]
    id: Option<String>,

    /// Facing-mode keyword (user, environment) or device identifier.
    #[arg(long)]
    device: Option<String>,

    /// Image format (jpeg, png, jpg).
    #[arg(long)]
    format: Option<String>,

    /// Number of photos to capture.
    #[arg(long)]
    captures: Option<u32>,

    /// Delay between captures in milliseconds.
    #[arg(long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Print the discovered video input devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Use the synthetic camera even when a native backend is built in.
    #[arg(long)]
    mock: bool,

    /// Endpoint that receives captured photos.
    #[cfg(feature = "http")]
    #[arg(long)]
    endpoint: Option<String>,

    /// Serve Prometheus metrics on this port.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    info!("PhotoCam v{}", photocam::VERSION);

    let registry = match MetricsRegistry::new() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    #[cfg(feature = "metrics")]
    if config.runtime.metrics_port > 0 {
        spawn_metrics_server(config.runtime.metrics_port, Arc::clone(&registry));
    }

    let cam = Arc::new(
        PhotoCam::builder(config.id.clone(), select_media(cli.mock))
            .config(config.photocam.clone())
            .dispatcher(select_dispatcher(config.runtime.endpoint.as_deref()))
            .init(),
    );

    // Release the camera on interrupt
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cam = Arc::clone(&cam);
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || {
            warn!("Interrupted, releasing camera");
            interrupted.store(true, Ordering::SeqCst);
            cam.clean_up();
        }) {
            warn!("Failed to install interrupt handler: {}", e);
        }
    }

    if cli.list_devices {
        cam.wait_idle();
        for device in cam.devices() {
            println!("{}\t{}", device.device_id, device.label);
        }
        cam.stop();
        return;
    }

    if cam.settings().disabled {
        warn!("Widget is disabled, nothing to do");
        return;
    }
    if !cam.settings().auto_start {
        cam.start();
    }

    let interval = Duration::from_millis(config.runtime.capture_interval_ms);
    for i in 0..config.runtime.captures {
        if !sleep_unless(&interrupted, interval) {
            break;
        }
        cam.capture();
        registry.update(&MetricsSnapshot::from_widget(&cam));
        info!("Capture {} of {} done", i + 1, config.runtime.captures);
    }

    cam.stop();
    cam.wait_idle();

    let snapshot = MetricsSnapshot::from_widget(&cam);
    registry.update(&snapshot);
    info!(
        "Processed session: {} frames rendered, {} captures, {} requests, {} failures",
        snapshot.frames_rendered,
        snapshot.captures,
        snapshot.requests_dispatched,
        snapshot.capture_failures
    );
}

fn load_config(cli: &Cli) -> Result<FileConfig, photocam::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(id) = &cli.id {
        config.id = id.clone();
    }
    if let Some(device) = &cli.device {
        config.photocam.device = Some(device.clone());
    }
    if let Some(format) = &cli.format {
        config.photocam.format = Some(format.clone());
    }
    if let Some(captures) = cli.captures {
        config.runtime.captures = captures;
    }
    if let Some(interval) = cli.interval_ms {
        config.runtime.capture_interval_ms = interval;
    }
    #[cfg(feature = "http")]
    if let Some(endpoint) = &cli.endpoint {
        config.runtime.endpoint = Some(endpoint.clone());
    }
    #[cfg(feature = "metrics")]
    if let Some(port) = cli.metrics_port {
        config.runtime.metrics_port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Sleeps for `duration`, returning `false` early if interrupted.
fn sleep_unless(interrupted: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if interrupted.load(Ordering::SeqCst) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20).min(duration));
    }
    !interrupted.load(Ordering::SeqCst)
}

#[cfg(feature = "camera")]
fn select_media(mock: bool) -> Arc<dyn MediaCapability> {
    if mock {
        info!("Using synthetic camera input");
        Arc::new(MockMedia::new())
    } else {
        Arc::new(photocam::media::NativeMedia::new())
    }
}

#[cfg(not(feature = "camera"))]
fn select_media(_mock: bool) -> Arc<dyn MediaCapability> {
    info!("Built without the camera feature, using synthetic camera input");
    Arc::new(MockMedia::new())
}

#[cfg(feature = "http")]
fn select_dispatcher(endpoint: Option<&str>) -> Arc<dyn Dispatcher> {
    match endpoint {
        Some(url) => Arc::new(photocam::transport::HttpDispatcher::new(url)),
        None => Arc::new(LogDispatcher),
    }
}

#[cfg(not(feature = "http"))]
fn select_dispatcher(endpoint: Option<&str>) -> Arc<dyn Dispatcher> {
    if endpoint.is_some() {
        warn!("Endpoint configured but built without the http feature, logging requests instead");
    }
    Arc::new(LogDispatcher)
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, registry: Arc<MetricsRegistry>) {
    use photocam::metrics::{MetricsServer, MetricsServerConfig};

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}
