use std::error::Error;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tracking_parser::address::{CachingGeocoder, InMemoryAddressCache, StaticGeocoder};
use tracking_parser::config::{Config, LogConfig};
use tracking_parser::location::StaticCellLocator;
use tracking_parser::pipeline::TrackerPipeline;
use tracking_parser::record::{LocationSource, RecordKind};
use tracking_parser::router_state::RouterState;
use tracking_parser::web;

// ========== Logging Setup ==========

fn init_logging(log_config: &LogConfig) -> Result<(), Box<dyn Error>> {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_config.directory)?;

    // Create daily rolling file appender
    let file_appender = rolling::daily(&log_config.directory, &log_config.file_prefix);

    // Build subscriber with both console and file output
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_timer(fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
            fmt::time::OffsetTime::new(
                time::UtcOffset::UTC,
                time::format_description::well_known::Rfc3339,
            )
        }));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_timer(fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
            fmt::time::OffsetTime::new(
                time::UtcOffset::UTC,
                time::format_description::well_known::Rfc3339,
            )
        }));

    // Parse log level from config
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ========== Main Application ==========

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Check for command-line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        println!("GPS Tracker Router");
        println!();
        println!("USAGE:");
        println!("    tracker_router [OPTIONS]");
        println!();
        println!("OPTIONS:");
        println!("    --validate-config, --validate, -v    Validate configuration and exit");
        println!("    --help, -h                           Show this help message");
        println!();
        println!("Configuration file: config.json (in current directory)");
        std::process::exit(0);
    }

    let validate_only = args.contains(&"--validate-config".to_string())
        || args.contains(&"--validate".to_string())
        || args.contains(&"-v".to_string());

    // Load configuration
    let config = match Config::from_file("config.json") {
        Ok(cfg) => {
            if validate_only {
                println!("✓ Configuration validation successful");
                println!("  Listener: {}", cfg.listener.bind_address());
                println!("  Carrier context: mcc={}, mnc={}", cfg.carrier.mcc, cfg.carrier.mnc);
                println!("  Web status API: enabled={}, port={}", cfg.web.enabled, cfg.web.port);
                println!("  Cell tower table: {} entries", cfg.cell_towers.len());
                println!("  Place table: {} entries", cfg.places.len());
                std::process::exit(0);
            }
            cfg
        }
        Err(e) => {
            if validate_only {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: Could not load config.json: {}", e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    // Initialize logging
    init_logging(&config.logging)?;
    info!("GPS Tracker Router starting...");
    info!("Loaded configuration");

    // Build the pipeline with the table-backed collaborators from config.
    // Deployments with live geolocation/geocoding services swap these for
    // network-backed implementations of the same traits.
    let locator = Arc::new(StaticCellLocator::from_table(&config.cell_towers));
    let geocoder = Arc::new(CachingGeocoder::new(
        Arc::new(StaticGeocoder::from_table(&config.places, true)),
        Arc::new(InMemoryAddressCache::new()),
    ));
    let pipeline = Arc::new(TrackerPipeline::new(config.carrier, locator, geocoder));

    let state = Arc::new(Mutex::new(RouterState::new()));

    // Web status API
    if config.web.enabled {
        let web_state = state.clone();
        let port = config.web.port;
        tokio::spawn(async move {
            if let Err(e) = web::start_web_server(web_state, port).await {
                warn!("Web server failed: {}", e);
            }
        });
    }

    // Periodic metrics logging
    {
        let metrics_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                metrics_state.lock().await.metrics.log();
            }
        });
    }

    // Accept device connections
    let bind_address = config.listener.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Listening for tracker connections on {}", bind_address);
    let idle_timeout = config.listener.idle_timeout();

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Device connection from {}", peer);
        let pipeline = pipeline.clone();
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, &pipeline, &state, idle_timeout).await {
                warn!("Connection from {} dropped: {}", peer, e);
                state.lock().await.metrics.io_errors += 1;
            }
        });
    }
}

/// Read '\n'-terminated frames off one device connection until it closes,
/// goes idle, or fails. Frame-level problems never end the connection.
async fn handle_connection(
    socket: TcpStream,
    pipeline: &TrackerPipeline,
    state: &Arc<Mutex<RouterState>>,
    idle_timeout: Duration,
) -> Result<(), std::io::Error> {
    let mut reader = BufReader::new(socket);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::time::timeout(idle_timeout, reader.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| std::io::Error::new(ErrorKind::TimedOut, "idle timeout"))??;
        if read == 0 {
            debug!("connection closed");
            return Ok(());
        }
        process_frame(&buf, pipeline, state).await;
    }
}

/// Run one frame through the pipeline and fold the outcome into the shared
/// state. Pipeline failures are logged and counted, nothing more; retry
/// policy belongs to whoever queues frames at us.
async fn process_frame(raw: &[u8], pipeline: &TrackerPipeline, state: &Arc<Mutex<RouterState>>) {
    match pipeline.process(raw).await {
        Ok(record) => {
            let mut st = state.lock().await;
            st.metrics.frames_received += 1;
            match record.kind {
                RecordKind::Data => st.metrics.data_records += 1,
                RecordKind::Command => st.metrics.command_records += 1,
                RecordKind::Unknown => st.metrics.unknown_frames += 1,
            }
            if record.location_source == Some(LocationSource::Triangulated) {
                st.metrics.triangulated_fixes += 1;
            }
            st.update_record(&record);
            drop(st);

            match serde_json::to_string(&record) {
                Ok(json) => info!("record: {}", json),
                Err(e) => warn!("Failed to serialize record: {}", e),
            }
        }
        Err(e) => {
            let mut st = state.lock().await;
            st.metrics.frames_received += 1;
            st.metrics.geocode_failures += 1;
            drop(st);
            warn!("Pipeline failed for frame: {}", e);
        }
    }
}
