use anyhow::Result;
use clap::Parser;
use plantcam::{PlantcamConfig, PlantcamOrchestrator};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "plantcam")]
#[command(about = "Periodic plant photos uploaded into dated remote folders")]
#[command(version)]
#[command(long_about = "Captures a still image from a local camera on a fixed interval, \
stores it under a dated local directory and uploads it into a matching dated folder \
of the configured remote storage account.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "plantcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without capturing")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Run one capture cycle and exit
    #[arg(long, help = "Capture and upload a single image, then exit")]
    once: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    // The log file location comes from the config, so load it first
    let config = match PlantcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let guard = init_logging(&args, &config);
    let exit_code = run(&args, config).await;

    // Flush the file writer before exiting
    drop(guard);
    std::process::exit(exit_code);
}

async fn run(args: &Args, config: PlantcamConfig) -> i32 {
    info!("Starting plantcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return 1;
    }

    let mut orchestrator = match PlantcamOrchestrator::connect(config).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Cannot continue without remote storage access: {}", e);
            return 1;
        }
    };

    if args.once {
        let outcome = orchestrator.run_once().await;
        info!("Single cycle finished: {:?}", outcome);
        return if outcome.is_uploaded() { 0 } else { 1 };
    }

    match orchestrator.run().await {
        Ok(exit_code) => {
            info!("plantcam exited with code: {}", exit_code);
            exit_code
        }
        Err(e) => {
            error!("System error during execution: {}", e);
            1
        }
    }
}

fn init_logging(args: &Args, config: &PlantcamConfig) -> WorkerGuard {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        // Each cycle reports at info level
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plantcam={}", log_level)));

    let console_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some("compact") | None => fmt::layer().compact().with_target(false).boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().compact().with_target(false).boxed()
        }
    };

    // Dated file: <directory>/<prefix>.YYYY-MM-DD
    let file_appender = tracing_appender::rolling::daily(
        &config.logging.directory,
        &config.logging.file_prefix,
    );
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .boxed();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Plantcam Configuration File");
    println!("# This is the default configuration with all available options");
    println!();
    println!("{}", toml::to_string_pretty(&PlantcamConfig::default())?);
    Ok(())
}
