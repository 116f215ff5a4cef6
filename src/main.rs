use anyhow::{Context, Result};
use clap::Parser;
use packer_config::config::{ConfigLocator, SearchPaths};
use packer_config::{ConfigLoader, PluginDiscoverer, DEFAULT_TOOL_NAME};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Resolve the tool configuration and print it with discovered plugins merged in
#[derive(Parser, Debug)]
#[command(name = "packer-config")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// Defaults to $<TOOL>_CONFIG, then the per-user configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra plugin directory, scanned after $<TOOL>_PLUGIN_PATH (must exist)
    #[arg(short = 'p', long = "plugin-dir")]
    plugin_dirs: Vec<PathBuf>,

    /// Tool name used in plugin filenames and environment variables
    #[arg(long, default_value = DEFAULT_TOOL_NAME)]
    tool_name: String,

    /// Only read the configuration file, skip plugin discovery
    #[arg(long)]
    no_discovery: bool,

    /// List plugin directories in parallel
    #[arg(long)]
    concurrent: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, args.log_file)?;

    info!("Starting packer-config v{}", env!("CARGO_PKG_VERSION"));

    let mut locator = ConfigLocator::from_env(&args.tool_name);
    if let Some(path) = args.config {
        locator = locator.with_override(path);
    }

    let discoverer = PluginDiscoverer::new(&args.tool_name);
    let loader = ConfigLoader::new(locator, discoverer);

    let mut search = SearchPaths::from_env(loader.locator());
    search.required_dirs.extend(args.plugin_dirs);

    let config = if args.no_discovery {
        loader.load_without_discovery()
    } else if args.concurrent {
        loader.load_concurrent(&search).await
    } else {
        loader.load(&search)
    }
    .context("Failed to load configuration")?;

    // Frozen from here on
    let config = Arc::new(config);
    info!("Configuration loaded: {} plugins", config.plugin_count());

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, config.as_ref())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;

    Ok(())
}
