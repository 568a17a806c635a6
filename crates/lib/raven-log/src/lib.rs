use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fern::colors::{Color, ColoredLevelConfig};

pub use log::LevelFilter as LevelFilter;

extern crate log as glog;

/// Log configuration.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Also write every record into this file, truncated on start.
    pub log_file: Option<PathBuf>,
    /// Log targets kept out of the console, a target also mutes its submodules.
    pub muted_targets: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Debug,
            log_file: Some(PathBuf::from("log/log.txt")),
            muted_targets: Vec::new(),
        }
    }
}

impl LogConfig {
    pub fn is_muted(&self, target: &str) -> bool {
        self.muted_targets.iter().any(|muted| {
            target.strip_prefix(muted.as_str())
                .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

/// Parse a level name given on the command line.
pub fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    let level = match level.to_lowercase().trim() {
        "off" => LevelFilter::Off,
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        other => anyhow::bail!("Unknown log level {:?}! (please choose from trace, debug, info, warn, error)", other),
    };

    Ok(level)
}

/// Initialize log module, can only succeed once per process.
pub fn init_log(config: &LogConfig) -> anyhow::Result<()> {
    setup_logger(config).context("Failed to initialize log module!")?;

    glog::trace!("log initialized!");
    Ok(())
}

fn setup_logger(config: &LogConfig) -> anyhow::Result<()> {
    // setup colors
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Magenta)
        .info(Color::Cyan)
        .warn(Color::Yellow)
        .error(Color::Red);

    let muted = Arc::new(config.clone());
    let stderr_muted = muted.clone();

    // standard output dispatch, for trace, debug and info messages.
    let stdout = fern::Dispatch::new()
        .filter(move |meta| meta.level() > log::Level::Warn && !muted.is_muted(meta.target()))
        .chain(std::io::stdout());

    // standard error dispatch, for warn and error messages.
    let stderr = fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .filter(move |meta| !stderr_muted.is_muted(meta.target()))
        .chain(std::io::stderr());

    // console output with the colors
    let console_output = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .chain(stdout)
        .chain(stderr);

    let mut dispatch = fern::Dispatch::new()
        .level(config.level) // setup base log level from user
        .chain(console_output);

    if let Some(path) = &config.log_file {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log folder {}", parent.display()))?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        let file_output = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .chain(file);

        dispatch = dispatch.chain(file_output);
    }

    // final apply to all the dispatches
    dispatch.apply()?;
    Ok(())
}
