//! # padscope
//!
//! Live game controller tester.
//!
//! ```bash
//! padscope [CONFIG_PATH]
//! ```
//!
//! `CONFIG_PATH` defaults to `config/default.toml`; built-in defaults are used
//! when that file does not exist.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration and pick the renderer
//!    - Set up logging (log file in terminal mode, stderr otherwise)
//!    - Create the shared input poller and start loading the controller model
//!
//! 2. **Frame Loop**
//!    - Poll the controller and redraw at `[frame] refresh_hz`
//!    - Runs until the renderer is closed (`q`, `Esc`) or Ctrl+C
//!
//! 3. **Graceful Shutdown**
//!    - Stop the loop, release highlights, restore the terminal

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use padscope::config::{Config, LoggingConfig, RenderMode};
use padscope::device::evdev_source::EvdevSource;
use padscope::device::poller::InputPoller;
use padscope::frame::{FrameLoop, FrameSync};
use padscope::scene::asset::AssetLoad;
use padscope::scene::headless::HeadlessRenderer;
use padscope::scene::terminal::TerminalRenderer;

/// Configuration file read when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name inside `[logging] log_dir`
const LOG_FILE_NAME: &str = "padscope.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let mode = effective_mode(config.render.mode, std::io::stdout().is_terminal());
    let _log_guard = init_logging(&config.logging, mode)?;

    info!("padscope v{} starting...", env!("CARGO_PKG_VERSION"));
    if mode != config.render.mode {
        warn!("stdout is not a terminal, falling back to headless rendering");
    }

    // The one poller shared by everything that reads the controller
    let poller = Arc::new(InputPoller::new(EvdevSource::new(&config.device)));
    let asset = AssetLoad::spawn(&config.asset.path);

    let mut handle = match mode {
        RenderMode::Terminal => {
            let renderer = TerminalRenderer::new().context("Failed to initialize terminal")?;
            FrameLoop::start(
                FrameSync::from_config(&config, Arc::clone(&poller), renderer, asset),
                config.frame.refresh_hz,
            )
        }
        RenderMode::Headless => FrameLoop::start(
            FrameSync::from_config(&config, Arc::clone(&poller), HeadlessRenderer::new(), asset),
            config.frame.refresh_hz,
        ),
    };

    info!("Press Ctrl+C to exit");

    let finished = tokio::select! {
        frames = handle.join() => frames,

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            None
        }
    };

    let frames = match finished {
        Some(frames) => Some(frames),
        None => {
            handle.stop();
            handle.join().await
        }
    };

    info!("Total frames drawn: {}", frames.unwrap_or(0));
    Ok(())
}

/// Terminal rendering needs a TTY on stdout.
fn effective_mode(configured: RenderMode, stdout_is_terminal: bool) -> RenderMode {
    match configured {
        RenderMode::Terminal if !stdout_is_terminal => RenderMode::Headless,
        mode => mode,
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `[logging] level`.
///
/// In terminal mode logs go to a file so they do not tear the screen; the
/// returned guard flushes it on drop.
fn init_logging(config: &LoggingConfig, mode: RenderMode) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match mode {
        RenderMode::Terminal => {
            std::fs::create_dir_all(&config.log_dir)
                .with_context(|| format!("Failed to create log directory {}", config.log_dir))?;
            let appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        RenderMode::Headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}
