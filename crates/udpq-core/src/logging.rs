//! Append-only log file sink and subscriber setup.
//!
//! [`LogSink`] is a `tracing` layer that writes every event as one
//! timestamped line to the configured log file:
//!
//! ```text
//! [19.10.2026 14:03:07] INFO Received request from client peer=127.0.0.1:5000 command="PUT"
//! ```
//!
//! Each line is flushed as it is written, so the file is complete even if
//! the process is killed.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use udpq_config::LoggingConfig;

/// Timestamp format of log lines (day.month.year hours:minutes:seconds).
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Errors from setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// A `tracing` layer appending timestamped lines to a file.
#[derive(Debug, Clone)]
pub struct LogSink {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl LogSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and sync the file. Called on shutdown.
    pub fn close(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
            let _ = file.sync_data();
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            // Nowhere to report a failed log write; drop the line.
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }
}

impl<S: Subscriber> Layer<S> for LogSink {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let level = event.metadata().level();
        let line = format!("[{timestamp}] {level} {}{}\n", visitor.message, visitor.fields);
        self.write_line(&line);
    }
}

/// Collects the `message` field and renders the rest as ` key=value`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

/// Install the global subscriber: an [`EnvFilter`], the file sink, and
/// optionally a compact stderr layer.
///
/// `RUST_LOG` takes precedence over `config.level`; `verbosity` raises the
/// configured level (`1` = debug, `2+` = trace).
pub fn init(config: &LoggingConfig, verbosity: u8, stderr: bool) -> Result<LogSink, LogError> {
    let sink = LogSink::open(&config.file)?;

    let level = match verbosity {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(sink.clone())
        .with(stderr_layer)
        .try_init()?;

    Ok(sink)
}
