//! Log output configuration.
//!
//! The crate emits its diagnostics through [`tracing`]. Nothing is printed
//! until a subscriber is installed, either by the application or with
//! [`LoggingBuilder`].

use crate::error::{Error, Result};
use crate::sys::platform::sys_localtime;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, time::Uptime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builder for the process-wide log output.
///
/// Two sinks are available, each with its own verbosity threshold:
/// - the screen (standard error), on by default at [`LevelFilter::WARN`],
/// - a log file, off by default. The file name is the configured prefix
///   followed by the local start time and `.log`; an existing file is
///   appended to.
///
/// Every line carries the time elapsed since the output was installed.
///
/// # Examples
///
/// ```rust,ignore
/// let path = LoggingBuilder::new()
///     .file("/var/log/reader")
///     .file_level(LevelFilter::DEBUG)
///     .screen_level(LevelFilter::ERROR)
///     .init()?;
/// ```
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    /// Log file name prefix, `None` when file output is off.
    file: Option<PathBuf>,

    /// Threshold of the file sink.
    file_level: LevelFilter,

    /// Whether the screen sink is on.
    screen: bool,

    /// Threshold of the screen sink.
    screen_level: LevelFilter,
}

impl LoggingBuilder {
    /// Creates a builder logging warnings and errors to the screen only.
    pub fn new() -> Self {
        Self {
            file: None,
            file_level: LevelFilter::DEBUG,
            screen: true,
            screen_level: LevelFilter::WARN,
        }
    }

    /// Turns file output on, using `prefix` for the file name.
    pub fn file<P: AsRef<Path>>(mut self, prefix: P) -> Self {
        self.file = Some(prefix.as_ref().to_path_buf());
        self
    }

    /// Turns file output off.
    pub fn no_file(mut self) -> Self {
        self.file = None;
        self
    }

    /// Sets the most verbose level written to the file.
    pub fn file_level(mut self, level: LevelFilter) -> Self {
        self.file_level = level;
        self
    }

    /// Turns screen output on or off.
    pub fn screen(mut self, enabled: bool) -> Self {
        self.screen = enabled;
        self
    }

    /// Sets the most verbose level printed on screen.
    pub fn screen_level(mut self, level: LevelFilter) -> Self {
        self.screen_level = level;
        self
    }

    /// Installs the configured output as the global subscriber.
    ///
    /// Returns the path of the log file, if file output is on.
    ///
    /// # Errors
    ///
    /// [`Error::Os`] if the log file cannot be opened or a global
    /// subscriber is already installed.
    pub fn init(self) -> Result<Option<PathBuf>> {
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if self.screen {
            let screen = fmt::layer()
                .with_writer(io::stderr)
                .with_timer(Uptime::default())
                .with_thread_names(true)
                .with_filter(self.screen_level);

            layers.push(screen.boxed());
        }

        let path = match &self.file {
            Some(prefix) => {
                let tm = sys_localtime().map_err(|e| Error::os("localtime", e))?;
                let path = log_file_name(prefix, &tm);

                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| Error::os("open", e))?;

                let file = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(Uptime::default())
                    .with_thread_names(true)
                    .with_filter(self.file_level);

                layers.push(file.boxed());
                Some(path)
            }
            None => None,
        };

        tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers))
            .map_err(|e| Error::os("set_global_default", io::Error::other(e)))?;

        Ok(path)
    }
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `<prefix>_<dd>_<mm>_<yyyy>_<hh>-<mm>-<ss>.log`
fn log_file_name(prefix: &Path, tm: &libc::tm) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();

    name.push(format!(
        "_{:02}_{:02}_{}_{:02}-{:02}-{:02}.log",
        tm.tm_mday,
        tm.tm_mon + 1,
        tm.tm_year + 1900,
        tm.tm_hour,
        tm.tm_min,
        tm.tm_sec,
    ));

    PathBuf::from(name)
}
