//! Report output and diagnostics
//!
//! Report lines go through a [`Console`] with numeric level gating.
//! Internal diagnostics go through `tracing`; [`init_tracing`] installs the
//! subscriber for binaries.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Console severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
    /// Suppresses everything
    None = 4,
}

impl LogLevel {
    /// Level for a numeric threshold; values above 4 are rejected
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Warning),
            3 => Some(LogLevel::Error),
            4 => Some(LogLevel::None),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Line sink for report output
pub trait Console {
    /// Current threshold
    fn level(&self) -> LogLevel;

    /// Emit a line that already passed the threshold
    fn write_line(&self, level: LogLevel, line: &str);

    /// Print `line` if `level` is at or above the threshold
    fn print(&self, level: LogLevel, line: &str) {
        if level != LogLevel::None && level >= self.level() {
            self.write_line(level, line);
        }
    }

    fn info(&self, line: &str) {
        self.print(LogLevel::Info, line);
    }

    fn error(&self, line: &str) {
        self.print(LogLevel::Error, line);
    }
}

/// Writes Debug/Info to stdout and Warning/Error to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole {
    level: LogLevel,
}

impl StdConsole {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Console for StdConsole {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn write_line(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug | LogLevel::Info => println!("{}", line),
            LogLevel::Warning | LogLevel::Error => eprintln!("{}", line),
            LogLevel::None => {}
        }
    }
}

/// Captures printed lines in memory
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    level: LogLevel,
    lines: Rc<RefCell<Vec<String>>>,
}

impl BufferConsole {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            lines: Rc::default(),
        }
    }

    /// Lines printed so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// All lines joined with newlines
    pub fn output(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl Console for BufferConsole {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn write_line(&self, _level: LogLevel, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

static TRACING: OnceLock<()> = OnceLock::new();

/// Install a `fmt` subscriber once per process.
///
/// `RUST_LOG` wins when set; otherwise the verbosity count picks the level.
pub fn init_tracing(verbosity: u8) {
    TRACING.get_or_init(|| {
        let fallback = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
        if installed.is_ok() {
            tracing::debug!(verbosity, "tracing initialised");
        }
    });
}
