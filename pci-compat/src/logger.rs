use std::io::{self, Write};

use log::{LevelFilter, Log, Metadata, Record};

/// Env var holding the initial level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`)
pub const LOG_ENV: &str = "PCI_COMPAT_LOG";

/// Writes `[LEVEL] message` lines to stderr
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl StderrLogger {
    /// Installs the logger at `level`. Only the first call installs it; later calls just move the filter.
    pub fn install(level: LevelFilter) {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(level);
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_record(&mut io::stderr().lock(), record);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    writeln!(out, "[{}] {}", record.level(), record.args())
}

/// Starting filter: `PCI_COMPAT_LOG` if it holds a valid level, otherwise `Warn`
pub fn base_level(env: Option<&str>) -> LevelFilter {
    env.and_then(|s| s.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Raises `base` by one level per `-v`, saturating at `Trace`
pub fn raise(base: LevelFilter, verbosity: u8) -> LevelFilter {
    let mut level = base;
    for _ in 0..verbosity {
        level = match level {
            LevelFilter::Off => LevelFilter::Error,
            LevelFilter::Error => LevelFilter::Warn,
            LevelFilter::Warn => LevelFilter::Info,
            LevelFilter::Info => LevelFilter::Debug,
            LevelFilter::Debug | LevelFilter::Trace => LevelFilter::Trace,
        };
    }
    level
}
