use colored::{Color, ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct LoggerState {
    level: LevelFilter,
    output: Box<dyn Write + Send>,
    /// Lines held back until the configured level is known. `None` once
    /// they have been replayed.
    deferred: Option<Vec<(Level, ColoredString)>>,
}

/// Colored stderr logger. Everything logged before `print_deferred` is held
/// back, because the final level comes from config files and the
/// environment, which are themselves read with logging enabled.
pub struct SpecLogger {
    state: Mutex<LoggerState>,
}

fn level_color(level: Level) -> (String, Color) {
    match level {
        Level::Error => (level.to_string(), Color::Red),
        Level::Warn => (format!("{} ", level), Color::Yellow),
        Level::Info => (format!("{} ", level), Color::White),
        Level::Debug => (level.to_string(), Color::Blue),
        Level::Trace => (level.to_string(), Color::BrightBlack),
    }
}

impl SpecLogger {
    pub fn new(level: LevelFilter) -> &'static Self {
        Self::with_output(level, Box::new(io::stderr()))
    }

    pub fn with_output(
        level: LevelFilter,
        output: Box<dyn Write + Send>,
    ) -> &'static Self {
        Box::leak(Box::new(Self {
            state: Mutex::new(LoggerState {
                level,
                output,
                deferred: Some(Vec::new()),
            }),
        }))
    }

    pub fn init(&'static self) -> Result<&'static Self, log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(LevelFilter::Trace);
        Ok(self)
    }

    fn state(&self) -> MutexGuard<'_, LoggerState> {
        // A panic mid-write leaves nothing worth protecting
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.state().level = level;
    }

    /// Replays held-back lines that pass the current level and switches to
    /// writing directly.
    pub fn print_deferred(&self) {
        let mut state = self.state();
        let Some(deferred) = state.deferred.take() else {
            return;
        };
        let level = state.level;
        for (line_level, line) in deferred {
            if line_level <= level {
                let _ = writeln!(state.output, "{}", line);
            }
        }
    }

    fn format(record: &Record) -> ColoredString {
        let (level, color) = level_color(record.level());
        format!(
            "[{}] {}: {}",
            level.color(color),
            record.target(),
            record.args()
        )
        .color(color)
    }
}

impl Log for SpecLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.state().level
    }

    fn log(&self, record: &Record) {
        let line = Self::format(record);
        let mut state = self.state();
        if let Some(deferred) = state.deferred.as_mut() {
            deferred.push((record.level(), line));
        } else if record.level() <= state.level {
            let _ = writeln!(state.output, "{}", line);
        }
    }

    fn flush(&self) {
        let _ = self.state().output.flush();
    }
}
