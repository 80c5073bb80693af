// This code is part of Qiskit.
//
// (C) Copyright IBM 2024
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! An injected diagnostic sink. No pass reaches for a process-wide logger;
//! each one is handed a `&dyn Logger` (or generic `L: Logger`) by its caller.

/// Severity of a single diagnostic record. Ordered so callers can filter
/// with a simple comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
}

/// The sink passes report leveled diagnostics to.
///
/// Implemented as a trait rather than a fixed enum of sinks so a caller can
/// route records anywhere (a `Vec`, a file, `tracing`) without this crate
/// knowing about it.
pub trait Logger {
    fn log(&self, level: Level, message: &str);

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }
    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }
    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}

/// Discards every record. The default when a caller supplies nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Forwards records to the `tracing` crate's active dispatcher, for callers
/// that do want process-wide structured logging. One adapter among several
/// possible, not a privileged default.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!("{message}"),
            Level::Debug => tracing::debug!("{message}"),
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingLogger {
        records: RefCell<Vec<(Level, String)>>,
    }

    impl Logger for RecordingLogger {
        fn log(&self, level: Level, message: &str) {
            self.records.borrow_mut().push((level, message.to_string()));
        }
    }

    #[test]
    fn null_logger_drops_everything() {
        let logger = NullLogger;
        logger.info("unseen");
    }

    #[test]
    fn recording_logger_captures_level_and_message() {
        let logger = RecordingLogger {
            records: RefCell::new(Vec::new()),
        };
        logger.warn("offset tuning regressed");
        let records = logger.records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, Level::Warn);
        assert_eq!(records[0].1, "offset tuning regressed");
    }
}
