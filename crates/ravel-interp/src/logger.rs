//! Structured logging for interpreter runs.
//!
//! The logger is a context value handed around the evaluator, not a global.
//! Nesting is scoped: entering an operation takes a guard that increments
//! the depth and restores it on drop, error paths included. Activation is
//! scoped the same way and controls whether detail events (algorithm
//! tables) are emitted; the mode controls how much reaches the sink at all.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMode {
    All,
    Errors,
    Nothing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    OperationStarted { name: String, inputs: Vec<String> },
    OperationFinished { name: String, output: String },
    Assigned { id: String, value: String },
    /// An algorithm's intermediate table (determinization subsets,
    /// minimization marks, monoid classes), emitted only when activated.
    Table { title: String, body: String },
    Warning(String),
    Error(String),
    TestReport { accepted: usize, rejected: usize },
    Message(String),
}

impl LogEvent {
    fn is_error(&self) -> bool {
        matches!(self, LogEvent::Error(_))
    }

    fn is_detail(&self) -> bool {
        matches!(self, LogEvent::Table { .. })
    }
}

/// Receives delivered events together with their nesting depth.
pub trait LogSink {
    fn event(&mut self, depth: usize, event: &LogEvent);
}

/// Discards everything; history still records.
pub struct NullSink;

impl LogSink for NullSink {
    fn event(&mut self, _depth: usize, _event: &LogEvent) {}
}

/// Renders events to standard output with two-space indentation.
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn event(&mut self, depth: usize, event: &LogEvent) {
        let indent = "  ".repeat(depth);
        match event {
            LogEvent::OperationStarted { name, inputs } => {
                println!("{}{} {}", indent, name, inputs.join(" "));
            }
            LogEvent::OperationFinished { name, output } => {
                println!("{}{} -> {}", indent, name, output);
            }
            LogEvent::Assigned { id, value } => println!("{}{} = {}", indent, id, value),
            LogEvent::Table { title, body } => {
                println!("{}{}:", indent, title);
                for line in body.lines() {
                    println!("{}  {}", indent, line);
                }
            }
            LogEvent::Warning(text) => println!("{}warning: {}", indent, text),
            LogEvent::Error(text) => println!("{}ERROR: {}", indent, text),
            LogEvent::TestReport { accepted, rejected } => {
                println!("{}test: {} accepted, {} rejected", indent, accepted, rejected);
            }
            LogEvent::Message(text) => println!("{}{}", indent, text),
        }
    }
}

struct Inner {
    mode: LogMode,
    nesting: usize,
    active: bool,
    sink: Box<dyn LogSink>,
    history: Vec<(usize, LogEvent)>,
}

#[derive(Clone)]
pub struct Logger {
    inner: Rc<RefCell<Inner>>,
}

impl Logger {
    pub fn new(mode: LogMode) -> Self {
        Logger::with_sink(mode, Box::new(NullSink))
    }

    pub fn with_sink(mode: LogMode, sink: Box<dyn LogSink>) -> Self {
        Logger {
            inner: Rc::new(RefCell::new(Inner {
                mode,
                nesting: 0,
                active: false,
                sink,
                history: Vec::new(),
            })),
        }
    }

    pub fn set_mode(&self, mode: LogMode) {
        self.inner.borrow_mut().mode = mode;
    }

    /// Nesting guard: depth rises for the guard's lifetime.
    pub fn scope(&self) -> LogScope {
        self.inner.borrow_mut().nesting += 1;
        LogScope {
            logger: self.clone(),
        }
    }

    /// Activation guard: detail events are delivered for its lifetime.
    pub fn activation(&self, activate: bool) -> ActivationScope {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            let previous = inner.active;
            inner.active = activate || previous;
            previous
        };
        ActivationScope {
            logger: self.clone(),
            previous,
        }
    }

    pub fn log(&self, event: LogEvent) {
        let mut inner = self.inner.borrow_mut();
        let delivered = match inner.mode {
            LogMode::Nothing => false,
            LogMode::Errors => event.is_error(),
            LogMode::All => !event.is_detail() || inner.active,
        };
        if delivered {
            let depth = inner.nesting;
            inner.sink.event(depth, &event);
            inner.history.push((depth, event));
        }
    }

    /// Everything delivered so far, with nesting depths.
    pub fn history(&self) -> Vec<(usize, LogEvent)> {
        self.inner.borrow().history.clone()
    }
}

pub struct LogScope {
    logger: Logger,
}

impl Drop for LogScope {
    fn drop(&mut self) {
        self.logger.inner.borrow_mut().nesting -= 1;
    }
}

pub struct ActivationScope {
    logger: Logger,
    previous: bool,
}

impl Drop for ActivationScope {
    fn drop(&mut self) {
        self.logger.inner.borrow_mut().active = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_restore_depth_on_drop() {
        let logger = Logger::new(LogMode::All);
        {
            let _outer = logger.scope();
            logger.log(LogEvent::Message("inner".into()));
            {
                let _inner = logger.scope();
                logger.log(LogEvent::Message("deeper".into()));
            }
        }
        logger.log(LogEvent::Message("outer".into()));
        let depths: Vec<usize> = logger.history().iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![1, 2, 0]);
    }

    #[test]
    fn errors_mode_keeps_only_errors() {
        let logger = Logger::new(LogMode::Errors);
        logger.log(LogEvent::Message("chatter".into()));
        logger.log(LogEvent::Error("boom".into()));
        assert_eq!(logger.history().len(), 1);
    }

    #[test]
    fn detail_events_need_activation() {
        let logger = Logger::new(LogMode::All);
        logger.log(LogEvent::Table {
            title: "t".into(),
            body: "b".into(),
        });
        assert!(logger.history().is_empty());
        {
            let _active = logger.activation(true);
            logger.log(LogEvent::Table {
                title: "t".into(),
                body: "b".into(),
            });
        }
        assert_eq!(logger.history().len(), 1);
        logger.log(LogEvent::Table {
            title: "t".into(),
            body: "b".into(),
        });
        assert_eq!(logger.history().len(), 1);
    }
}
