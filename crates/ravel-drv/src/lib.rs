//! ravel-drv - The Command-Line Driver
//!
//! `ravel [script_file] [user_prefix]` runs a script line by line and, when
//! every line succeeded, renders the structured log into a LaTeX-ready
//! report at `./resources/<user_prefix>report.tex`. The process exits
//! non-zero when any line failed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use ravel_interp::{ConsoleSink, Interpreter, LogEvent, LogMode};

#[derive(Clone, Debug)]
pub struct Config {
    pub script: PathBuf,
    pub user_prefix: String,
}

impl Config {
    /// Defaults: `test.txt` and an empty prefix.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Config {
        let mut args = args.into_iter();
        let script = args.next().unwrap_or_else(|| "test.txt".to_string());
        let user_prefix = args.next().unwrap_or_default();
        Config {
            script: PathBuf::from(script),
            user_prefix,
        }
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from("./resources").join(format!("{}report.tex", self.user_prefix))
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Session {
            interpreter: Interpreter::with_sink(LogMode::All, Box::new(ConsoleSink)),
        }
    }

    /// Runs the script; returns whether every line succeeded. The report is
    /// written only on success.
    pub fn run(&mut self, config: &Config) -> anyhow::Result<bool> {
        let ok = self
            .interpreter
            .run_file(&config.script)
            .with_context(|| format!("cannot read {}", config.script.display()))?;
        if ok {
            self.write_report(&config.report_path())?;
        }
        Ok(ok)
    }

    fn write_report(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let body = render_report(&self.interpreter.logger().history());
        fs::write(path, body).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Flat LaTeX-ready rendering of the event log; the template engine proper
/// is an external consumer of these lines.
pub fn render_report(history: &[(usize, LogEvent)]) -> String {
    let mut out = String::from("% ravel run report\n\\begin{verbatim}\n");
    for (depth, event) in history {
        let indent = "  ".repeat(*depth);
        let line = match event {
            LogEvent::OperationStarted { name, inputs } => {
                format!("{} {}", name, inputs.join(" "))
            }
            LogEvent::OperationFinished { name, output } => format!("{} -> {}", name, output),
            LogEvent::Assigned { id, value } => format!("{} = {}", id, value),
            LogEvent::Table { title, body } => format!("{}:\n{}", title, body),
            LogEvent::Warning(text) => format!("warning: {}", text),
            LogEvent::Error(text) => format!("error: {}", text),
            LogEvent::TestReport { accepted, rejected } => {
                format!("test: {} accepted, {} rejected", accepted, rejected)
            }
            LogEvent::Message(text) => text.clone(),
        };
        for part in line.lines() {
            out.push_str(&indent);
            out.push_str(part);
            out.push('\n');
        }
    }
    out.push_str("\\end{verbatim}\n");
    out
}

pub fn run() -> anyhow::Result<bool> {
    let config = Config::from_args(std::env::args().skip(1));
    Session::new().run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::from_args(Vec::<String>::new());
        assert_eq!(config.script, PathBuf::from("test.txt"));
        assert_eq!(config.report_path(), PathBuf::from("./resources/report.tex"));
    }

    #[test]
    fn prefix_lands_in_the_report_name() {
        let config = Config::from_args(vec!["s.txt".to_string(), "alice-".to_string()]);
        assert_eq!(
            config.report_path(),
            PathBuf::from("./resources/alice-report.tex")
        );
    }
}
