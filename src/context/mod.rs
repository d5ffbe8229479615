// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging contexts and their registry.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use log::Metadata;
use log::Record;

use crate::append;
use crate::append::Append;
use crate::filter::EnvFilter;
use crate::filter::Filter;
use crate::filter::FilterResult;

pub use self::selector::ContextSelector;
pub use self::selector::DEFAULT_CONTEXT_NAME;

mod selector;

/// The number of most recent [`Status`]es a [`LoggerContext`] keeps.
pub const MAX_STATUSES: usize = 150;

/// A grouped set of filters and appenders.
///
/// A record is passed to the appenders if no filter rejects it. The first filter that accepts a
/// record short-circuits the rest.
#[derive(Debug)]
pub struct Dispatch {
    filters: Vec<Box<dyn Filter>>,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch {
    /// Create a dispatch with the given filters and appenders.
    pub fn new(filters: Vec<Box<dyn Filter>>, appends: Vec<Box<dyn Append>>) -> Self {
        debug_assert!(
            !appends.is_empty(),
            "A Dispatch must have at least one append"
        );

        Self { filters, appends }
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        for filter in &self.filters {
            match filter.enabled(metadata) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    fn log(&self, record: &Record) -> anyhow::Result<()> {
        for filter in &self.filters {
            match filter.matches(record) {
                FilterResult::Reject => return Ok(()),
                FilterResult::Accept => break,
                FilterResult::Neutral => {}
            }
        }

        for append in &self.appends {
            append.append(record)?;
        }
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        for append in &self.appends {
            append.flush()?;
        }
        Ok(())
    }
}

/// Severity of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// A message about the lifecycle of a [`LoggerContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

/// How a [`LoggerContext`] is currently configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Configuration {
    /// The automatic configuration applied when the context is created.
    Default,
    /// Configured from the resource at the given location.
    Custom(String),
    /// Reset, with no dispatch.
    Reset,
}

#[derive(Debug)]
struct State {
    dispatches: Vec<Dispatch>,
    configuration: Configuration,
}

/// A named logging context: the dispatches that receive log records.
///
/// A new context starts with a default configuration that writes records to stderr, filtered
/// by the `RUST_LOG` environment variable (default: `debug`).
#[derive(Debug)]
pub struct LoggerContext {
    name: String,
    state: RwLock<State>,
    statuses: Mutex<VecDeque<Status>>,
}

impl LoggerContext {
    /// Create a context with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let dispatch = Dispatch::new(
            vec![Box::new(EnvFilter::from_default_env_or("debug"))],
            vec![Box::new(append::Stderr::default())],
        );

        Self {
            name: name.into(),
            state: RwLock::new(State {
                dispatches: vec![dispatch],
                configuration: Configuration::Default,
            }),
            statuses: Mutex::new(VecDeque::new()),
        }
    }

    /// The name of this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How this context is currently configured.
    pub fn configuration(&self) -> Configuration {
        self.read_state().configuration.clone()
    }

    /// The number of dispatches currently installed.
    pub fn dispatch_count(&self) -> usize {
        self.read_state().dispatches.len()
    }

    /// Flush and drop all dispatches.
    ///
    /// Resources held by the appenders, such as open files, are released. A reset context drops
    /// every record until it is configured again.
    pub fn reset(&self) {
        let dispatches = {
            let mut state = self.write_state();
            state.configuration = Configuration::Reset;
            std::mem::take(&mut state.dispatches)
        };

        for dispatch in &dispatches {
            if let Err(err) = dispatch.flush() {
                handle_flush_error(err);
            }
        }
        drop(dispatches);

        self.add_status(StatusLevel::Info, format!("context [{}] reset", self.name));
    }

    /// Replace the dispatches of this context with ones configured from `location`.
    pub fn configure(&self, location: impl Into<String>, dispatches: Vec<Dispatch>) {
        let location = location.into();
        let message = format!(
            "context [{}] configured from [{location}] with {} dispatch(es)",
            self.name,
            dispatches.len()
        );

        let previous = {
            let mut state = self.write_state();
            state.configuration = Configuration::Custom(location);
            std::mem::replace(&mut state.dispatches, dispatches)
        };
        drop(previous);

        self.add_status(StatusLevel::Info, message);
    }

    /// Record a status message, evicting the oldest one beyond [`MAX_STATUSES`].
    pub fn add_status(&self, level: StatusLevel, message: impl Into<String>) {
        let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        if statuses.len() == MAX_STATUSES {
            statuses.pop_front();
        }
        statuses.push_back(Status {
            level,
            message: message.into(),
        });
    }

    /// The most recent status messages, oldest first.
    pub fn statuses(&self) -> Vec<Status> {
        let statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        statuses.iter().cloned().collect()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl log::Log for LoggerContext {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.read_state()
            .dispatches
            .iter()
            .any(|dispatch| dispatch.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for dispatch in &self.read_state().dispatches {
            if let Err(err) = dispatch.log(record) {
                handle_log_error(record, err);
            }
        }
    }

    fn flush(&self) {
        for dispatch in &self.read_state().dispatches {
            if let Err(err) = dispatch.flush() {
                handle_flush_error(err);
            }
        }
    }
}

fn handle_log_error(record: &Record, error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
"###,
        args = record.args(),
        record = record,
        error = error,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
        args = record.args(),
        record = record,
        error = error,
        fallback_error = fallback_error,
    );
}

fn handle_flush_error(error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform flush.
    Error: {error:?}
"###,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular flush.
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use log::Level;
    use log::LevelFilter;
    use log::Log;

    use super::*;

    #[derive(Debug, Default)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Append for Collect {
        fn append(&self, record: &Record) -> anyhow::Result<()> {
            let mut lines = self.0.lock().unwrap();
            lines.push(format!("{} {}", record.level(), record.args()));
            Ok(())
        }
    }

    fn log(context: &LoggerContext, level: Level, message: &str) {
        context.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target("my_app")
                .build(),
        );
    }

    #[test]
    fn configure_and_reset() {
        let lines = Arc::new(Mutex::new(vec![]));
        let context = LoggerContext::new("test");
        assert_eq!(context.name(), "test");
        assert_eq!(context.configuration(), Configuration::Default);
        assert_eq!(context.dispatch_count(), 1);

        context.reset();
        assert_eq!(context.configuration(), Configuration::Reset);
        assert_eq!(context.dispatch_count(), 0);

        let dispatch = Dispatch::new(
            vec![Box::new(LevelFilter::Info)],
            vec![Box::new(Collect(lines.clone()))],
        );
        context.configure("classpath:/test.toml", vec![dispatch]);
        assert_eq!(
            context.configuration(),
            Configuration::Custom("classpath:/test.toml".to_string())
        );

        log(&context, Level::Info, "kept");
        log(&context, Level::Debug, "dropped");
        assert!(context.enabled(&log::MetadataBuilder::new().level(Level::Warn).build()));
        assert!(!context.enabled(&log::MetadataBuilder::new().level(Level::Trace).build()));

        context.reset();
        log(&context, Level::Error, "after reset");
        assert_eq!(*lines.lock().unwrap(), vec!["INFO kept".to_string()]);

        let statuses = context.statuses();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| s.level == StatusLevel::Info));
    }

    #[test]
    fn statuses_are_bounded() {
        let context = LoggerContext::new("test");
        for i in 0..MAX_STATUSES + 10 {
            context.add_status(StatusLevel::Warn, format!("status {i}"));
        }

        let statuses = context.statuses();
        assert_eq!(statuses.len(), MAX_STATUSES);
        assert_eq!(statuses[0].message, "status 10");
        assert_eq!(
            statuses[MAX_STATUSES - 1].message,
            format!("status {}", MAX_STATUSES + 9)
        );
    }

    #[test]
    fn reset_releases_appenders() {
        let lines = Arc::new(Mutex::new(vec![]));
        let context = LoggerContext::new("test");
        let dispatch = Dispatch::new(vec![], vec![Box::new(Collect(lines.clone()))]);
        context.configure("memory", vec![dispatch]);
        assert_eq!(Arc::strong_count(&lines), 2);

        context.reset();
        assert_eq!(Arc::strong_count(&lines), 1);
    }
}
