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

//! Binding named loggers to components.

use std::fmt;

use log::Level;

use crate::Error;

/// A logger bound to a target name.
///
/// Records are emitted through the [`log`] crate facade with the bound name as their target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedLogger {
    name: String,
}

impl NamedLogger {
    /// Create a logger for the target `name`.
    ///
    /// # Errors
    ///
    /// Return [`Error::InvalidArgument`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "logger name must not be empty".to_string(),
            ));
        }
        Ok(Self { name })
    }

    /// Create a logger named after the type `T`, e.g. `my_app::service::Billing`.
    ///
    /// Generic arguments are part of the name.
    pub fn for_type<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
        }
    }

    /// The target name of this logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return `true` if a record at `level` would be logged.
    pub fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(target: self.name.as_str(), level)
    }

    /// Log `args` at `level`.
    pub fn log(&self, level: Level, args: fmt::Arguments) {
        log::log!(target: self.name.as_str(), level, "{args}");
    }

    /// Log `args` at the error level.
    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args)
    }

    /// Log `args` at the warn level.
    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args)
    }

    /// Log `args` at the info level.
    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args)
    }

    /// Log `args` at the debug level.
    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }

    /// Log `args` at the trace level.
    pub fn trace(&self, args: fmt::Arguments) {
        self.log(Level::Trace, args)
    }
}

/// A component that accepts an injected logger.
pub trait LoggerAware {
    /// Bind `logger` to this component.
    fn set_logger(&mut self, logger: NamedLogger);
}

/// Injects a [`NamedLogger`] named after the component type into [`LoggerAware`] components.
///
/// # Examples
///
/// ```
/// use logforth_configurer::inject::InjectLogger;
/// use logforth_configurer::inject::LoggerAware;
/// use logforth_configurer::inject::NamedLogger;
///
/// #[derive(Default)]
/// struct Billing {
///     logger: Option<NamedLogger>,
/// }
///
/// impl LoggerAware for Billing {
///     fn set_logger(&mut self, logger: NamedLogger) {
///         self.logger = Some(logger);
///     }
/// }
///
/// let billing = InjectLogger.post_process(Billing::default());
/// assert!(billing.logger.unwrap().name().ends_with("Billing"));
/// ```
#[derive(Default, Debug, Clone, Copy)]
pub struct InjectLogger;

impl InjectLogger {
    /// Bind a logger named after `T` to `component`.
    pub fn post_process<T: LoggerAware>(&self, mut component: T) -> T {
        component.set_logger(NamedLogger::for_type::<T>());
        component
    }

    /// The ordering of this post-processor among others: the lowest precedence, so it runs
    /// last.
    pub fn order(&self) -> i32 {
        i32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Billing;

    #[test]
    fn empty_name_is_rejected() {
        let err = NamedLogger::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(NamedLogger::new("billing").unwrap().name(), "billing");
    }

    #[test]
    fn name_of_type() {
        assert_eq!(
            NamedLogger::for_type::<Billing>().name(),
            "logforth_configurer::inject::tests::Billing"
        );
    }

    #[test]
    fn lowest_precedence() {
        assert_eq!(InjectLogger.order(), i32::MAX);
    }
}
