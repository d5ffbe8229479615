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

//! Logging (re)initialization on behalf of a web application host.
//!
//! The host exposes its configuration through [`WebContext`]. The location of the logging
//! configuration is read from the [`CONFIG_LOCATION_PARAM`] init parameter. Locations that are
//! not URLs are resolved against the web application root.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::lifecycle::LoggingLifecycle;
use crate::location::is_url;
use crate::placeholder::PropertySource;
use crate::placeholder::resolve_placeholders;

/// The init parameter naming the logging configuration location.
pub const CONFIG_LOCATION_PARAM: &str = "logbackConfigLocation";

/// The host of a web application.
pub trait WebContext {
    /// Look up the init parameter `name`.
    fn init_parameter(&self, name: &str) -> Option<String>;

    /// Map a path relative to the web application root onto the file system.
    ///
    /// Return `None` if the application is not deployed on a file system.
    fn real_path(&self, path: &str) -> Option<PathBuf>;

    /// Write a message to the host log.
    fn log(&self, message: &str);
}

/// Resolve a configured location for the web application hosted by `ctx`.
///
/// URLs are returned as-is. Other locations have their placeholders resolved against
/// `properties` and are then mapped onto the file system by the host.
///
/// # Errors
///
/// Return [`Error::ResourceNotFound`] if the host cannot map the location onto the file system.
pub fn resolve_location(
    ctx: &dyn WebContext,
    location: &str,
    properties: &dyn PropertySource,
) -> Result<String, Error> {
    if is_url(location) {
        return Ok(location.to_string());
    }

    let location = resolve_placeholders(location, properties)?;
    let path = if location.starts_with('/') {
        location
    } else {
        format!("/{location}")
    };
    match ctx.real_path(&path) {
        Some(real) => Ok(real.display().to_string()),
        None => Err(Error::resource_not_found(
            path,
            "the web application is not deployed on a file system",
        )),
    }
}

/// Initializes and shuts down logging for a web application.
#[derive(Debug)]
pub struct WebConfigurer {
    lifecycle: LoggingLifecycle,
}

impl Default for WebConfigurer {
    fn default() -> Self {
        Self::new(LoggingLifecycle::global())
    }
}

impl WebConfigurer {
    /// Create a configurer that drives `lifecycle`.
    pub fn new(lifecycle: LoggingLifecycle) -> Self {
        Self { lifecycle }
    }

    /// The underlying lifecycle.
    pub fn lifecycle(&self) -> &LoggingLifecycle {
        &self.lifecycle
    }

    /// Initialize logging from the location configured for `ctx`.
    ///
    /// The location is read from the [`CONFIG_LOCATION_PARAM`] init parameter, then from the
    /// property source of the lifecycle. Without a configured location, the current
    /// configuration is kept.
    ///
    /// # Errors
    ///
    /// Return [`Error::InvalidParameter`] if the location cannot be read, or
    /// [`Error::Unexpected`] if the configuration fails for another reason.
    pub fn init_logging(&self, ctx: &dyn WebContext) -> Result<(), Error> {
        let location = ctx
            .init_parameter(CONFIG_LOCATION_PARAM)
            .or_else(|| self.lifecycle.properties().property(CONFIG_LOCATION_PARAM));
        let Some(location) = location else {
            return Ok(());
        };

        let result = resolve_location(ctx, &location, self.lifecycle.properties())
            .and_then(|resolved| {
                ctx.log(&format!("Initializing logging from [{resolved}]"));
                self.lifecycle.init_logging(&resolved)
            });

        result.map_err(|err| match err {
            Error::ResourceNotFound { .. } => Error::InvalidParameter {
                param: CONFIG_LOCATION_PARAM,
                message: format!("invalid location [{location}]: {err}"),
            },
            err => Error::Unexpected(Box::new(err)),
        })
    }

    /// Shut down logging for the web application hosted by `ctx`.
    pub fn shutdown_logging(&self, ctx: &dyn WebContext) {
        ctx.log("Shutting down logging");
        self.lifecycle.shutdown_logging();
    }
}

/// Ties logging to the start and stop of a web application.
///
/// Register it with the host so that logging is initialized before anything else starts, and
/// shut down after everything else stopped.
#[derive(Debug, Default)]
pub struct WebConfigListener {
    configurer: WebConfigurer,
}

impl WebConfigListener {
    /// Create a listener that drives `configurer`.
    pub fn new(configurer: WebConfigurer) -> Self {
        Self { configurer }
    }

    /// Called by the host when the application starts.
    pub fn context_initialized(&self, ctx: &dyn WebContext) -> Result<(), Error> {
        self.configurer.init_logging(ctx)
    }

    /// Called by the host when the application stops.
    pub fn context_destroyed(&self, ctx: &dyn WebContext) {
        self.configurer.shutdown_logging(ctx)
    }
}

/// A [`WebContext`] for an application deployed in a directory.
///
/// Host log messages are written to stderr and kept for inspection.
#[derive(Debug)]
pub struct DirectoryWebContext {
    root: PathBuf,
    params: BTreeMap<String, String>,
    messages: Mutex<Vec<String>>,
}

impl DirectoryWebContext {
    /// Create a context for the application deployed in `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            params: BTreeMap::new(),
            messages: Mutex::new(vec![]),
        }
    }

    /// Set the init parameter `name`.
    pub fn with_init_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The directory the application is deployed in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The messages written to the host log so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WebContext for DirectoryWebContext {
    fn init_parameter(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }

    fn real_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.root.join(path.trim_start_matches('/')))
    }

    fn log(&self, message: &str) {
        eprintln!("{message}");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Detached;

    impl WebContext for Detached {
        fn init_parameter(&self, _: &str) -> Option<String> {
            None
        }

        fn real_path(&self, _: &str) -> Option<PathBuf> {
            None
        }

        fn log(&self, _: &str) {}
    }

    #[test]
    fn urls_pass_through() {
        let props = HashMap::new();
        for location in ["classpath:/a/logging.toml", "file:/etc/logging.toml"] {
            assert_eq!(resolve_location(&Detached, location, &props).unwrap(), location);
        }
    }

    #[test]
    fn paths_are_mapped_onto_the_root() {
        let ctx = DirectoryWebContext::new("/srv/app");
        let props = HashMap::from([("ENV".to_string(), "prod".to_string())]);
        assert_eq!(
            resolve_location(&ctx, "WEB-INF/${ENV}.toml", &props).unwrap(),
            "/srv/app/WEB-INF/prod.toml"
        );
        assert_eq!(
            resolve_location(&ctx, "/WEB-INF/logging.toml", &props).unwrap(),
            "/srv/app/WEB-INF/logging.toml"
        );
    }

    #[test]
    fn unmapped_path_is_not_found() {
        let err = resolve_location(&Detached, "WEB-INF/logging.toml", &HashMap::new()).unwrap_err();
        match err {
            Error::ResourceNotFound { location, .. } => {
                assert_eq!(location, "/WEB-INF/logging.toml")
            }
            err => panic!("unexpected error: {err}"),
        }
    }
}
