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

//! (Re)initialization and shutdown of a logging context.

use std::sync::Arc;

use crate::Error;
use crate::bridge;
use crate::bridge::BridgeStatus;
use crate::config::LoggingConfig;
use crate::context::ContextSelector;
use crate::context::LoggerContext;
use crate::context::StatusLevel;
use crate::placeholder::PropertySource;
use crate::placeholder::SystemProperties;
use crate::placeholder::resolve_placeholders;
use crate::resource::ResourceLoader;

/// Points the default context of a [`ContextSelector`] at configuration resources.
///
/// Calls are expected to be serialized by the caller, typically at process start and shutdown,
/// or once per test scope.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logforth_configurer::context::ContextSelector;
/// use logforth_configurer::lifecycle::LoggingLifecycle;
/// use logforth_configurer::resource::ResourceLoader;
///
/// let loader = ResourceLoader::new().with_embedded(
///     "my_app/logging.toml",
///     "[appenders.err]\nkind = 'stderr'\n[root]\nappenders = ['err']\n",
/// );
/// let lifecycle = LoggingLifecycle::new(Arc::new(ContextSelector::new()))
///     .with_loader(loader)
///     .with_log_bridge(false);
///
/// lifecycle.init_logging("classpath:/my_app/logging.toml").unwrap();
/// lifecycle.shutdown_logging();
/// ```
#[derive(Debug)]
pub struct LoggingLifecycle {
    selector: Arc<ContextSelector>,
    loader: ResourceLoader,
    properties: Box<dyn PropertySource>,
    log_bridge: bool,
}

impl LoggingLifecycle {
    /// Create a lifecycle for `selector`.
    ///
    /// Resources are loaded with [`ResourceLoader::from_env`], placeholders are resolved with
    /// [`SystemProperties`], and the `log` crate bridge is installed on initialization.
    pub fn new(selector: Arc<ContextSelector>) -> Self {
        Self {
            selector,
            loader: ResourceLoader::from_env(),
            properties: Box::new(SystemProperties),
            log_bridge: true,
        }
    }

    /// Create a lifecycle for the process-wide selector.
    pub fn global() -> Self {
        Self::new(ContextSelector::global())
    }

    /// Set the loader of configuration resources.
    pub fn with_loader(mut self, loader: ResourceLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Set the source of placeholder values.
    pub fn with_properties(mut self, properties: impl PropertySource) -> Self {
        self.properties = Box::new(properties);
        self
    }

    /// Whether to install the `log` crate bridge on initialization. Default to `true`.
    pub fn with_log_bridge(mut self, log_bridge: bool) -> Self {
        self.log_bridge = log_bridge;
        self
    }

    /// The selector whose default context this lifecycle manages.
    pub fn selector(&self) -> &Arc<ContextSelector> {
        &self.selector
    }

    /// The source of placeholder values.
    pub fn properties(&self) -> &dyn PropertySource {
        &*self.properties
    }

    /// Reset the default context and configure it from the resource at `location`.
    ///
    /// `${name}` placeholders in `location` are resolved first. A missing resource leaves the
    /// context untouched. A malformed resource leaves the context reset.
    ///
    /// # Errors
    ///
    /// Return [`Error::ResourceNotFound`] if nothing readable exists at `location`, or
    /// [`Error::ConfigSyntax`] if the resource is not a valid configuration.
    pub fn init_logging(&self, location: &str) -> Result<(), Error> {
        let location = resolve_placeholders(location, self.properties())?;
        let resource = self.loader.load(&location)?;

        let context = self.selector.logger_context();
        // the context configures itself on creation
        context.reset();

        let dispatches = LoggingConfig::parse(resource.contents())
            .and_then(|config| config.build(self.properties()))
            .map_err(|err| Error::config_syntax(&location, err))?;
        context.configure(location, dispatches);

        if self.log_bridge {
            self.install_log_bridge(&context);
        }
        Ok(())
    }

    /// Detach the default context from the selector and reset it.
    ///
    /// Safe to call without a prior [`init_logging`](Self::init_logging), and more than once.
    pub fn shutdown_logging(&self) {
        let context = self.selector.logger_context();
        if let Some(detached) = self.selector.detach_logger_context(context.name()) {
            detached.reset();
        }
    }

    fn install_log_bridge(&self, context: &LoggerContext) {
        match bridge::install(self.selector.clone()) {
            BridgeStatus::Installed => {
                context.add_status(StatusLevel::Info, "log crate bridge installed");
            }
            BridgeStatus::AlreadyInstalled { same_selector: true } => {
                context.add_status(StatusLevel::Warn, "log crate bridge already installed");
            }
            BridgeStatus::AlreadyInstalled {
                same_selector: false,
            } => {
                context.add_status(
                    StatusLevel::Warn,
                    "log crate bridge already installed for another selector",
                );
            }
            BridgeStatus::OtherLoggerInstalled => {
                context.add_status(
                    StatusLevel::Warn,
                    "another logger owns the log crate facade; records are not bridged",
                );
            }
        }
    }
}

/// Configure the process-wide logging context from the resource at `location`.
///
/// See [`LoggingLifecycle::init_logging`].
pub fn init_logging(location: &str) -> Result<(), Error> {
    LoggingLifecycle::global().init_logging(location)
}

/// Shut down the process-wide logging context.
///
/// See [`LoggingLifecycle::shutdown_logging`].
pub fn shutdown_logging() {
    LoggingLifecycle::global().shutdown_logging()
}
