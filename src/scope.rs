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

//! Logging scoped to a test.
//!
//! ```
//! use std::sync::Arc;
//!
//! use logforth_configurer::context::ContextSelector;
//! use logforth_configurer::lifecycle::LoggingLifecycle;
//! use logforth_configurer::resource::ResourceLoader;
//! use logforth_configurer::scope::LoggingMarker;
//! use logforth_configurer::scope::LoggingScope;
//!
//! struct BillingTest;
//!
//! impl LoggingMarker for BillingTest {
//!     const LOCATION: &'static str = "/billing/logging.toml";
//! }
//!
//! let loader = ResourceLoader::new().with_embedded("billing/logging.toml", "[root]\n");
//! let lifecycle = LoggingLifecycle::new(Arc::new(ContextSelector::new()))
//!     .with_loader(loader)
//!     .with_log_bridge(false);
//!
//! let scope = LoggingScope::enter::<BillingTest>(&lifecycle).unwrap();
//! assert_eq!(scope.location(), Some("classpath:/billing/logging.toml"));
//! drop(scope);
//! ```

use crate::Error;
use crate::lifecycle::LoggingLifecycle;
use crate::location::LocationResolver;

/// Marks a test type whose scope configures logging.
pub trait LoggingMarker {
    /// The configuration location.
    ///
    /// Relative locations are resolved against the package of the implementing type. Empty
    /// means the default resource name in that package.
    const LOCATION: &'static str = "";
}

/// Shuts down logging when dropped.
#[derive(Debug)]
#[must_use = "logging is shut down when the scope is dropped"]
pub struct LoggingScope<'a> {
    lifecycle: &'a LoggingLifecycle,
    location: Option<String>,
}

impl<'a> LoggingScope<'a> {
    /// Initialize logging for the marked type `T`.
    pub fn enter<T: LoggingMarker>(lifecycle: &'a LoggingLifecycle) -> Result<Self, Error> {
        Self::enter_with::<T>(lifecycle, &LocationResolver::default())
    }

    /// Initialize logging for the marked type `T`, resolving its location with `resolver`.
    ///
    /// Logging is shut down if the initialization fails.
    pub fn enter_with<T: LoggingMarker>(
        lifecycle: &'a LoggingLifecycle,
        resolver: &LocationResolver,
    ) -> Result<Self, Error> {
        // dropped on failure, which shuts logging down
        let mut scope = Self::unmarked(lifecycle);
        let location = resolver.resolve_for::<T>(Some(T::LOCATION));
        lifecycle.init_logging(&location)?;
        scope.location = Some(location);
        Ok(scope)
    }

    /// A scope for an unmarked test: logging is left as is, and still shut down on drop.
    pub fn unmarked(lifecycle: &'a LoggingLifecycle) -> Self {
        Self {
            lifecycle,
            location: None,
        }
    }

    /// The location logging was initialized from, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Drop for LoggingScope<'_> {
    fn drop(&mut self) {
        self.lifecycle.shutdown_logging();
    }
}
