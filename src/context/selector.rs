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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::context::LoggerContext;

/// Name of the context a [`ContextSelector`] hands out by default.
pub const DEFAULT_CONTEXT_NAME: &str = "default";

/// A registry of named [`LoggerContext`]s.
///
/// The selector hands out its default context, creating it with the default configuration on
/// first use and again after it has been detached.
///
/// # Examples
///
/// ```
/// use logforth_configurer::context::ContextSelector;
///
/// let selector = ContextSelector::new();
/// let context = selector.logger_context();
/// let detached = selector.detach_logger_context(context.name()).unwrap();
/// detached.reset();
/// assert!(selector.context_names().is_empty());
/// ```
#[derive(Debug)]
pub struct ContextSelector {
    default_name: String,
    contexts: Mutex<BTreeMap<String, Arc<LoggerContext>>>,
}

impl Default for ContextSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextSelector {
    /// Create an empty selector whose default context is named [`DEFAULT_CONTEXT_NAME`].
    pub fn new() -> Self {
        Self::with_default_name(DEFAULT_CONTEXT_NAME)
    }

    /// Create an empty selector whose default context is named `name`.
    pub fn with_default_name(name: impl Into<String>) -> Self {
        Self {
            default_name: name.into(),
            contexts: Mutex::new(BTreeMap::new()),
        }
    }

    /// The process-wide selector.
    pub fn global() -> Arc<ContextSelector> {
        static GLOBAL: LazyLock<Arc<ContextSelector>> =
            LazyLock::new(|| Arc::new(ContextSelector::new()));
        GLOBAL.clone()
    }

    /// The default context, created on demand.
    pub fn logger_context(&self) -> Arc<LoggerContext> {
        self.logger_context_named(&self.default_name)
    }

    /// The context named `name`, created on demand.
    pub fn logger_context_named(&self, name: &str) -> Arc<LoggerContext> {
        self.contexts()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoggerContext::new(name)))
            .clone()
    }

    /// Remove the context named `name` from this selector and return it.
    ///
    /// The context itself is left untouched. Return `None` if no such context exists.
    pub fn detach_logger_context(&self, name: &str) -> Option<Arc<LoggerContext>> {
        self.contexts().remove(name)
    }

    /// The names of the registered contexts, in order.
    pub fn context_names(&self) -> Vec<String> {
        self.contexts().keys().cloned().collect()
    }

    fn contexts(&self) -> MutexGuard<'_, BTreeMap<String, Arc<LoggerContext>>> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
