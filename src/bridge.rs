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

//! Route the [`log`] crate facade into a [`ContextSelector`].

use std::sync::Arc;
use std::sync::OnceLock;

use crate::context::ContextSelector;

static BRIDGED: OnceLock<Arc<ContextSelector>> = OnceLock::new();

struct LogCrateProxy(());

impl log::Log for LogCrateProxy {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        match BRIDGED.get() {
            Some(selector) => log::Log::enabled(&*selector.logger_context(), metadata),
            None => false,
        }
    }

    fn log(&self, record: &log::Record) {
        if let Some(selector) = BRIDGED.get() {
            log::Log::log(&*selector.logger_context(), record);
        }
    }

    fn flush(&self) {
        if let Some(selector) = BRIDGED.get() {
            log::Log::flush(&*selector.logger_context());
        }
    }
}

/// The outcome of [`install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    /// The bridge has been installed by this call.
    Installed,
    /// The bridge was already installed. Records keep flowing to the selector it was installed
    /// with; `same_selector` tells whether that is the selector of this call.
    AlreadyInstalled { same_selector: bool },
    /// Another logger owns the `log` crate facade, so records are not bridged.
    OtherLoggerInstalled,
}

/// Install a `log` crate global logger that forwards every record to the current default context
/// of `selector`.
///
/// Installing more than once is harmless: later calls report
/// [`BridgeStatus::AlreadyInstalled`] and leave the first installation in place.
///
/// This function sets the global maximum log level to `Trace`; the contexts filter records
/// themselves.
pub fn install(selector: Arc<ContextSelector>) -> BridgeStatus {
    static LOGGER: LogCrateProxy = LogCrateProxy(());

    if let Some(current) = BRIDGED.get() {
        return BridgeStatus::AlreadyInstalled {
            same_selector: Arc::ptr_eq(current, &selector),
        };
    }

    match log::set_logger(&LOGGER) {
        Ok(()) => {
            let _ = BRIDGED.set(selector);
            log::set_max_level(log::LevelFilter::Trace);
            BridgeStatus::Installed
        }
        Err(_) => BridgeStatus::OtherLoggerInstalled,
    }
}

/// Return `true` if the bridge has been installed in this process.
pub fn is_installed() -> bool {
    BRIDGED.get().is_some()
}
