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

//! Initialize and re-initialize logging from configuration file locations.
//!
//! # Overview
//!
//! A configuration location is resolved against a reference type (see
//! [`location::LocationResolver`]), loaded as a TOML resource (see [`config`]), and applied to the
//! default [`context::LoggerContext`] of a [`context::ContextSelector`]. Records emitted through
//! the `log` crate facade are bridged into that context.
//!
//! # Examples
//!
//! ```no_run
//! logforth_configurer::init_logging("classpath:/my_app/logging.toml").unwrap();
//!
//! log::info!("This is an info message.");
//!
//! logforth_configurer::shutdown_logging();
//! ```
//!
//! Scoped to a test:
//!
//! ```no_run
//! use logforth_configurer::LoggingLifecycle;
//! use logforth_configurer::scope::LoggingMarker;
//! use logforth_configurer::scope::LoggingScope;
//!
//! struct BillingTest;
//!
//! // loads `classpath:/<package of BillingTest>/logforth-test.toml`
//! impl LoggingMarker for BillingTest {}
//!
//! let lifecycle = LoggingLifecycle::global();
//! let _scope = LoggingScope::enter::<BillingTest>(&lifecycle).unwrap();
//! log::debug!("something in DEBUG");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod config;
pub mod context;
pub mod filter;
pub mod inject;
pub mod layout;
pub mod lifecycle;
pub mod location;
pub mod placeholder;
pub mod resource;
pub mod scope;
pub mod web;

pub use append::Append;
pub use filter::Filter;
pub use layout::Layout;
pub use lifecycle::LoggingLifecycle;
pub use lifecycle::init_logging;
pub use lifecycle::shutdown_logging;

mod error;
pub use error::Error;
