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

//! Filters for log records.

use std::fmt;

use log::LevelFilter;
use log::Metadata;
use log::Record;

pub use self::env_filter::EnvFilter;
pub use self::env_filter::EnvFilterBuilder;

pub mod env_filter;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Reject,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// A trait representing a filter that can be applied to log records.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Whether records with the given metadata can be logged at all.
    fn enabled(&self, metadata: &Metadata) -> FilterResult;

    /// Whether the given record should be logged.
    fn matches(&self, record: &Record) -> FilterResult {
        self.enabled(record.metadata())
    }
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A threshold filter: records more verbose than the level are rejected.
impl Filter for LevelFilter {
    fn enabled(&self, metadata: &Metadata) -> FilterResult {
        if metadata.level() <= *self {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}
