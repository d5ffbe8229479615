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

/// The error type of logging (re)initialization.
///
/// Every variant is terminal for the initialization attempt that raised it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolved location does not point to an existing, readable resource.
    #[error("resource [{location}] cannot be read: {reason}")]
    ResourceNotFound { location: String, reason: String },
    /// The resource exists but is not a valid logging configuration.
    #[error("failed to configure logging from [{location}]: {source:#}")]
    ConfigSyntax {
        location: String,
        #[source]
        source: anyhow::Error,
    },
    /// A precondition on an argument was violated.
    #[error("{0}")]
    InvalidArgument(String),
    /// A host supplied configuration parameter points to an unusable location.
    #[error("invalid '{param}' parameter: {message}")]
    InvalidParameter { param: &'static str, message: String },
    /// An unexpected failure while configuring logging on behalf of a host.
    #[error("unexpected error while configuring logging")]
    Unexpected(#[source] Box<Error>),
}

impl Error {
    pub(crate) fn resource_not_found(location: impl Into<String>, reason: impl ToString) -> Self {
        Error::ResourceNotFound {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config_syntax(location: impl Into<String>, source: anyhow::Error) -> Self {
        Error::ConfigSyntax {
            location: location.into(),
            source,
        }
    }
}
