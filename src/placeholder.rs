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

//! `${name}` placeholder substitution.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::Error;

// innermost placeholder: `${name}` or `${name:default}` without a nested `${`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^${}:]+)(?::([^${}]*))?\}").expect("placeholder pattern is valid")
});

/// A source of named properties for placeholder substitution.
pub trait PropertySource: fmt::Debug + Send + Sync + 'static {
    /// Look up the value of the property `name`.
    fn property(&self, name: &str) -> Option<String>;
}

/// Process-wide properties, read from the environment variables of the current process.
#[derive(Default, Debug, Clone, Copy)]
pub struct SystemProperties;

impl PropertySource for SystemProperties {
    fn property(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<P: PropertySource + ?Sized> PropertySource for Box<P> {
    fn property(&self, name: &str) -> Option<String> {
        (**self).property(name)
    }
}

/// Looks up `first`, then `second`.
#[derive(Debug)]
pub(crate) struct Chain<'a> {
    pub(crate) first: &'a dyn PropertySource,
    pub(crate) second: &'a dyn PropertySource,
}

impl Chain<'_> {
    fn property(&self, name: &str) -> Option<String> {
        self.first
            .property(name)
            .or_else(|| self.second.property(name))
    }
}

/// Replace `${name}` and `${name:default}` placeholders in `text` with values from `source`.
///
/// Placeholders nested in names or in resolved values are resolved as well. A placeholder
/// without a value and without a default is left untouched.
///
/// # Errors
///
/// Return [`Error::InvalidArgument`] if the placeholders refer to each other in a cycle.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use logforth_configurer::placeholder::resolve_placeholders;
///
/// let props = HashMap::from([("APP".to_string(), "billing".to_string())]);
/// let text = resolve_placeholders("/var/log/${APP}/${LEVEL:info}.log", &props).unwrap();
/// assert_eq!(text, "/var/log/billing/info.log");
/// ```
pub fn resolve_placeholders(text: &str, source: &dyn PropertySource) -> Result<String, Error> {
    resolve_with(text, |name| source.property(name))
}

pub(crate) fn resolve_chained(text: &str, chain: &Chain) -> Result<String, Error> {
    resolve_with(text, |name| chain.property(name))
}

fn resolve_with<F>(text: &str, lookup: F) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains("${") {
        return Ok(text.to_string());
    }

    let mut seen = HashSet::new();
    let mut current = text.to_string();
    loop {
        if !seen.insert(current.clone()) {
            return Err(Error::InvalidArgument(format!(
                "circular placeholder reference in [{text}]"
            )));
        }

        let next = PLACEHOLDER.replace_all(&current, |caps: &Captures| {
            match lookup(&caps[1]) {
                Some(value) => value,
                None => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => caps[0].to_string(),
                },
            }
        });

        if next == current {
            return Ok(current);
        }
        current = next.into_owned();
    }
}
