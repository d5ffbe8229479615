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

//! The logging configuration file format.
//!
//! A configuration is a TOML document:
//!
//! ```toml
//! [properties]
//! LOG_DIR = "/var/log/my_app"
//!
//! [appenders.console]
//! kind = "stdout"
//! threshold = "info"
//! layout = { kind = "pattern", pattern = "%d %-5level %logger{36} - %msg%n" }
//!
//! [appenders.file]
//! kind = "file"
//! path = "${LOG_DIR}/app.log"
//!
//! [root]
//! level = "debug"
//! appenders = ["console", "file"]
//!
//! [loggers]
//! "hyper" = "warn"
//! ```
//!
//! Appender kinds are `stdout`, `stderr`, `testing` and `file`. Layout kinds are `text`,
//! `pattern` and `json` (with the `layout-json` feature). `${NAME}` placeholders in paths,
//! patterns and levels are resolved against `[properties]` first, then against the property
//! source of the caller.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::Context;
use anyhow::bail;
use jiff::tz::TimeZone;
use log::LevelFilter;
use serde::Deserialize;

use crate::append;
use crate::append::Append;
use crate::context::Dispatch;
use crate::filter::EnvFilter;
use crate::filter::EnvFilterBuilder;
use crate::filter::Filter;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::layout::TextLayout;
use crate::placeholder::Chain;
use crate::placeholder::PropertySource;
use crate::placeholder::resolve_chained;

/// A parsed logging configuration.
///
/// # Examples
///
/// ```
/// use logforth_configurer::config::LoggingConfig;
/// use logforth_configurer::placeholder::SystemProperties;
///
/// let config = LoggingConfig::parse(
///     r#"
///     [appenders.console]
///     kind = "stderr"
///
///     [root]
///     level = "info"
///     appenders = ["console"]
///     "#,
/// )
/// .unwrap();
/// let dispatches = config.build(&SystemProperties).unwrap();
/// assert_eq!(dispatches.len(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    appenders: BTreeMap<String, AppenderConfig>,
    #[serde(default)]
    root: RootConfig,
    #[serde(default)]
    loggers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RootConfig {
    #[serde(default = "default_root_level")]
    level: String,
    #[serde(default)]
    appenders: Vec<String>,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            level: default_root_level(),
            appenders: vec![],
        }
    }
}

fn default_root_level() -> String {
    "debug".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppenderConfig {
    kind: AppenderKind,
    path: Option<String>,
    #[serde(default = "default_append")]
    append: bool,
    threshold: Option<String>,
    layout: Option<LayoutConfig>,
}

fn default_append() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AppenderKind {
    Stdout,
    Stderr,
    Testing,
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LayoutConfig {
    Text {
        #[serde(default)]
        no_color: bool,
        timezone: Option<String>,
    },
    Pattern {
        pattern: String,
        timezone: Option<String>,
    },
    #[cfg_attr(not(feature = "layout-json"), allow(dead_code))]
    Json {
        timezone: Option<String>,
    },
}

impl FromStr for LoggingConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoggingConfig::parse(s)
    }
}

impl LoggingConfig {
    /// Parse a TOML configuration document.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The names of the appenders attached to the root logger.
    pub fn root_appenders(&self) -> &[String] {
        &self.root.appenders
    }

    /// Build one [`Dispatch`] per root appender.
    ///
    /// Files of `file` appenders are opened here.
    pub fn build(&self, properties: &dyn PropertySource) -> anyhow::Result<Vec<Dispatch>> {
        let chain = Chain {
            first: &self.properties,
            second: properties,
        };
        let resolve = |text: &str| resolve_chained(text, &chain);

        let root_level = parse_level(&resolve(&self.root.level)?)?;
        let mut directives = Vec::with_capacity(self.loggers.len());
        for (target, level) in &self.loggers {
            let level = parse_level(&resolve(level)?)
                .with_context(|| format!("invalid level of logger [{target}]"))?;
            directives.push((target.as_str(), level));
        }

        let mut dispatches = Vec::with_capacity(self.root.appenders.len());
        for name in &self.root.appenders {
            let config = self
                .appenders
                .get(name)
                .with_context(|| format!("appender [{name}] is not defined"))?;

            let mut builder = EnvFilterBuilder::new().filter_level(root_level);
            for (target, level) in &directives {
                builder = builder.filter_module(target, *level);
            }
            let mut filters: Vec<Box<dyn Filter>> = vec![Box::new(EnvFilter::new(builder))];
            if let Some(threshold) = &config.threshold {
                let threshold = parse_level(&resolve(threshold)?)
                    .with_context(|| format!("invalid threshold of appender [{name}]"))?;
                filters.push(Box::new(threshold));
            }

            let append = build_appender(config, &resolve)
                .with_context(|| format!("failed to build appender [{name}]"))?;
            dispatches.push(Dispatch::new(filters, vec![append]));
        }

        Ok(dispatches)
    }
}

fn build_appender<F>(config: &AppenderConfig, resolve: &F) -> anyhow::Result<Box<dyn Append>>
where
    F: Fn(&str) -> Result<String, crate::Error>,
{
    let layout = match &config.layout {
        Some(layout) => build_layout(layout, resolve)?,
        None => match config.kind {
            AppenderKind::Stdout | AppenderKind::Stderr => Box::new(TextLayout::default()),
            AppenderKind::Testing | AppenderKind::File => {
                Box::new(TextLayout::default().no_color())
            }
        },
    };

    let append: Box<dyn Append> = match config.kind {
        AppenderKind::Stdout => Box::new(append::Stdout::default().with_layout(layout)),
        AppenderKind::Stderr => Box::new(append::Stderr::default().with_layout(layout)),
        AppenderKind::Testing => Box::new(append::Testing::default().with_layout(layout)),
        AppenderKind::File => {
            let path = config
                .path
                .as_deref()
                .context("a file appender requires a path")?;
            let path = resolve(path)?;
            Box::new(append::SingleFile::new(path, config.append)?.with_layout(layout))
        }
    };
    Ok(append)
}

fn build_layout<F>(config: &LayoutConfig, resolve: &F) -> anyhow::Result<Box<dyn Layout>>
where
    F: Fn(&str) -> Result<String, crate::Error>,
{
    let layout: Box<dyn Layout> = match config {
        LayoutConfig::Text { no_color, timezone } => {
            let mut layout = TextLayout::default();
            if *no_color {
                layout = layout.no_color();
            }
            if let Some(tz) = timezone {
                layout = layout.timezone(parse_timezone(tz)?);
            }
            Box::new(layout)
        }
        LayoutConfig::Pattern { pattern, timezone } => {
            let mut layout = PatternLayout::new(resolve(pattern)?)?;
            if let Some(tz) = timezone {
                layout = layout.timezone(parse_timezone(tz)?);
            }
            Box::new(layout)
        }
        #[cfg(feature = "layout-json")]
        LayoutConfig::Json { timezone } => {
            let mut layout = crate::layout::JsonLayout::default();
            if let Some(tz) = timezone {
                layout = layout.timezone(parse_timezone(tz)?);
            }
            Box::new(layout)
        }
        #[cfg(not(feature = "layout-json"))]
        LayoutConfig::Json { .. } => {
            bail!("the json layout requires the `layout-json` feature")
        }
    };
    Ok(layout)
}

fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    LevelFilter::from_str(level.trim()).with_context(|| format!("invalid level [{level}]"))
}

fn parse_timezone(name: &str) -> anyhow::Result<TimeZone> {
    if name.eq_ignore_ascii_case("utc") {
        return Ok(TimeZone::UTC);
    }
    match TimeZone::get(name) {
        Ok(tz) => Ok(tz),
        Err(err) => bail!("unknown timezone [{name}]: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use log::Level;
    use log::Log;
    use log::Record;
    use tempfile::TempDir;

    use super::*;
    use crate::context::LoggerContext;

    #[test]
    fn parse_and_build_file_appender() {
        let dir = TempDir::new().unwrap();
        let props = HashMap::from([(
            "LOG_DIR".to_string(),
            dir.path().display().to_string(),
        )]);

        let config = LoggingConfig::parse(
            r#"
            [properties]
            FILE_NAME = "app.log"

            [appenders.file]
            kind = "file"
            path = "${LOG_DIR}/${FILE_NAME}"
            layout = { kind = "pattern", pattern = "%-5level %logger - %msg%n" }

            [root]
            level = "info"
            appenders = ["file"]

            [loggers]
            "my_app::db" = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.root_appenders(), &["file".to_string()]);

        let context = LoggerContext::new("test");
        context.configure("inline", config.build(&props).unwrap());

        for (level, target, message) in [
            (Level::Info, "my_app", "kept"),
            (Level::Debug, "my_app", "dropped"),
            (Level::Trace, "my_app::db", "traced"),
        ] {
            context.log(
                &Record::builder()
                    .args(format_args!("{message}"))
                    .level(level)
                    .target(target)
                    .build(),
            );
        }
        context.reset();

        let text = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(text, "INFO  my_app - kept\nTRACE my_app::db - traced\n");
    }

    #[test]
    fn empty_document_has_no_dispatch() {
        let config = LoggingConfig::parse("").unwrap();
        assert!(config.build(&HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn threshold_and_layouts() {
        let config: LoggingConfig = r#"
            [appenders.out]
            kind = "testing"
            threshold = "warn"
            layout = { kind = "text", no_color = true, timezone = "UTC" }

            [appenders.err]
            kind = "stderr"

            [root]
            appenders = ["out", "err"]
            "#
        .parse()
        .unwrap();
        assert_eq!(config.build(&HashMap::new()).unwrap().len(), 2);
    }

    #[test]
    fn json_layout_follows_feature() {
        let config = LoggingConfig::parse(
            "[appenders.a]\nkind = 'stdout'\nlayout = { kind = 'json', timezone = 'utc' }\n[root]\nappenders = ['a']",
        )
        .unwrap();
        let result = config.build(&HashMap::<String, String>::new());
        if cfg!(feature = "layout-json") {
            assert_eq!(result.unwrap().len(), 1);
        } else {
            let err = result.unwrap_err();
            assert!(format!("{err:#}").contains("layout-json"), "{err:#}");
        }
    }

    #[test]
    fn reject_malformed_documents() {
        let props = HashMap::new();
        let build = |text: &str| LoggingConfig::parse(text).and_then(|c| c.build(&props));

        let cases = [
            "[root\nlevel = 'info'",
            "[root]\nlevel = 'info'\nextra = 1",
            "[root]\nappenders = ['missing']",
            "[root]\nlevel = 'loud'",
            "[appenders.a]\nkind = 'socket'\n[root]\nappenders = ['a']",
            "[appenders.a]\nkind = 'file'\n[root]\nappenders = ['a']",
            "[appenders.a]\nkind = 'stdout'\nthreshold = 'x'\n[root]\nappenders = ['a']",
            "[appenders.a]\nkind = 'stdout'\nlayout = { kind = 'pattern', pattern = '%bogus' }\n[root]\nappenders = ['a']",
            "[appenders.a]\nkind = 'stdout'\nlayout = { kind = 'text', timezone = 'Nowhere/Nothing' }\n[root]\nappenders = ['a']",
            "[loggers]\n'my_app' = 'verbose'",
            "[appenders.a]\nkind = 'stdout'\nlayout = { kind = 'pattern', pattern = '%d{%J} %msg' }\n[root]\nappenders = ['a']",
        ];
        for text in cases {
            assert!(build(text).is_err(), "{text}");
        }
    }
}
