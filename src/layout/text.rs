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

use jiff::Zoned;
use jiff::tz::TimeZone;
use log::Record;

use crate::layout::KvDisplay;
use crate::layout::Layout;

/// A layout that formats log record as text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172105+08:00 ERROR my_app::server: src/server.rs:51 Hello error!
/// 2024-08-11T22:44:57.172219+08:00  WARN my_app::server: src/server.rs:52 Hello warn!
/// 2024-08-11T22:44:57.172276+08:00  INFO my_app::server: src/server.rs:53 Hello info!
/// ```
///
/// With the `colored` feature enabled, log levels are colored unless [`TextLayout::no_color`] is
/// set.
///
/// You can customize the timezone of the timestamp with [`TextLayout::timezone`]. Otherwise, the
/// system timezone is used.
#[derive(Default, Debug, Clone)]
pub struct TextLayout {
    no_color: bool,
    tz: Option<TimeZone>,
}

impl TextLayout {
    /// Disable colored log levels.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// Sets the timezone for timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record) -> anyhow::Result<Vec<u8>> {
        let time = match self.tz.clone() {
            Some(tz) => Zoned::now().with_time_zone(tz),
            None => Zoned::now(),
        }
        .strftime("%Y-%m-%dT%H:%M:%S.%6f%:z");
        let level = level_text(self.no_color, record.level());
        let target = record.target();
        let file = record.file().unwrap_or_default();
        let line = record.line().unwrap_or_default();
        let message = record.args();
        let kvs = KvDisplay::new(record.key_values());

        Ok(format!("{time} {level:>5} {target}: {file}:{line} {message}{kvs}").into_bytes())
    }
}

#[cfg(feature = "colored")]
fn level_text(no_color: bool, level: log::Level) -> colored::ColoredString {
    use colored::Color;
    use colored::ColoredString;
    use colored::Colorize;

    let text = ColoredString::from(level.as_str());
    if no_color {
        return text;
    }

    let color = match level {
        log::Level::Error => Color::Red,
        log::Level::Warn => Color::Yellow,
        log::Level::Info => Color::Green,
        log::Level::Debug => Color::Blue,
        log::Level::Trace => Color::Magenta,
    };
    text.color(color)
}

#[cfg(not(feature = "colored"))]
fn level_text(_: bool, level: log::Level) -> &'static str {
    level.as_str()
}
