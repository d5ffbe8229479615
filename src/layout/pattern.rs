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

use std::borrow::Cow;
use std::fmt::Write;

use anyhow::Context;
use anyhow::bail;
use jiff::Timestamp;
use jiff::Zoned;
use jiff::tz::TimeZone;
use log::Record;

use crate::layout::KvDisplay;
use crate::layout::Layout;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%3f";

/// A layout that formats log records according to a conversion pattern.
///
/// A pattern is literal text mixed with conversions of the form
/// `%[-][min][.max]word[{option}]`:
///
/// | word | output |
/// |---|---|
/// | `d`, `date` | timestamp, the option is a `strftime` format |
/// | `p`, `le`, `level` | level |
/// | `c`, `lo`, `logger`, `target` | target, the option abbreviates it to a maximum length |
/// | `m`, `msg`, `message` | message |
/// | `module` | module path |
/// | `F`, `file` | file |
/// | `L`, `line` | line |
/// | `t`, `thread` | thread name |
/// | `kv` | key-values as `key=value` |
/// | `n` | line separator |
///
/// `%%` is a literal percent sign. `-` left aligns within `min` characters, `.max` truncates from
/// the start. A trailing `%n` is implied by the appenders and dropped.
///
/// # Examples
///
/// ```
/// use logforth_configurer::layout::PatternLayout;
///
/// let layout = PatternLayout::new("%-5level %logger{10} - %msg%n").unwrap();
/// assert!(PatternLayout::new("%nope").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    tokens: Vec<Token>,
    tz: Option<TimeZone>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Conversion(Conversion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Conversion {
    word: Word,
    left_align: bool,
    min_width: Option<usize>,
    max_width: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Word {
    Date(String),
    Level,
    Logger(Option<usize>),
    Message,
    Module,
    File,
    Line,
    Thread,
    Kvs,
    Newline,
}

impl PatternLayout {
    /// Parse `pattern` into a layout.
    ///
    /// # Errors
    ///
    /// Return an error if the pattern contains an unknown conversion word or a malformed option.
    pub fn new(pattern: impl Into<String>) -> anyhow::Result<Self> {
        let pattern = pattern.into();
        let mut tokens = parse(&pattern).with_context(|| format!("invalid pattern [{pattern}]"))?;
        if matches!(
            tokens.last(),
            Some(Token::Conversion(Conversion {
                word: Word::Newline,
                ..
            }))
        ) {
            tokens.pop();
        }

        Ok(Self {
            pattern,
            tokens,
            tz: None,
        })
    }

    /// Sets the timezone for timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// The pattern this layout was parsed from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &Record) -> anyhow::Result<Vec<u8>> {
        let mut text = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(literal) => text.push_str(literal),
                Token::Conversion(conversion) => {
                    let value = self.convert(&conversion.word, record)?;
                    write_padded(&mut text, &value, conversion);
                }
            }
        }
        Ok(text.into_bytes())
    }
}

impl PatternLayout {
    fn convert<'a>(&self, word: &Word, record: &'a Record) -> anyhow::Result<Cow<'a, str>> {
        let value = match word {
            Word::Date(format) => {
                let now = match self.tz.clone() {
                    Some(tz) => Zoned::now().with_time_zone(tz),
                    None => Zoned::now(),
                };
                Cow::Owned(jiff::fmt::strtime::format(format, &now)?)
            }
            Word::Level => Cow::Borrowed(record.level().as_str()),
            Word::Logger(None) => Cow::Borrowed(record.target()),
            Word::Logger(Some(len)) => abbreviate(record.target(), *len),
            Word::Message => Cow::Owned(record.args().to_string()),
            Word::Module => Cow::Borrowed(record.module_path().unwrap_or_default()),
            Word::File => Cow::Borrowed(record.file().unwrap_or_default()),
            Word::Line => match record.line() {
                Some(line) => Cow::Owned(line.to_string()),
                None => Cow::Borrowed("?"),
            },
            Word::Thread => {
                let thread = std::thread::current();
                Cow::Owned(thread.name().unwrap_or("unnamed").to_string())
            }
            Word::Kvs => {
                let kvs = KvDisplay::new(record.key_values()).to_string();
                Cow::Owned(kvs.trim_start().to_string())
            }
            Word::Newline => Cow::Borrowed("\n"),
        };
        Ok(value)
    }
}

fn write_padded(text: &mut String, value: &str, conversion: &Conversion) {
    let mut value = value;
    if let Some(max) = conversion.max_width {
        let len = value.chars().count();
        if len > max {
            let skip = value
                .char_indices()
                .nth(len - max)
                .map(|(idx, _)| idx)
                .unwrap_or(value.len());
            value = &value[skip..];
        }
    }

    let width = conversion.min_width.unwrap_or(0);
    // writing into a String never fails
    let _ = if conversion.left_align {
        write!(text, "{value:<width$}")
    } else {
        write!(text, "{value:>width$}")
    };
}

/// Shorten a `::` separated target to at most `max` characters.
///
/// Leading segments are cut to their first character, left to right, until the target fits. The
/// last segment is always kept whole, so the result may still be longer than `max`. A `max` of
/// zero keeps only the last segment.
fn abbreviate(target: &str, max: usize) -> Cow<'_, str> {
    let segments: Vec<&str> = target.split("::").collect();
    let Some((&last, leading)) = segments.split_last() else {
        return Cow::Borrowed(target);
    };

    if max == 0 {
        return Cow::Borrowed(last);
    }
    if target.len() <= max {
        return Cow::Borrowed(target);
    }

    let mut len = target.len();
    let mut parts = Vec::with_capacity(segments.len());
    for &segment in leading {
        match segment.chars().next() {
            Some(first) if len > max => {
                len -= segment.len() - first.len_utf8();
                parts.push(&segment[..first.len_utf8()]);
            }
            _ => parts.push(segment),
        }
    }
    parts.push(last);
    Cow::Owned(parts.join("::"))
}

fn parse(pattern: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        if let Some((_, '%')) = chars.peek() {
            chars.next();
            literal.push('%');
            continue;
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let left_align = chars.next_if(|(_, c)| *c == '-').is_some();
        let min_width = take_number(&mut chars)?;
        let max_width = match chars.next_if(|(_, c)| *c == '.') {
            Some(_) => Some(
                take_number(&mut chars)?
                    .with_context(|| format!("missing maximum width at position {pos}"))?,
            ),
            None => None,
        };

        let mut word = String::new();
        while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_alphabetic()) {
            word.push(c);
        }
        if word.is_empty() {
            bail!("missing conversion word at position {pos}");
        }

        let option = match chars.next_if(|(_, c)| *c == '{') {
            Some(_) => {
                let mut option = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => option.push(c),
                        None => bail!("unterminated option of [%{word}] at position {pos}"),
                    }
                }
                Some(option)
            }
            None => None,
        };

        let word = match word.as_str() {
            "d" | "date" => {
                let format = option.unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
                check_date_format(&format)
                    .with_context(|| format!("invalid date format of [%{word}] at position {pos}"))?;
                Word::Date(format)
            }
            "p" | "le" | "level" => Word::Level,
            "c" | "lo" | "logger" | "target" => match option {
                Some(len) => {
                    let len = len
                        .trim()
                        .parse()
                        .with_context(|| format!("invalid length [{len}] of [%{word}]"))?;
                    Word::Logger(Some(len))
                }
                None => Word::Logger(None),
            },
            "m" | "msg" | "message" => Word::Message,
            "module" => Word::Module,
            "F" | "file" => Word::File,
            "L" | "line" => Word::Line,
            "t" | "thread" => Word::Thread,
            "kv" => Word::Kvs,
            "n" => Word::Newline,
            word => bail!("unknown conversion word [%{word}] at position {pos}"),
        };

        tokens.push(Token::Conversion(Conversion {
            word,
            left_align,
            min_width,
            max_width,
        }));
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn check_date_format(format: &str) -> anyhow::Result<()> {
    let sample = Timestamp::UNIX_EPOCH.to_zoned(TimeZone::UTC);
    jiff::fmt::strtime::format(format, &sample)?;
    Ok(())
}

fn take_number<I>(chars: &mut std::iter::Peekable<I>) -> anyhow::Result<Option<usize>>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut digits = String::new();
    while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
        digits.push(c);
    }
    if digits.is_empty() {
        return Ok(None);
    }
    Ok(Some(digits.parse()?))
}
