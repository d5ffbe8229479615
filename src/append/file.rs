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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;
use log::Record;

use crate::append::Append;
use crate::layout::Layout;
use crate::layout::TextLayout;

/// An appender that writes log records to a single file.
///
/// Every record is flushed to the file as soon as it is written. The file is closed when the
/// appender is dropped.
///
/// # Examples
///
/// ```no_run
/// use logforth_configurer::append::SingleFile;
/// use logforth_configurer::layout::PatternLayout;
///
/// let file = SingleFile::new("logs/app.log", true)
///     .unwrap()
///     .with_layout(PatternLayout::new("%d %-5level %logger - %msg").unwrap());
/// ```
#[derive(Debug)]
pub struct SingleFile {
    path: PathBuf,
    layout: Box<dyn Layout>,
    writer: Mutex<File>,
}

impl SingleFile {
    /// Open `path` for logging, creating it and its parent directories when missing.
    ///
    /// Existing contents are kept when `append` is `true`, and truncated otherwise.
    pub fn new(path: impl Into<PathBuf>, append: bool) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let writer = options
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;

        Ok(Self {
            path,
            layout: Box::new(TextLayout::default().no_color()),
            writer: Mutex::new(writer),
        })
    }

    /// Sets the layout for the [`SingleFile`] appender.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// The path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Append for SingleFile {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}
