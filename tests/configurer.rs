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

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use logforth_configurer::Error;
use logforth_configurer::LoggingLifecycle;
use logforth_configurer::context::Configuration;
use logforth_configurer::context::StatusLevel;
use logforth_configurer::location::LocationResolver;
use logforth_configurer::resource::ResourceLoader;
use tempfile::TempDir;

fn resources() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources")
}

// a single test: the log crate facade and the default selector are process-wide
#[test]
fn test_init_and_shutdown_logging() {
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("configurer.log");
    let props = HashMap::from([("LOG_FILE".to_string(), log_file.display().to_string())]);
    let lifecycle = LoggingLifecycle::global()
        .with_loader(ResourceLoader::new().with_root(resources()))
        .with_properties(props);

    // shutdown before any initialization is a no-op
    lifecycle.shutdown_logging();

    let location = LocationResolver::default().resolve(module_path!(), None);
    assert_eq!(location, "classpath:/configurer/logforth-test.toml");
    lifecycle.init_logging(&location).unwrap();

    let context = lifecycle.selector().logger_context();
    assert_eq!(context.configuration(), Configuration::Custom(location.clone()));
    assert!(
        context
            .statuses()
            .iter()
            .any(|status| status.level == StatusLevel::Info && status.message.contains("bridge"))
    );

    log::debug!(target: "configurer", "something in DEBUG");
    log::info!(target: "configurer::quiet", "filtered out");
    log::warn!(target: "configurer::quiet", "kept");
    assert_eq!(
        fs::read_to_string(&log_file).unwrap(),
        "DEBUG configurer - something in DEBUG\nWARN  configurer::quiet - kept\n"
    );

    // a second initialization truncates the file and keeps the installed bridge
    lifecycle.init_logging(&location).unwrap();
    let context = lifecycle.selector().logger_context();
    assert!(
        context
            .statuses()
            .iter()
            .any(|status| status.level == StatusLevel::Warn && status.message.contains("bridge"))
    );
    log::debug!(target: "configurer", "after reinitialization");

    let err = lifecycle
        .init_logging("classpath:/configurer/missing.toml")
        .unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { .. }), "{err}");
    assert_eq!(context.configuration(), Configuration::Custom(location));
    log::debug!(target: "configurer", "still configured");

    lifecycle.shutdown_logging();
    log::debug!(target: "configurer", "after shutdown");
    lifecycle.shutdown_logging();

    let text = fs::read_to_string(&log_file).unwrap();
    assert_eq!(
        text,
        "DEBUG configurer - after reinitialization\nDEBUG configurer - still configured\n"
    );

    let err = lifecycle
        .init_logging("classpath:/configurer/broken.toml")
        .unwrap_err();
    assert!(matches!(err, Error::ConfigSyntax { .. }), "{err}");
    assert_eq!(
        lifecycle.selector().logger_context().configuration(),
        Configuration::Reset
    );
    lifecycle.shutdown_logging();
}
