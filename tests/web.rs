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
use std::sync::Arc;

use log::Level;
use log::Log;
use log::Record;
use logforth_configurer::Error;
use logforth_configurer::LoggingLifecycle;
use logforth_configurer::context::Configuration;
use logforth_configurer::context::ContextSelector;
use logforth_configurer::web::CONFIG_LOCATION_PARAM;
use logforth_configurer::web::DirectoryWebContext;
use logforth_configurer::web::WebConfigListener;
use logforth_configurer::web::WebConfigurer;
use tempfile::TempDir;

const CONFIG: &str = r#"
[appenders.file]
kind = "file"
path = "${WEB_APP_ROOT}/WEB-INF/logs/app.log"
layout = { kind = "pattern", pattern = "%level %msg" }

[root]
appenders = ["file"]
"#;

fn deploy(config: &str) -> TempDir {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("WEB-INF")).unwrap();
    fs::write(root.path().join("WEB-INF/logging.toml"), config).unwrap();
    root
}

fn configurer(root: &TempDir) -> WebConfigurer {
    let props = HashMap::from([(
        "WEB_APP_ROOT".to_string(),
        root.path().display().to_string(),
    )]);
    WebConfigurer::new(
        LoggingLifecycle::new(Arc::new(ContextSelector::new()))
            .with_properties(props)
            .with_log_bridge(false),
    )
}

#[test]
fn test_listener_initializes_and_shuts_down() {
    let root = deploy(CONFIG);
    let ctx = DirectoryWebContext::new(root.path())
        .with_init_parameter(CONFIG_LOCATION_PARAM, "WEB-INF/logging.toml");
    let listener = WebConfigListener::new(configurer(&root));

    listener.context_initialized(&ctx).unwrap();

    let real_path = root.path().join("WEB-INF/logging.toml").display().to_string();
    assert_eq!(
        ctx.messages(),
        vec![format!("Initializing logging from [{real_path}]")]
    );

    listener.context_destroyed(&ctx);
    assert_eq!(ctx.messages().last().unwrap(), "Shutting down logging");
}

#[test]
fn test_records_reach_the_configured_file() {
    let root = deploy(CONFIG);
    let ctx = DirectoryWebContext::new(root.path())
        .with_init_parameter(CONFIG_LOCATION_PARAM, "/WEB-INF/logging.toml");
    let configurer = configurer(&root);

    configurer.init_logging(&ctx).unwrap();
    let context = configurer.lifecycle().selector().logger_context();
    assert!(matches!(context.configuration(), Configuration::Custom(_)));
    context.log(
        &Record::builder()
            .args(format_args!("request served"))
            .level(Level::Info)
            .target("web")
            .build(),
    );
    configurer.shutdown_logging(&ctx);

    let text = fs::read_to_string(root.path().join("WEB-INF/logs/app.log")).unwrap();
    assert_eq!(text, "INFO request served\n");
}

#[test]
fn test_without_location_nothing_is_configured() {
    let root = deploy(CONFIG);
    let ctx = DirectoryWebContext::new(root.path());
    let configurer = configurer(&root);

    configurer.init_logging(&ctx).unwrap();
    assert!(ctx.messages().is_empty());
    assert_eq!(
        configurer.lifecycle().selector().logger_context().configuration(),
        Configuration::Default
    );
}

#[test]
fn test_location_from_properties() {
    let root = deploy(CONFIG);
    let ctx = DirectoryWebContext::new(root.path());
    let props = HashMap::from([
        ("WEB_APP_ROOT".to_string(), root.path().display().to_string()),
        (
            CONFIG_LOCATION_PARAM.to_string(),
            "WEB-INF/logging.toml".to_string(),
        ),
    ]);
    let configurer = WebConfigurer::new(
        LoggingLifecycle::new(Arc::new(ContextSelector::new()))
            .with_properties(props)
            .with_log_bridge(false),
    );

    configurer.init_logging(&ctx).unwrap();
    assert_eq!(ctx.messages().len(), 1);
}

#[test]
fn test_missing_location_is_an_invalid_parameter() {
    let root = deploy(CONFIG);
    let ctx = DirectoryWebContext::new(root.path())
        .with_init_parameter(CONFIG_LOCATION_PARAM, "WEB-INF/missing.toml");

    let err = configurer(&root).init_logging(&ctx).unwrap_err();
    match err {
        Error::InvalidParameter { param, message } => {
            assert_eq!(param, CONFIG_LOCATION_PARAM);
            assert!(message.contains("WEB-INF/missing.toml"), "{message}");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn test_malformed_configuration_is_unexpected() {
    let root = deploy("[root]\nappenders = ['nowhere']\n");
    let ctx = DirectoryWebContext::new(root.path())
        .with_init_parameter(CONFIG_LOCATION_PARAM, "WEB-INF/logging.toml");

    let err = configurer(&root).init_logging(&ctx).unwrap_err();
    match err {
        Error::Unexpected(source) => {
            assert!(matches!(*source, Error::ConfigSyntax { .. }), "{source}")
        }
        err => panic!("unexpected error: {err}"),
    }
}
