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

//! Loading configuration resources from resolved locations.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::location::CLASSPATH_URL_PREFIX;
use crate::location::FILE_URL_PREFIX;
use crate::location::clean_path;
use crate::location::is_url;

/// The environment variable listing the default resource roots.
///
/// The value is a list of directories joined the way `PATH` is on the current platform.
pub const CLASSPATH_ENV: &str = "LOGFORTH_CLASSPATH";

/// A readable configuration resource.
#[derive(Debug, Clone)]
pub struct Resource {
    location: String,
    description: String,
    contents: String,
}

impl Resource {
    /// The location the resource was loaded from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// A human readable description of where the contents came from.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The contents of the resource.
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// Loads [`Resource`]s from locations.
///
/// * `classpath:` locations are looked up in the embedded resources first, then in each resource
///   root in order.
/// * `file:` locations and plain paths are read from the file system.
/// * Other URL schemes are not readable.
///
/// # Examples
///
/// ```
/// use logforth_configurer::resource::ResourceLoader;
///
/// let loader = ResourceLoader::new().with_embedded("my_app/logging.toml", "[root]\n");
/// let resource = loader.load("classpath:/my_app/logging.toml").unwrap();
/// assert_eq!(resource.contents(), "[root]\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    roots: Vec<PathBuf>,
    embedded: BTreeMap<String, Cow<'static, str>>,
}

impl ResourceLoader {
    /// Create a loader without any resource root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader whose roots are read from [`CLASSPATH_ENV`], falling back to the current
    /// working directory.
    pub fn from_env() -> Self {
        let roots = match std::env::var_os(CLASSPATH_ENV) {
            Some(paths) => std::env::split_paths(&paths).collect(),
            None => vec![PathBuf::from(".")],
        };
        Self {
            roots,
            embedded: BTreeMap::new(),
        }
    }

    /// Append a resource root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Register an in-memory resource under `path`, typically the output of `include_str!`.
    pub fn with_embedded(
        mut self,
        path: impl AsRef<str>,
        contents: impl Into<Cow<'static, str>>,
    ) -> Self {
        let path = path.as_ref().trim_start_matches('/').to_string();
        self.embedded.insert(path, contents.into());
        self
    }

    /// The resource roots, in lookup order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Load the resource at `location`.
    ///
    /// # Errors
    ///
    /// Return [`Error::ResourceNotFound`] if no readable resource exists at `location`.
    pub fn load(&self, location: &str) -> Result<Resource, Error> {
        if let Some(path) = location.strip_prefix(CLASSPATH_URL_PREFIX) {
            return self.load_classpath(location, path);
        }

        if let Some(path) = location.strip_prefix(FILE_URL_PREFIX) {
            let path = path.strip_prefix("//").unwrap_or(path);
            return load_file(location, Path::new(path));
        }

        if is_url(location) {
            return Err(Error::resource_not_found(
                location,
                "URL scheme is not supported for reading",
            ));
        }

        load_file(location, Path::new(location))
    }

    fn load_classpath(&self, location: &str, path: &str) -> Result<Resource, Error> {
        let path = clean_path(path.trim_start_matches('/'));
        if path == ".." || path.starts_with("../") {
            return Err(Error::resource_not_found(
                location,
                "class path resource escapes the resource roots",
            ));
        }
        let path = path.as_str();

        if let Some(contents) = self.embedded.get(path) {
            return Ok(Resource {
                location: location.to_string(),
                description: format!("embedded resource [{path}]"),
                contents: contents.to_string(),
            });
        }

        for root in &self.roots {
            let candidate = root.join(path);
            if candidate.is_file() {
                return load_file(location, &candidate);
            }
        }

        Err(Error::resource_not_found(
            location,
            format!(
                "class path resource [{path}] does not exist in roots {:?}",
                self.roots
            ),
        ))
    }
}

fn load_file(location: &str, path: &Path) -> Result<Resource, Error> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::resource_not_found(location, format!("file [{}]: {err}", path.display()))
    })?;

    Ok(Resource {
        location: location.to_string(),
        description: format!("file [{}]", path.display()),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn load_from_roots_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("app")).unwrap();
        fs::write(second.path().join("app/logging.toml"), "second").unwrap();

        let loader = ResourceLoader::new()
            .with_root(first.path())
            .with_root(second.path());
        let resource = loader.load("classpath:/app/logging.toml").unwrap();
        assert_eq!(resource.contents(), "second");
        assert_eq!(resource.location(), "classpath:/app/logging.toml");

        fs::create_dir_all(first.path().join("app")).unwrap();
        fs::write(first.path().join("app/logging.toml"), "first").unwrap();
        let resource = loader.load("classpath:app/logging.toml").unwrap();
        assert_eq!(resource.contents(), "first");
    }

    #[test]
    fn embedded_resources_take_precedence() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("logging.toml"), "on disk").unwrap();

        let loader = ResourceLoader::new()
            .with_root(root.path())
            .with_embedded("/logging.toml", "embedded");
        let resource = loader.load("classpath:/logging.toml").unwrap();
        assert_eq!(resource.contents(), "embedded");
        assert!(resource.description().starts_with("embedded"));
    }

    #[test]
    fn load_file_locations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.toml");
        fs::write(&path, "contents").unwrap();

        let loader = ResourceLoader::new();
        let plain = loader.load(path.to_str().unwrap()).unwrap();
        assert_eq!(plain.contents(), "contents");

        let url = format!("file:{}", path.display());
        assert_eq!(loader.load(&url).unwrap().contents(), "contents");
    }

    #[test]
    fn classpath_stays_within_roots() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("root");
        fs::create_dir_all(root.join("conf")).unwrap();
        fs::write(parent.path().join("secret.toml"), "outside").unwrap();
        fs::write(root.join("logging.toml"), "inside").unwrap();

        let loader = ResourceLoader::new().with_root(&root);
        for location in [
            "classpath:/../secret.toml",
            "classpath:conf/../../secret.toml",
            "classpath:..",
        ] {
            let err = loader.load(location).unwrap_err();
            assert!(matches!(err, Error::ResourceNotFound { .. }), "{location}: {err}");
        }

        let resource = loader.load("classpath:/conf/../logging.toml").unwrap();
        assert_eq!(resource.contents(), "inside");
    }

    #[test]
    fn missing_resources() {
        let loader = ResourceLoader::new().with_root("/nonexistent-root");
        for location in [
            "classpath:/missing.toml",
            "file:/nonexistent-root/missing.toml",
            "/nonexistent-root/missing.toml",
            "http://localhost/logging.toml",
        ] {
            let err = loader.load(location).unwrap_err();
            match err {
                Error::ResourceNotFound { location: l, .. } => assert_eq!(l, location),
                err => panic!("unexpected error: {err}"),
            }
        }
    }
}
