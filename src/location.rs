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

//! Resolution of configuration locations.
//!
//! A location is one of:
//!
//! * a classpath location, e.g. `classpath:/my_app/logforth.toml`, looked up in the resource
//!   roots of a [`ResourceLoader`](crate::resource::ResourceLoader);
//! * a URL, e.g. `file:/etc/my_app/logforth.toml`;
//! * a plain path, which [`LocationResolver`] treats as relative to the package of a reference
//!   type.

use std::borrow::Cow;

/// Prefix of classpath locations.
pub const CLASSPATH_URL_PREFIX: &str = "classpath:";

/// Prefix of file URL locations.
pub const FILE_URL_PREFIX: &str = "file:";

/// Resource name used when no location is given.
pub const DEFAULT_RESOURCE_NAME: &str = "logforth-test.toml";

const URL_SCHEMES: &[&str] = &["classpath*", "classpath", "file", "http", "https", "ftp", "jar"];

/// Maps a `(reference type, raw location)` pair to a scheme-qualified location.
///
/// # Examples
///
/// ```
/// use logforth_configurer::location::LocationResolver;
///
/// let resolver = LocationResolver::default();
/// assert_eq!(
///     resolver.resolve("my_app::service", Some("logging.toml")),
///     "classpath:/my_app/service/logging.toml"
/// );
/// assert_eq!(
///     resolver.resolve("my_app::service", None),
///     "classpath:/my_app/service/logforth-test.toml"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LocationResolver {
    resource_name: Cow<'static, str>,
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationResolver {
    /// Create a resolver that falls back to [`DEFAULT_RESOURCE_NAME`].
    pub fn new() -> Self {
        Self {
            resource_name: Cow::Borrowed(DEFAULT_RESOURCE_NAME),
        }
    }

    /// Set the resource name used when no location is given.
    pub fn with_resource_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.resource_name = name.into();
        self
    }

    /// The resource name used when no location is given.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Resolve `location` against the package of `T`.
    pub fn resolve_for<T: ?Sized>(&self, location: Option<&str>) -> String {
        self.resolve_package_path(&package_path_of::<T>(), location)
    }

    /// Resolve `location` against a module path such as the one returned by `module_path!()`.
    pub fn resolve(&self, module_path: &str, location: Option<&str>) -> String {
        self.resolve_package_path(&package_path(module_path), location)
    }

    fn resolve_package_path(&self, package: &str, location: Option<&str>) -> String {
        match location {
            None | Some("") => {
                let path = package_relative(package, &self.resource_name);
                format!("{CLASSPATH_URL_PREFIX}{}", clean_path(&path))
            }
            Some(location) if location.starts_with('/') => {
                format!("{CLASSPATH_URL_PREFIX}{location}")
            }
            Some(location) if is_url(location) => clean_path(location),
            Some(location) => {
                let path = package_relative(package, location);
                format!("{CLASSPATH_URL_PREFIX}{}", clean_path(&path))
            }
        }
    }
}

fn package_relative(package: &str, name: &str) -> String {
    if package.is_empty() {
        format!("/{name}")
    } else {
        format!("/{package}/{name}")
    }
}

/// The package path of `T`: its module path with `::` replaced by `/`.
///
/// Generic arguments are ignored, so `Vec<my_app::Item>` has the package path `alloc/vec`.
pub fn package_path_of<T: ?Sized>() -> String {
    let name = std::any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    match name.rsplit_once("::") {
        Some((module, _)) => package_path(module),
        None => String::new(),
    }
}

/// Convert a module path such as `my_app::service` to a package path such as `my_app/service`.
pub fn package_path(module_path: &str) -> String {
    module_path.trim_matches(':').replace("::", "/")
}

/// Return `true` if `location` starts with a recognized URL scheme.
///
/// Windows drive letters such as `C:` are not URL schemes.
pub fn is_url(location: &str) -> bool {
    let Some((scheme, _)) = location.split_once(':') else {
        return false;
    };
    URL_SCHEMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(scheme))
}

/// Normalize a path by collapsing `.` and `..` segments.
///
/// A scheme prefix (e.g. `classpath:`) and a leading `/` are preserved, backslashes are turned
/// into slashes, and `..` segments that cannot be collapsed are kept at the front.
///
/// ```
/// use logforth_configurer::location::clean_path;
///
/// assert_eq!(clean_path("classpath:/a/./b/../c.toml"), "classpath:/a/c.toml");
/// assert_eq!(clean_path("../x/../../y"), "../../y");
/// ```
pub fn clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");

    let (mut prefix, mut rest) = match path.find(':') {
        Some(idx) if !path[..idx].contains('/') => (path[..=idx].to_string(), &path[idx + 1..]),
        _ => (String::new(), path.as_str()),
    };
    if let Some(stripped) = rest.strip_prefix('/') {
        prefix.push('/');
        rest = stripped;
    }

    let mut elements = Vec::new();
    let mut tops = 0usize;
    for element in rest.split('/').rev() {
        match element {
            "." => {}
            ".." => tops += 1,
            _ if tops > 0 => tops -= 1,
            element => elements.push(element),
        }
    }
    elements.extend(std::iter::repeat_n("..", tops));
    elements.reverse();

    prefix + &elements.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod fixtures {
        pub struct Service;
    }

    #[test]
    fn package_path_of_type() {
        assert_eq!(
            package_path_of::<fixtures::Service>(),
            "logforth_configurer/location/tests/fixtures"
        );
        assert_eq!(package_path_of::<Vec<fixtures::Service>>(), "alloc/vec");
        assert_eq!(package_path_of::<u8>(), "");
    }

    #[test]
    fn relative_location_is_scoped_to_package() {
        let resolver = LocationResolver::default();
        assert_eq!(
            resolver.resolve_for::<fixtures::Service>(Some("logging.toml")),
            "classpath:/logforth_configurer/location/tests/fixtures/logging.toml"
        );
        assert_eq!(
            resolver.resolve("a::b", Some("./conf/../logging.toml")),
            "classpath:/a/b/logging.toml"
        );
        assert_eq!(
            resolver.resolve("a::b", Some("../logging.toml")),
            "classpath:/a/logging.toml"
        );
    }

    #[test]
    fn absolute_location_is_classpath_rooted() {
        let resolver = LocationResolver::default();
        for module in ["a::b", "x", ""] {
            assert_eq!(
                resolver.resolve(module, Some("/conf/logging.toml")),
                "classpath:/conf/logging.toml"
            );
        }
    }

    #[test]
    fn url_location_is_cleaned_only() {
        let resolver = LocationResolver::default();
        for module in ["a::b", "x"] {
            assert_eq!(
                resolver.resolve(module, Some("classpath:conf/./logging.toml")),
                "classpath:conf/logging.toml"
            );
            assert_eq!(
                resolver.resolve(module, Some("file:/etc/app/../logging.toml")),
                "file:/etc/logging.toml"
            );
            assert_eq!(
                resolver.resolve(module, Some("http://example.com/logging.toml")),
                "http://example.com/logging.toml"
            );
        }
    }

    #[test]
    fn empty_location_uses_default_resource() {
        let resolver = LocationResolver::default();
        assert_eq!(
            resolver.resolve("a::b", None),
            "classpath:/a/b/logforth-test.toml"
        );
        assert_eq!(
            resolver.resolve("a::b", Some("")),
            "classpath:/a/b/logforth-test.toml"
        );

        let resolver = resolver.with_resource_name("custom.toml");
        assert_eq!(resolver.resolve("a", None), "classpath:/a/custom.toml");
        assert_eq!(resolver.resolve_for::<u8>(None), "classpath:/custom.toml");
    }

    #[test]
    fn url_detection() {
        assert!(is_url("classpath:a.toml"));
        assert!(is_url("classpath*:a.toml"));
        assert!(is_url("FILE:/a.toml"));
        assert!(is_url("https://example.com/a.toml"));
        assert!(!is_url("C:/logs/a.toml"));
        assert!(!is_url("conf/a.toml"));
        assert!(!is_url("mailto:someone"));
    }

    #[test]
    fn clean_path_edge_cases() {
        assert_eq!(clean_path("a\\b\\..\\c"), "a/c");
        assert_eq!(clean_path("/a/b/../../.."), "/..");
        assert_eq!(clean_path("a//b"), "a//b");
        assert_eq!(clean_path("./a"), "a");
        assert_eq!(clean_path("dir/file:x/../y"), "dir/y");
        assert_eq!(clean_path(""), "");
    }
}
