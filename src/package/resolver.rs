//! Name and version inference for install sources.
//!
//! Each strategy looks at one kind of evidence and returns a [`Hint`] with
//! whatever it could find. The resolver fills the fields in cascade order and
//! stops as soon as both are known:
//!
//! 1. explicit values from the caller
//! 2. a `package.json` next to the source
//! 3. a comment block at the head of the script
//! 4. the file name (`name-version.js`)
//! 5. a version inherited from the enclosing package
//! 6. defaults: the sanitized file stem and version `0`

use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::Meta;
use crate::runtime::Runtime;

pub const DEFAULT_VERSION: &str = "0";
const META_FILE: &str = "package.json";
const KNOWN_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".tar", ".zip", ".js"];

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+?)-v?(?P<version>[0-9][0-9A-Za-z.]*)$").expect("valid pattern")
});

static HEADER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s/*]*(?:name|project)\s*[:=]\s*(?P<value>[^\s*]+)")
        .expect("valid pattern")
});

static HEADER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s/*]*version\s*[:=]\s*v?(?P<value>[0-9][^\s*]*)").expect("valid pattern")
});

/// A partial answer from one strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hint {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl Hint {
    fn is_complete(&self) -> bool {
        self.name.is_some() && self.version.is_some()
    }

    /// Keep only values usable as a store entry, made safe by
    /// [`normalize_name`] and [`normalize_version`].
    fn normalized(self) -> Self {
        Self {
            name: self.name.as_deref().and_then(normalize_name),
            version: self.version.as_deref().and_then(normalize_version),
        }
    }

    /// Fill the fields still missing from `other`.
    fn fill_from(&mut self, other: Hint) {
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.version.is_none() {
            self.version = other.version;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub name: String,
    pub version: String,
}

/// Strip the first known extension (case-insensitive) from a file name.
pub fn strip_known_extension(file_name: &str) -> &str {
    KNOWN_EXTENSIONS
        .iter()
        .find_map(|ext| {
            let split = file_name.len().checked_sub(ext.len()).filter(|&i| i > 0)?;
            let tail = file_name.get(split..)?;
            tail.eq_ignore_ascii_case(ext).then(|| &file_name[..split])
        })
        .unwrap_or(file_name)
}

/// Lower-case `raw` and replace everything outside `[a-z0-9._-]` with `_`.
pub fn sanitize_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

/// A declared name as a single path segment: separators, whitespace and
/// control characters become `_`, and a name made only of dots is
/// sanitized. `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.is_empty() {
        return None;
    }
    if name.chars().all(|c| c == '.') {
        return Some(name.replace('.', "_"));
    }
    Some(name)
}

/// A declared version in the form the index reads back from
/// `<name>-<version>`: a leading `v` is dropped, `-` becomes `.`, anything
/// outside `[0-9A-Za-z._+]` becomes `_`. `None` unless it starts with a digit.
pub fn normalize_version(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(|c: char| c == 'v' || c == 'V')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(trimmed);
    if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(
        trimmed
            .chars()
            .map(|c| match c {
                '-' => '.',
                c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+') => c,
                _ => '_',
            })
            .collect(),
    )
}

fn stem(source: &Path) -> String {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_known_extension(&file_name).to_string()
}

/// Strategy: `name-version` in the file name.
pub fn from_filename(source: &Path) -> Hint {
    let stem = stem(source);
    match FILENAME_PATTERN.captures(&stem) {
        Some(caps) => Hint {
            name: Some(sanitize_name(&caps["name"])),
            version: Some(caps["version"].to_string()),
        },
        None => Hint::default(),
    }
}

/// Strategy: `name:`/`project:` and `version:` fields in the leading comment
/// block of a script.
pub fn from_header(content: &str) -> Hint {
    let header = leading_comment(content);
    if header.is_empty() {
        return Hint::default();
    }
    Hint {
        name: HEADER_NAME.captures(header).map(|c| c["value"].to_string()),
        version: HEADER_VERSION.captures(header).map(|c| c["value"].to_string()),
    }
    .normalized()
}

/// The `/* ... */` block or run of `//` lines a script starts with.
fn leading_comment(content: &str) -> &str {
    let trimmed = content.trim_start();
    if let Some(body) = trimmed.strip_prefix("/*") {
        return match body.find("*/") {
            Some(end) => &body[..end],
            None => body,
        };
    }

    let mut end = 0;
    for line in trimmed.split_inclusive('\n') {
        if !line.trim_start().starts_with("//") {
            break;
        }
        end += line.len();
    }
    &trimmed[..end]
}

fn defaults(source: &Path) -> Hint {
    Hint {
        name: Some(sanitize_name(&stem(source))),
        version: Some(DEFAULT_VERSION.to_string()),
    }
}

/// Apply the inherited version and the defaults, then settle the result.
fn finish(mut hint: Hint, source: &Path, inherited_version: Option<&str>) -> Resolved {
    hint.fill_from(Hint {
        name: None,
        version: inherited_version.map(str::to_string),
    });
    hint.fill_from(defaults(source));

    let resolved = Resolved {
        name: hint.name.unwrap_or_default(),
        version: hint.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
    };
    debug!("Resolved {:?} as {}-{}", source, resolved.name, resolved.version);
    resolved
}

pub struct NameVersionResolver<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> NameVersionResolver<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Infer `(name, version)` for `source`. Never fails: with no evidence at
    /// all the result is the sanitized stem and version `0`.
    #[tracing::instrument(skip(self))]
    pub fn resolve(
        &self,
        source: &Path,
        explicit_name: Option<&str>,
        explicit_version: Option<&str>,
        inherited_version: Option<&str>,
    ) -> Resolved {
        let mut hint = Hint {
            name: explicit_name.map(str::to_string),
            version: explicit_version.map(str::to_string),
        }
        .normalized();

        if !hint.is_complete() {
            hint.fill_from(self.from_metadata(source));
        }
        if !hint.is_complete() {
            hint.fill_from(self.from_script_header(source));
        }
        if !hint.is_complete() {
            hint.fill_from(from_filename(source));
        }

        finish(hint, source, inherited_version)
    }

    /// Infer `(name, version)` for one script out of a multi-file package.
    ///
    /// A metadata record shared by the package names the package rather
    /// than this script, so only the script's own header and file name are
    /// consulted before falling back to `package_version`.
    #[tracing::instrument(skip(self))]
    pub fn resolve_member(&self, source: &Path, package_version: Option<&str>) -> Resolved {
        let mut hint = self.from_script_header(source);
        if !hint.is_complete() {
            hint.fill_from(from_filename(source));
        }
        finish(hint, source, package_version)
    }

    /// Version of a whole package (an archive or directory): its metadata
    /// record, else the directory name, else the archive name.
    pub fn package_version(&self, package_root: &Path, archive: Option<&Path>) -> Option<String> {
        self.from_metadata(package_root)
            .version
            .or_else(|| from_filename(package_root).version)
            .or_else(|| archive.and_then(|a| from_filename(a).version))
    }

    /// The `package.json` belonging to `source`: inside it for a directory,
    /// beside it for a file.
    pub fn metadata_path(&self, source: &Path) -> Option<PathBuf> {
        if self.runtime.is_dir(source) {
            return Some(source.join(META_FILE));
        }
        source.parent().map(|dir| dir.join(META_FILE))
    }

    /// The parsed `package.json` belonging to `source`, if there is a
    /// readable one.
    pub fn metadata(&self, source: &Path) -> Option<Meta> {
        let path = self.metadata_path(source)?;
        if !self.runtime.exists(&path) {
            return None;
        }
        match Meta::load(self.runtime, &path) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!("Skipping unreadable metadata {:?}: {:#}", path, e);
                None
            }
        }
    }

    /// Strategy: `name`/`version` from the metadata record.
    pub fn from_metadata(&self, source: &Path) -> Hint {
        match self.metadata(source) {
            Some(meta) => Hint {
                name: meta.name().map(str::to_string),
                version: meta.version().map(str::to_string),
            }
            .normalized(),
            None => Hint::default(),
        }
    }

    fn from_script_header(&self, source: &Path) -> Hint {
        if self.runtime.is_dir(source) {
            return Hint::default();
        }
        match self.runtime.read_to_string(source) {
            Ok(content) => from_header(&content),
            Err(e) => {
                debug!("Not reading header of {:?}: {}", source, e);
                Hint::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    fn resolved(name: &str, version: &str) -> Resolved {
        Resolved {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    #[rstest]
    #[case("jquery-1.4.1.js", Some("jquery"), Some("1.4.1"))]
    #[case("jquery.metadata-2.0.zip", Some("jquery.metadata"), Some("2.0"))]
    #[case("sammy-0.5.0.tar.gz", Some("sammy"), Some("0.5.0"))]
    #[case("sammy-v0.5.0.tgz", Some("sammy"), Some("0.5.0"))]
    #[case("jquery-ui-1.8rc1.js", Some("jquery-ui"), Some("1.8rc1"))]
    #[case("Raphael-1.3.js", Some("raphael"), Some("1.3"))]
    #[case("noversion.js", None, None)]
    #[case("jquery-ui.js", None, None)]
    fn test_from_filename(
        #[case] file: &str,
        #[case] name: Option<&str>,
        #[case] version: Option<&str>,
    ) {
        let hint = from_filename(Path::new(file));
        assert_eq!(hint.name.as_deref(), name);
        assert_eq!(hint.version.as_deref(), version);
    }

    #[rstest]
    #[case("jquery-1.4.1.js", "jquery-1.4.1")]
    #[case("sammy-0.5.0.TAR.GZ", "sammy-0.5.0")]
    #[case("pkg.tgz", "pkg")]
    #[case("pkg.tar", "pkg")]
    #[case("README", "README")]
    #[case(".js", ".js")]
    fn test_strip_known_extension(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(strip_known_extension(file), expected);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My Lib (beta)"), "my_lib__beta_");
        assert_eq!(sanitize_name("jquery.color"), "jquery.color");
    }

    #[rstest]
    #[case("jquery", Some("jquery"))]
    #[case("jQuery UI", Some("jQuery_UI"))]
    #[case("@acme/widget", Some("@acme_widget"))]
    #[case("../../escaped", Some(".._.._escaped"))]
    #[case("..", Some("__"))]
    #[case("  ", None)]
    fn test_normalize_name(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_name(raw).as_deref(), expected);
    }

    #[rstest]
    #[case("1.4.1", Some("1.4.1"))]
    #[case("v2", Some("2"))]
    #[case("2.0.0-rc1", Some("2.0.0.rc1"))]
    #[case("1.0/../x", Some("1.0_.._x"))]
    #[case("beta", None)]
    #[case("v", None)]
    #[case("", None)]
    fn test_normalize_version(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_version(raw).as_deref(), expected);
    }

    #[test]
    fn test_from_header_keeps_names_inside_one_segment() {
        let content = "/*\n * name: ../../escaped\n * version: 1.0-beta\n */\nvar x;\n";
        let hint = from_header(content);
        assert_eq!(hint.name.as_deref(), Some(".._.._escaped"));
        assert_eq!(hint.version.as_deref(), Some("1.0.beta"));
    }

    #[test]
    fn test_metadata_names_stay_inside_one_segment() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "@acme/widget", "version": "2.0.0-rc1"}"#,
        )?;
        let file = dir.path().join("widget.js");
        fs::write(&file, "var widget;")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, None),
            resolved("@acme_widget", "2.0.0.rc1")
        );
        Ok(())
    }

    #[test]
    fn test_unusable_metadata_version_falls_through() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "../../escaped", "version": "beta"}"#,
        )?;
        let file = dir.path().join("widget-1.2.js");
        fs::write(&file, "var widget;")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, None),
            resolved(".._.._escaped", "1.2")
        );
        Ok(())
    }

    #[test]
    fn test_from_header_block_comment() {
        let content = "/*\n * Project: myproject\n * Version: 1.2.2\n */\nvar x = 1;\n";
        let hint = from_header(content);
        assert_eq!(hint.name.as_deref(), Some("myproject"));
        assert_eq!(hint.version.as_deref(), Some("1.2.2"));
    }

    #[test]
    fn test_from_header_line_comments() {
        let content = "// name = widget\n// version=v0.3\nvar version = 9;\n";
        let hint = from_header(content);
        assert_eq!(hint.name.as_deref(), Some("widget"));
        assert_eq!(hint.version.as_deref(), Some("0.3"));
    }

    #[test]
    fn test_from_header_ignores_code_after_comment() {
        let content = "/* just a banner */\nvar name = 'x';\n// version: 3.0\n";
        assert_eq!(from_header(content), Hint::default());
    }

    #[test]
    fn test_explicit_values_win() {
        // Explicit values leave nothing for the other strategies to do
        let runtime = MockRuntime::new();
        let resolver = NameVersionResolver::new(&runtime);

        let result = resolver.resolve(
            Path::new("/src/jquery-1.4.1.js"),
            Some("myproject"),
            Some("1.1.1"),
            None,
        );

        assert_eq!(result, resolved("myproject", "1.1.1"));
    }

    #[test]
    fn test_resolve_from_filename() {
        let mut runtime = MockRuntime::new();
        let source = PathBuf::from("/src/jquery-1.4.1.js");

        // --- No metadata beside the file ---
        runtime.expect_is_dir().returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/src/package.json")))
            .returning(|_| false);

        // --- Header has no fields ---
        runtime
            .expect_read_to_string()
            .with(eq(source.clone()))
            .returning(|_| Ok("/*! jQuery JavaScript Library */".to_string()));

        let resolver = NameVersionResolver::new(&runtime);
        assert_eq!(
            resolver.resolve(&source, None, None, None),
            resolved("jquery", "1.4.1")
        );
    }

    #[test]
    fn test_resolve_from_package_json() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let pkg = dir.path().join("mustache.js");
        fs::create_dir(&pkg)?;
        fs::write(pkg.join("mustache.js"), "var Mustache;")?;
        fs::write(
            pkg.join("package.json"),
            r#"{"name": "mustache", "version": "0.2.2", "author": "Jan Lehnardt"}"#,
        )?;

        let resolver = NameVersionResolver::new(&RealRuntime);

        assert_eq!(
            resolver.resolve(&pkg.join("mustache.js"), None, None, None),
            resolved("mustache", "0.2.2")
        );
        assert_eq!(
            resolver.resolve(&pkg, None, None, None),
            resolved("mustache", "0.2.2")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_from_comments() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("infoincomments.js");
        fs::write(
            &file,
            "// Project: myproject\n// Version: 1.2.2\n\nfunction go() {}\n",
        )?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, None),
            resolved("myproject", "1.2.2")
        );
        Ok(())
    }

    #[test_log::test]
    fn test_malformed_package_json_falls_through() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("package.json"), "{ broken")?;
        let file = dir.path().join("jquery-1.4.1.js");
        fs::write(&file, "var jQuery;")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, None),
            resolved("jquery", "1.4.1")
        );
        Ok(())
    }

    #[test]
    fn test_default_version_without_evidence() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("noversion.js");
        fs::write(&file, "var x;")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, None),
            resolved("noversion", "0")
        );
        Ok(())
    }

    #[test]
    fn test_inherited_version_before_default() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("jquery.metadata.min.js");
        fs::write(&file, "x")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve(&file, None, None, Some("2.0")),
            resolved("jquery.metadata.min", "2.0")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_member_ignores_shared_metadata() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "jquery.metadata", "version": "2.0"}"#,
        )?;
        let min = dir.path().join("jquery.metadata.min.js");
        fs::write(&min, "x")?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(
            resolver.resolve_member(&min, Some("2.0")),
            resolved("jquery.metadata.min", "2.0")
        );
        Ok(())
    }

    #[test]
    fn test_package_version_prefers_metadata() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("sammy-0.5.0");
        fs::create_dir(&root)?;

        let resolver = NameVersionResolver::new(&RealRuntime);
        assert_eq!(resolver.package_version(&root, None).as_deref(), Some("0.5.0"));

        fs::write(root.join("package.json"), r#"{"version": "0.5.1"}"#)?;
        assert_eq!(resolver.package_version(&root, None).as_deref(), Some("0.5.1"));

        let unpacked = dir.path().join("unpacked");
        fs::create_dir(&unpacked)?;
        assert_eq!(
            resolver
                .package_version(&unpacked, Some(Path::new("/dl/jquery.metadata-2.0.zip")))
                .as_deref(),
            Some("2.0")
        );
        Ok(())
    }
}
