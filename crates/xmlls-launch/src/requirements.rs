//! Java runtime discovery for the managed-runtime launch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use xmlls_core::{Platform, Remediation, Result, XmlLsError};

/// Oldest Java release the server runs on
pub const MIN_JAVA_VERSION: u32 = 11;

/// Environment variables consulted, in order, before `PATH`
pub const JAVA_HOME_VARIABLES: [&str; 2] = ["JDK_HOME", "JAVA_HOME"];

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"version "(.*)""#).expect("version regex"));
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("number regex"));

/// A usable Java runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsData {
    /// Installation directory, holding `bin/java`
    pub java_home: PathBuf,
    /// Major version, e.g. `17`
    pub java_version: u32,
}

/// Where to send users who need a Java runtime
#[must_use]
pub fn openjdk_download_link(platform: &Platform) -> &'static str {
    if platform.is_macos() {
        "https://adoptium.net/temurin/releases"
    } else {
        "https://developers.redhat.com/products/openjdk/download/?sc_cid=701f2000000RWTnAAO"
    }
}

/// The `java` launcher inside `java_home`
#[must_use]
pub fn java_executable(java_home: &Path, platform: &Platform) -> PathBuf {
    let name = if platform.is_windows() { "java.exe" } else { "java" };
    java_home.join("bin").join(name)
}

/// Extract the major version from `java -version` output.
///
/// Legacy `1.x` versions report `x`. Returns 0 when no version is found.
#[must_use]
pub fn parse_major_version(output: &str) -> u32 {
    let Some(caps) = VERSION_RE.captures(output) else {
        return 0;
    };
    let version = &caps[1];
    let version = version.strip_prefix("1.").unwrap_or(version);
    NUMBER_RE
        .find(version)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Locates a Java runtime and checks its version
#[derive(Debug, Clone)]
pub struct JavaLocator {
    platform: Platform,
    configured_home: Option<PathBuf>,
}

impl JavaLocator {
    /// Locator for the given host
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self {
            platform,
            configured_home: None,
        }
    }

    /// Use this Java home instead of detecting one
    #[must_use]
    pub fn with_java_home(mut self, java_home: Option<PathBuf>) -> Self {
        self.configured_home = java_home;
        self
    }

    /// Find the runtime to launch the server with.
    ///
    /// A configured home must exist and contain `bin/java`. Without one, the
    /// runtime is detected from `JDK_HOME`, `JAVA_HOME`, then `PATH`. The
    /// runtime must be at least Java 11.
    pub async fn resolve(&self) -> Result<RequirementsData> {
        let java_home = match &self.configured_home {
            Some(home) => self.check_configured(home)?,
            None => self
                .detect(|name| std::env::var_os(name), which::which("java").ok())
                .ok_or_else(|| {
                    self.fault(
                        "Java runtime could not be located. Please download and install Java or use the binary server.",
                    )
                })?,
        };

        let java_version = self.version_of(&java_home).await?;
        if java_version < MIN_JAVA_VERSION {
            return Err(self.fault(format!(
                "Java {MIN_JAVA_VERSION} or more recent is required to run. Please download and install a recent Java runtime."
            )));
        }
        debug!(java_home = %java_home.display(), java_version, "using Java runtime");
        Ok(RequirementsData {
            java_home,
            java_version,
        })
    }

    fn check_configured(&self, home: &Path) -> Result<PathBuf> {
        if !home.exists() {
            return Err(self.fault(format!(
                "The configured java home {} points to a missing folder",
                home.display()
            )));
        }
        if !java_executable(home, &self.platform).is_file() {
            return Err(self.fault(format!(
                "The configured java home {} does not point to a Java runtime.",
                home.display()
            )));
        }
        Ok(home.to_path_buf())
    }

    /// Detection order: `JDK_HOME`, `JAVA_HOME`, the `java` found on `PATH`
    fn detect<F>(&self, var: F, java_on_path: Option<PathBuf>) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let from_vars = JAVA_HOME_VARIABLES
            .iter()
            .filter_map(|name| var(name).filter(|v| !v.is_empty()).map(PathBuf::from));

        // `<home>/bin/java`, after resolving symlinks such as /usr/bin/java
        let from_path = java_on_path
            .map(|java| std::fs::canonicalize(&java).unwrap_or(java))
            .and_then(|java| java.parent()?.parent().map(Path::to_path_buf));

        from_vars
            .chain(from_path)
            .find(|home| java_executable(home, &self.platform).is_file())
    }

    async fn version_of(&self, java_home: &Path) -> Result<u32> {
        let java = java_executable(java_home, &self.platform);
        let output = tokio::process::Command::new(&java)
            .arg("-version")
            .output()
            .await
            .map_err(|e| XmlLsError::io(&java, e))?;
        Ok(parse_major_version(&String::from_utf8_lossy(&output.stderr)))
    }

    fn fault(&self, message: impl Into<String>) -> XmlLsError {
        XmlLsError::config_with(
            message,
            Remediation::OpenUrl {
                label: "Get the Java runtime".to_string(),
                url: openjdk_download_link(&self.platform).to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_home(root: &Path, name: &str) -> PathBuf {
        let home = root.join(name);
        std::fs::create_dir_all(home.join("bin")).unwrap();
        std::fs::write(home.join("bin").join("java"), "").unwrap();
        home
    }

    #[test]
    fn parses_modern_and_legacy_versions() {
        assert_eq!(
            parse_major_version(r#"openjdk version "17.0.2" 2022-01-18"#),
            17
        );
        assert_eq!(parse_major_version(r#"java version "1.8.0_292""#), 8);
        assert_eq!(parse_major_version(r#"openjdk version "21-ea""#), 21);
        assert_eq!(parse_major_version("no version here"), 0);
    }

    #[test]
    fn jdk_home_wins_over_java_home_and_path() {
        let root = tempfile::tempdir().unwrap();
        let jdk = fake_home(root.path(), "jdk");
        let java = fake_home(root.path(), "java");
        let on_path = fake_home(root.path(), "path");
        let vars: HashMap<&str, OsString> = [
            ("JDK_HOME", jdk.clone().into_os_string()),
            ("JAVA_HOME", java.clone().into_os_string()),
        ]
        .into();
        let locator = JavaLocator::new(Platform::from_os("linux"));

        let found = locator.detect(
            |name| vars.get(name).cloned(),
            Some(on_path.join("bin").join("java")),
        );
        assert_eq!(found, Some(jdk));

        let found = locator.detect(
            |name| if name == "JDK_HOME" { None } else { vars.get(name).cloned() },
            None,
        );
        assert_eq!(found, Some(java));
    }

    #[test]
    fn path_java_is_last_resort() {
        let root = tempfile::tempdir().unwrap();
        let on_path = fake_home(root.path(), "path");
        let bogus = root.path().join("not-a-jdk");
        let locator = JavaLocator::new(Platform::from_os("linux"));

        let found = locator.detect(
            |name| (name == "JAVA_HOME").then(|| bogus.clone().into_os_string()),
            Some(on_path.join("bin").join("java")),
        );
        assert_eq!(
            found.map(|p| std::fs::canonicalize(p).unwrap()),
            Some(std::fs::canonicalize(on_path).unwrap())
        );
    }

    #[tokio::test]
    async fn configured_home_must_exist() {
        let root = tempfile::tempdir().unwrap();
        let locator = JavaLocator::new(Platform::from_os("linux"))
            .with_java_home(Some(root.path().join("missing")));

        let err = locator.resolve().await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing folder"));
        assert!(matches!(err.remediation(), Some(Remediation::OpenUrl { .. })));
    }

    #[tokio::test]
    async fn configured_home_must_hold_java() {
        let root = tempfile::tempdir().unwrap();
        let locator = JavaLocator::new(Platform::from_os("linux"))
            .with_java_home(Some(root.path().to_path_buf()));

        let err = locator.resolve().await.unwrap_err();
        assert!(err.to_string().contains("does not point to a Java runtime"));
    }

    #[test]
    fn macos_download_link_differs() {
        assert_eq!(
            openjdk_download_link(&Platform::from_os("macos")),
            "https://adoptium.net/temurin/releases"
        );
        assert!(openjdk_download_link(&Platform::from_os("linux")).contains("redhat"));
    }
}
