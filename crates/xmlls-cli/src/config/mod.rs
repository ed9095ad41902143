//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use xmlls::launch::DownloadSource;
use xmlls::trust::TRUST_FILE_NAME;
use xmlls::{DownloadManifest, ProxySettings};

use crate::output::OutputFormat;

/// Keys accepted by `xmlls config set`, with a short description.
pub const KEYS: [(&str, &str); 13] = [
    ("server_home", "Directory holding the server binary, jars and hash manifests"),
    ("binary_path", "Use this server binary instead of the installed one"),
    ("binary_args", "Arguments passed to the binary server, as one string"),
    ("vmargs", "JVM arguments for the Java server"),
    ("java_home", "Java runtime to launch the Java server with"),
    ("prefer_binary", "Run the binary even when Java is available (true/false)"),
    ("silence_extension_warning", "Do not warn about extensions that need Java (true/false)"),
    ("extension_jars", "Comma-separated jars added to the Java server classpath"),
    ("proxy", "Proxy address, e.g. http://proxy.corp:3128"),
    ("proxy_authorization", "Proxy-Authorization header value, e.g. Basic dXNlcjpwYXNz"),
    ("download_url", "Where to download the binary server from"),
    ("download_manifest", "JSON file mapping platforms to binary download URLs"),
    ("output_format", "Default output format (pretty/json)"),
];

/// CLI configuration.
///
/// Path-valued settings accept a leading `~`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server installation directory.
    pub server_home: Option<String>,

    /// User-supplied server binary.
    pub binary_path: Option<String>,

    /// Arguments for the binary server.
    pub binary_args: String,

    /// JVM arguments for the Java server.
    pub vmargs: String,

    /// Java runtime home.
    pub java_home: Option<String>,

    /// Prefer the binary server over Java.
    pub prefer_binary: bool,

    /// Silence the missing-Java warning for extensions.
    pub silence_extension_warning: bool,

    /// Extension jars for the Java server.
    pub extension_jars: Vec<String>,

    /// Proxy address.
    pub proxy: Option<String>,

    /// Proxy-Authorization header.
    pub proxy_authorization: Option<String>,

    /// Binary download URL.
    pub download_url: Option<String>,

    /// Download manifest file.
    pub download_manifest: Option<String>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,
}

impl Config {
    /// Load configuration from `path`; a missing file is the default config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Set `key` from its command-line text. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match key {
            "server_home" => self.server_home = optional(),
            "binary_path" => self.binary_path = optional(),
            "binary_args" => self.binary_args = value.to_string(),
            "vmargs" => self.vmargs = value.to_string(),
            "java_home" => self.java_home = optional(),
            "prefer_binary" => self.prefer_binary = value.parse()?,
            "silence_extension_warning" => self.silence_extension_warning = value.parse()?,
            "extension_jars" => {
                self.extension_jars = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "proxy" => self.proxy = optional(),
            "proxy_authorization" => self.proxy_authorization = optional(),
            "download_url" => self.download_url = optional(),
            "download_manifest" => self.download_manifest = optional(),
            "output_format" | "output" => {
                self.output_format = if value.is_empty() { None } else { Some(value.parse()?) };
            }
            _ => {
                let known: Vec<String> = KEYS
                    .iter()
                    .map(|(k, d)| format!("  {k:<26} - {d}"))
                    .collect();
                anyhow::bail!("Unknown config key: {}\n\nAvailable keys:\n{}", key, known.join("\n"));
            }
        }
        Ok(())
    }

    /// Server installation directory, defaulting under the data directory.
    pub fn server_home(&self, paths: &Paths) -> PathBuf {
        self.server_home
            .as_deref()
            .map_or_else(|| paths.default_server_home(), expand)
    }

    /// User-supplied binary, if any.
    pub fn binary_path(&self) -> Option<PathBuf> {
        self.binary_path.as_deref().map(expand)
    }

    /// Configured Java home, if any.
    pub fn java_home(&self) -> Option<PathBuf> {
        self.java_home.as_deref().map(expand)
    }

    /// Extension jars, expanded.
    pub fn extension_jars(&self) -> Vec<PathBuf> {
        self.extension_jars.iter().map(|j| expand(j)).collect()
    }

    /// Proxy from the config, else from `HTTPS_PROXY` / `HTTP_PROXY`.
    pub fn proxy_settings(&self) -> Result<Option<ProxySettings>> {
        let address = self.proxy.clone().or_else(|| {
            ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"]
                .iter()
                .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
        });
        Ok(ProxySettings::from_config(
            address.as_deref(),
            self.proxy_authorization.as_deref(),
        )?)
    }

    /// Where to download a missing binary from; a manifest wins over a URL.
    pub fn download_source(&self) -> Result<DownloadSource> {
        if let Some(manifest) = &self.download_manifest {
            let path = expand(manifest);
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not read download manifest {}", path.display()))?;
            return Ok(DownloadSource::Manifest(DownloadManifest::from_json(&json)?));
        }
        Ok(self
            .download_url
            .clone()
            .map_or(DownloadSource::None, DownloadSource::Url))
    }
}

/// Expand a leading `~` in a configured path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Locations of the files the CLI owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// `config.toml`
    pub config_file: PathBuf,

    /// Trusted hash list
    pub trust_file: PathBuf,

    /// Server installs and heap dumps
    pub data_dir: PathBuf,
}

impl Paths {
    /// Standard per-user locations, or everything next to `config_file`
    /// when one is given.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self> {
        if let Some(file) = config_file {
            let dir = file.parent().unwrap_or_else(|| Path::new("."));
            return Ok(Self {
                config_file: file.to_path_buf(),
                trust_file: dir.join(TRUST_FILE_NAME),
                data_dir: dir.join("data"),
            });
        }

        let dirs = ProjectDirs::from("org", "xmlls", "xmlls")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(Self {
            config_file: dirs.config_dir().join("config.toml"),
            trust_file: dirs.config_dir().join(TRUST_FILE_NAME),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// Default server installation directory.
    pub fn default_server_home(&self) -> PathBuf {
        self.data_dir.join("server")
    }

    /// Directory for Java heap dumps.
    pub fn heap_dump_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_parses_typed_values() {
        let mut config = Config::default();
        config.set("prefer_binary", "true").unwrap();
        config.set("extension_jars", "a.jar, b.jar,,").unwrap();
        config.set("output", "json").unwrap();

        assert!(config.prefer_binary);
        assert_eq!(config.extension_jars, ["a.jar", "b.jar"]);
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert!(config.set("prefer_binary", "maybe").is_err());
    }

    #[test]
    fn empty_value_clears_optional_keys() {
        let mut config = Config::default();
        config.set("binary_path", "/opt/lemminx").unwrap();
        config.set("binary_path", "").unwrap();
        assert_eq!(config.binary_path, None);
    }

    #[test]
    fn unknown_key_lists_the_known_ones() {
        let err = Config::default().set("api_key", "x").unwrap_err().to_string();
        assert!(err.contains("Unknown config key: api_key"));
        assert!(err.contains("download_manifest"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.set("vmargs", "-Xmx1G -Dfoo=\"a b\"").unwrap();
        config.set("download_url", "https://example.org/lemminx.zip").unwrap();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::load(&dir.path().join("none.toml")).unwrap(), Config::default());
    }

    #[test]
    fn download_manifest_wins_over_url() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(
            &manifest,
            r#"{"binaryServerDownloadUrl": {"linux": "https://example.org/linux.zip"}}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.set("download_url", "https://example.org/other.zip").unwrap();
        config.set("download_manifest", manifest.to_str().unwrap()).unwrap();

        assert!(matches!(config.download_source().unwrap(), DownloadSource::Manifest(_)));
    }

    #[test]
    fn explicit_config_file_keeps_everything_together() {
        let paths = Paths::resolve(Some(Path::new("/tmp/xmlls/config.toml"))).unwrap();
        assert_eq!(paths.trust_file, Path::new("/tmp/xmlls").join(TRUST_FILE_NAME));
        assert_eq!(paths.default_server_home(), Path::new("/tmp/xmlls/data/server"));
    }

    #[test]
    fn plain_paths_are_not_expanded() {
        assert_eq!(expand("/opt/lemminx"), Path::new("/opt/lemminx"));
    }
}
