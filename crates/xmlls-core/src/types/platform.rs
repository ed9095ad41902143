use std::path::{Path, PathBuf};

/// Prefix shared by every LemMinX binary name
pub const BINARY_NAME_PREFIX: &str = "lemminx-";

/// Extension of the expected-hash manifest shipped next to a binary
pub const HASH_FILE_EXTENSION: &str = "sha256";

/// The host operating system, as far as server naming is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
}

impl Platform {
    /// Platform of the running host
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Platform for a Rust OS identifier (`std::env::consts::OS` values)
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        Self { os: os.to_string() }
    }

    /// Returns true on Windows hosts
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Returns true on macOS hosts
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }

    /// Name of the server binary without extension.
    ///
    /// macOS always maps to the x86_64 build: only one architecture is
    /// published per OS.
    #[must_use]
    pub fn binary_stem(&self) -> String {
        match self.os.as_str() {
            "macos" => format!("{BINARY_NAME_PREFIX}osx-x86_64"),
            "windows" => format!("{BINARY_NAME_PREFIX}win32"),
            other => format!("{BINARY_NAME_PREFIX}{other}"),
        }
    }

    /// Extension of the server binary, including the dot
    #[must_use]
    pub fn binary_extension(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }

    /// File name of the server binary
    #[must_use]
    pub fn binary_file_name(&self) -> String {
        format!("{}{}", self.binary_stem(), self.binary_extension())
    }

    /// File name of the expected-hash manifest
    #[must_use]
    pub fn hash_file_name(&self) -> String {
        format!("{}.{HASH_FILE_EXTENSION}", self.binary_stem())
    }

    /// Key of this platform in the download manifest
    #[must_use]
    pub fn download_key(&self) -> String {
        self.binary_stem()[BINARY_NAME_PREFIX.len()..].to_string()
    }

    /// Separator between classpath entries
    #[must_use]
    pub fn path_separator(&self) -> char {
        if self.is_windows() {
            ';'
        } else {
            ':'
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Where the server binary for a platform lives, and how to check it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDescriptor {
    /// Platform-specific name without extension
    pub name: String,
    /// Extension including the dot, empty when none
    pub extension: &'static str,
    /// Canonical absolute install path
    pub install_path: PathBuf,
    /// Expected-hash manifest next to the install path
    pub hash_file_path: PathBuf,
}

impl BinaryDescriptor {
    /// Derive the descriptor for `platform` under the `server_home` directory
    #[must_use]
    pub fn new(platform: &Platform, server_home: &Path) -> Self {
        Self {
            name: platform.binary_stem(),
            extension: platform.binary_extension(),
            install_path: server_home.join(platform.binary_file_name()),
            hash_file_path: server_home.join(platform.hash_file_name()),
        }
    }

    /// Binary file name including extension
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.extension)
    }

    /// Manifest file name
    #[must_use]
    pub fn hash_file_name(&self) -> String {
        format!("{}.{HASH_FILE_EXTENSION}", self.name)
    }
}
