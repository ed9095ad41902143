use std::path::Path;

use xmlls_core::{ArgList, ExecutableSpec, ProxySettings};

/// Builds the command line for the native server binary
#[derive(Debug, Clone, Default)]
pub struct NativeLauncher {
    binary_args: String,
    proxy: Option<ProxySettings>,
}

impl NativeLauncher {
    /// Launcher passing `binary_args` to the server as one argument
    pub fn new(binary_args: impl Into<String>) -> Self {
        Self {
            binary_args: binary_args.into(),
            proxy: None,
        }
    }

    /// Proxy to pass to the server
    #[must_use]
    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Launch description for the trusted binary at `binary`.
    ///
    /// The child inherits this process's environment; a configured proxy adds
    /// the `HTTP_PROXY_*` variables on top.
    #[must_use]
    pub fn prepare(&self, binary: &Path) -> ExecutableSpec {
        let mut args = ArgList::new();
        if !self.binary_args.is_empty() {
            args.append(self.binary_args.clone());
        }
        let spec = ExecutableSpec::new(binary).with_args(args);

        match &self.proxy {
            Some(proxy) => spec.with_env(proxy.as_env_vars()),
            None => spec,
        }
    }
}
