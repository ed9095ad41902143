use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything needed to start the server process.
///
/// Built once per launch attempt and not modified after it is handed to the
/// process layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutableSpec {
    /// Program to run
    pub command: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment; `None` adds nothing
    pub env: Option<BTreeMap<String, String>>,
}

impl ExecutableSpec {
    /// Spec running `command` with no arguments and the inherited environment
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: None,
        }
    }

    /// Set the arguments
    #[must_use]
    pub fn with_args(mut self, args: ArgList) -> Self {
        self.args = args.into_vec();
        self
    }

    /// Set variables layered over the inherited environment
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Copy with secret-looking environment values masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let env = self.env.as_ref().map(|env| {
            env.iter()
                .map(|(k, v)| {
                    if k.contains("PASSWORD") {
                        (k.clone(), "****".to_string())
                    } else {
                        (k.clone(), v.clone())
                    }
                })
                .collect()
        });
        let args = self
            .args
            .iter()
            .map(|a| match a.split_once('=') {
                Some((key, _)) if key.ends_with("proxyPassword") => format!("{key}=****"),
                _ => a.clone(),
            })
            .collect();
        Self {
            command: self.command.clone(),
            args,
            env,
        }
    }
}

/// Ordered argument list where the first occurrence of an argument wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    args: Vec<String>,
}

impl ArgList {
    /// Empty list
    #[must_use]
    pub const fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Append `arg` unless an identical argument is already present.
    ///
    /// Returns whether the argument was added.
    pub fn push(&mut self, arg: impl Into<String>) -> bool {
        let arg = arg.into();
        if self.contains(&arg) {
            return false;
        }
        self.args.push(arg);
        true
    }

    /// Append `arg` even if it is already present.
    ///
    /// For positional values such as a classpath following `-cp`.
    pub fn append(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// Append every argument of `args`, skipping duplicates
    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.push(arg);
        }
    }

    /// Returns true if `arg` was already added
    #[must_use]
    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if no argument was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Arguments as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    /// Consume into the underlying vector
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.args
    }
}
