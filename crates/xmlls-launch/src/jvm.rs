//! Launch description for the server jar on a Java runtime.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;
use xmlls_core::proxy::jvm_args_contain_proxy_settings;
use xmlls_core::{
    ArgList, ExecutableSpec, Notice, Notifier, Platform, ProxySettings, Remediation,
    TracingNotifier,
};

use crate::args::push_vmargs;
use crate::requirements::{java_executable, RequirementsData};

/// Entry point of the server jar
pub const SERVER_MAIN_CLASS: &str = "org.eclipse.lemminx.XMLServerLauncher";

/// Port the debug agent listens on
pub const DEBUG_PORT: u16 = 1054;

const SERVER_JAR_PREFIX: &str = "org.eclipse.lemminx";
const SERVER_JAR_SUFFIX: &str = "-uber.jar";

const WATCH_PARENT_PROCESS: &str = "-DwatchParentProcess=";
const NO_VERIFY: &str = "-noverify";
const XVERIFY_NONE: &str = "-Xverify:none";
const CRASH_ON_OOM: &str = "-XX:+ExitOnOutOfMemoryError";
const HEAP_DUMP: &str = "-XX:+HeapDumpOnOutOfMemoryError";
const HEAP_DUMP_LOCATION: &str = "-XX:HeapDumpPath=";

/// Oldest Java release on which `-noverify` is deprecated
const NOVERIFY_DEPRECATED_SINCE: u32 = 13;

/// Whether the server JVM starts with a debug agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugMode {
    /// No agent
    #[default]
    Off,
    /// Agent listening, server starts immediately
    Listen,
    /// Agent listening, server waits for a debugger
    Suspend,
}

impl DebugMode {
    /// Read from `XMLLS_SERVER_DEBUG` and `SUSPEND_SERVER`
    #[must_use]
    pub fn from_env() -> Self {
        let enabled = |name: &str| std::env::var(name).is_ok_and(|v| v == "true");
        if !enabled("XMLLS_SERVER_DEBUG") {
            Self::Off
        } else if enabled("SUSPEND_SERVER") {
            Self::Suspend
        } else {
            Self::Listen
        }
    }

    fn agent_flag(self) -> Option<String> {
        match self {
            Self::Off => None,
            Self::Listen => Some(format!(
                "-agentlib:jdwp=transport=dt_socket,server=y,suspend=n,address={DEBUG_PORT},quiet=y"
            )),
            Self::Suspend => Some(format!(
                "-agentlib:jdwp=transport=dt_socket,server=y,address={DEBUG_PORT}"
            )),
        }
    }
}

/// Builds the Java command line for the server jar.
///
/// Holds per-session state: whether the heap-dump advisory was shown, and
/// the JVM arguments the session started with.
pub struct JavaLauncher {
    server_home: PathBuf,
    heap_dump_dir: PathBuf,
    platform: Platform,
    vmargs: String,
    proxy: Option<ProxySettings>,
    debug: DebugMode,
    notifier: Arc<dyn Notifier>,
    heap_dump_advised: AtomicBool,
    drift_reported: AtomicBool,
}

impl JavaLauncher {
    /// Launcher for the jar under `server_home`, dumping heaps to `heap_dump_dir`
    pub fn new(server_home: impl Into<PathBuf>, heap_dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_home: server_home.into(),
            heap_dump_dir: heap_dump_dir.into(),
            platform: Platform::current(),
            vmargs: String::new(),
            proxy: None,
            debug: DebugMode::Off,
            notifier: Arc::new(TracingNotifier),
            heap_dump_advised: AtomicBool::new(false),
            drift_reported: AtomicBool::new(false),
        }
    }

    /// Target platform
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// User JVM arguments
    #[must_use]
    pub fn vmargs(mut self, vmargs: impl Into<String>) -> Self {
        self.vmargs = vmargs.into();
        self
    }

    /// Proxy to pass to the server
    #[must_use]
    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Debug agent mode
    #[must_use]
    pub const fn debug(mut self, debug: DebugMode) -> Self {
        self.debug = debug;
        self
    }

    /// Where advisories go
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Locate the server jar; the first match in sorted order wins
    #[must_use]
    pub fn find_server_jar(&self) -> Option<PathBuf> {
        WalkDir::new(&self.server_home)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .find(|e| {
                e.file_name().to_str().is_some_and(|name| {
                    name.starts_with(SERVER_JAR_PREFIX) && name.ends_with(SERVER_JAR_SUFFIX)
                })
            })
            .map(walkdir::DirEntry::into_path)
    }

    /// Build the launch description, or `None` when no server jar exists.
    ///
    /// `extension_jars` are appended to the classpath after the server jar.
    pub fn prepare(
        &self,
        requirements: &RequirementsData,
        extension_jars: &[PathBuf],
    ) -> Option<ExecutableSpec> {
        let Some(server_jar) = self.find_server_jar() else {
            warn!(server_home = %self.server_home.display(), "no server jar found");
            return None;
        };

        let mut args = ArgList::new();
        let vmargs = self.vmargs.as_str();

        if let Some(agent) = self.debug.agent_flag() {
            args.push(agent);
        }

        push_vmargs(&mut args, vmargs);

        if self.platform.is_windows() && !vmargs.contains(WATCH_PARENT_PROCESS) {
            args.push(format!("{WATCH_PARENT_PROCESS}false"));
        }
        if requirements.java_version < NOVERIFY_DEPRECATED_SINCE
            && !args.contains(NO_VERIFY)
            && !args.contains(XVERIFY_NONE)
        {
            args.push(NO_VERIFY);
        }

        if !vmargs.contains(CRASH_ON_OOM) {
            args.push(CRASH_ON_OOM);
        }
        if !vmargs.contains(HEAP_DUMP) {
            args.push(HEAP_DUMP);
        }
        if vmargs.contains(HEAP_DUMP_LOCATION) {
            self.advise_custom_heap_dump_location();
        } else {
            args.push(format!(
                "{HEAP_DUMP_LOCATION}{}",
                self.heap_dump_dir.display()
            ));
        }

        if let Some(proxy) = &self.proxy {
            if !jvm_args_contain_proxy_settings(vmargs) {
                args.extend(proxy.as_jvm_args());
            }
        }

        args.append("-cp");
        args.append(self.classpath(&server_jar, extension_jars));
        args.append(SERVER_MAIN_CLASS);

        let command = java_executable(&requirements.java_home, &self.platform);
        debug!(command = %command.display(), args = args.len(), "prepared Java server launch");
        Some(ExecutableSpec::new(command).with_args(args))
    }

    /// Report when `current` JVM arguments differ from the ones this session
    /// started with.
    ///
    /// Changes only apply after a restart. The notice is shown once per
    /// session; returns whether the arguments drifted.
    pub fn check_vmargs_drift(&self, current: &str) -> bool {
        if current == self.vmargs {
            return false;
        }
        if !self.drift_reported.swap(true, Ordering::SeqCst) {
            self.notifier.notify(
                Notice::warning("XML Language Server configuration changed, please restart the server.")
                    .with_action(Remediation::OpenSettings("vmargs".to_string())),
            );
        }
        true
    }

    fn classpath(&self, server_jar: &Path, extension_jars: &[PathBuf]) -> String {
        let separator = self.platform.path_separator().to_string();
        std::iter::once(server_jar)
            .chain(extension_jars.iter().map(PathBuf::as_path))
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(&separator)
    }

    fn advise_custom_heap_dump_location(&self) {
        if self.heap_dump_advised.swap(true, Ordering::SeqCst) {
            return;
        }
        self.notifier.notify(Notice::warning(
            "Heap dump location has been modified. Heap dumps will not be deleted automatically. \
             Out of memory detection will not work properly unless the heap dumps are deleted \
             manually after each out of memory crash.",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notice>>);

    impl Notifier for Recorder {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    struct Fixture {
        home: tempfile::TempDir,
        jar: PathBuf,
    }

    fn fixture() -> Fixture {
        let home = tempfile::tempdir().unwrap();
        let jar = home.path().join("org.eclipse.lemminx-0.27.0-uber.jar");
        std::fs::write(&jar, "").unwrap();
        Fixture { home, jar }
    }

    fn java(version: u32) -> RequirementsData {
        RequirementsData {
            java_home: PathBuf::from("/opt/jdk"),
            java_version: version,
        }
    }

    fn launcher(f: &Fixture) -> JavaLauncher {
        JavaLauncher::new(f.home.path(), "/var/dumps").platform(Platform::from_os("linux"))
    }

    #[test]
    fn default_arguments_in_order() {
        let f = fixture();
        let spec = launcher(&f).prepare(&java(17), &[]).unwrap();

        assert_eq!(spec.command, PathBuf::from("/opt/jdk/bin/java"));
        assert_eq!(
            spec.args,
            [
                CRASH_ON_OOM.to_string(),
                HEAP_DUMP.to_string(),
                "-XX:HeapDumpPath=/var/dumps".to_string(),
                "-cp".to_string(),
                f.jar.display().to_string(),
                SERVER_MAIN_CLASS.to_string(),
            ]
        );
        assert!(spec.env.is_none());
    }

    #[test]
    fn user_arguments_follow_debug_agent() {
        let f = fixture();
        let spec = launcher(&f)
            .debug(DebugMode::Suspend)
            .vmargs(r#"-Xmx1G -Dfoo="a b" -Xmx1G"#)
            .prepare(&java(17), &[])
            .unwrap();

        assert_eq!(
            &spec.args[..3],
            [
                "-agentlib:jdwp=transport=dt_socket,server=y,address=1054",
                "-Xmx1G",
                "-Dfoo=a b",
            ]
        );
        assert_eq!(spec.args.iter().filter(|a| *a == "-Xmx1G").count(), 1);
    }

    #[test]
    fn noverify_only_before_java_13() {
        let f = fixture();
        let old = launcher(&f).prepare(&java(11), &[]).unwrap();
        assert!(old.args.contains(&NO_VERIFY.to_string()));

        let new = launcher(&f).prepare(&java(13), &[]).unwrap();
        assert!(!new.args.contains(&NO_VERIFY.to_string()));

        let user = launcher(&f)
            .vmargs(XVERIFY_NONE)
            .prepare(&java(11), &[])
            .unwrap();
        assert!(!user.args.contains(&NO_VERIFY.to_string()));
    }

    #[test]
    fn windows_disables_parent_watch_and_uses_semicolons() {
        let f = fixture();
        let spec = JavaLauncher::new(f.home.path(), "C:\\dumps")
            .platform(Platform::from_os("windows"))
            .prepare(&java(17), &[PathBuf::from("ext1.jar"), PathBuf::from("ext2.jar")])
            .unwrap();

        assert_eq!(spec.args[0], "-DwatchParentProcess=false");
        assert_eq!(spec.command, PathBuf::from("/opt/jdk/bin/java.exe"));
        let cp = &spec.args[spec.args.len() - 2];
        assert_eq!(cp, &format!("{};ext1.jar;ext2.jar", f.jar.display()));

        let user_set = JavaLauncher::new(f.home.path(), "C:\\dumps")
            .platform(Platform::from_os("windows"))
            .vmargs("-DwatchParentProcess=true")
            .prepare(&java(17), &[])
            .unwrap();
        assert!(!user_set.args.contains(&"-DwatchParentProcess=false".to_string()));
    }

    #[test]
    fn custom_heap_dump_location_is_advised_once() {
        let f = fixture();
        let recorder = Arc::new(Recorder::default());
        let launcher = launcher(&f)
            .vmargs("-XX:HeapDumpPath=/tmp/mine")
            .notifier(recorder.clone());

        let spec = launcher.prepare(&java(17), &[]).unwrap();
        launcher.prepare(&java(17), &[]).unwrap();

        assert_eq!(
            spec.args.iter().filter(|a| a.starts_with(HEAP_DUMP_LOCATION)).count(),
            1
        );
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn proxy_properties_unless_user_set() {
        let f = fixture();
        let proxy = ProxySettings::new("proxy.corp", "3128");
        let spec = launcher(&f)
            .proxy(Some(proxy.clone()))
            .prepare(&java(17), &[])
            .unwrap();
        assert!(spec.args.contains(&"-Dhttps.proxyHost=proxy.corp".to_string()));

        let spec = launcher(&f)
            .vmargs("-Dhttp.proxyHost=other")
            .proxy(Some(proxy))
            .prepare(&java(17), &[])
            .unwrap();
        assert!(!spec.args.iter().any(|a| a.starts_with("-Dhttps.proxyHost")));
    }

    #[test]
    fn missing_jar_yields_none() {
        let home = tempfile::tempdir().unwrap();
        let launcher = JavaLauncher::new(home.path(), "/var/dumps");
        assert!(launcher.prepare(&java(17), &[]).is_none());
    }

    #[test]
    fn vmargs_drift_is_reported_once() {
        let f = fixture();
        let recorder = Arc::new(Recorder::default());
        let launcher = launcher(&f).vmargs("-Xmx1G").notifier(recorder.clone());

        assert!(!launcher.check_vmargs_drift("-Xmx1G"));
        assert!(launcher.check_vmargs_drift("-Xmx2G"));
        assert!(launcher.check_vmargs_drift("-Xmx4G"));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
