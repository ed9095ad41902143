use colored::Colorize;
use xmlls::{Notice, Notifier, Remediation, Severity};

/// Prints notices to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Text of a notice as printed
    pub fn render(notice: &Notice) -> String {
        let label = match notice.severity {
            Severity::Info => "Info:".blue().bold(),
            Severity::Warning => "Warning:".yellow().bold(),
            Severity::Error => "Error:".red().bold(),
        };
        let mut out = format!("{label} {}", notice.message);
        for action in &notice.actions {
            out.push_str("\n  ");
            out.push_str(&describe(action));
        }
        out
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}", Self::render(&notice));
    }
}

fn describe(action: &Remediation) -> String {
    match action {
        Remediation::FallBackToRuntime => {
            format!("{} set {} to false to use the Java server", "→".dimmed(), "prefer_binary".cyan())
        }
        Remediation::OpenSettings(key) => {
            format!("{} xmlls config set {} <value>", "→".dimmed(), key.cyan())
        }
        Remediation::OpenUrl { label, url } => format!("{} {label}: {}", "→".dimmed(), url.underline()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_actions_under_the_message() {
        colored::control::set_override(false);
        let notice = Notice::error("Java runtime could not be located")
            .with_action(Remediation::OpenUrl {
                label: "Get Java".into(),
                url: "https://adoptium.net".into(),
            })
            .with_action(Remediation::OpenSettings("java_home".into()));

        assert_eq!(
            ConsoleNotifier::render(&notice),
            "Error: Java runtime could not be located\n  \
             → Get Java: https://adoptium.net\n  \
             → xmlls config set java_home <value>"
        );
    }
}
