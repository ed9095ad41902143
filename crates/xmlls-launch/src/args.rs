//! Tokenizer for user-supplied JVM argument strings.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use xmlls_core::ArgList;

// Runs of non-space characters, where a double-quoted section may contain spaces.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("token regex"));
static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\\)?""#).expect("quote regex"));

/// Split a JVM argument string into arguments.
///
/// Whitespace inside double quotes does not split. Unescaped quotes are
/// removed and `\"` becomes `"`. A quote without its closing partner is
/// dropped and does not group the text after it.
#[must_use]
pub fn tokenize_vmargs(line: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(line)
        .map(|m| {
            let stripped = QUOTE_RE.replace_all(m.as_str(), |caps: &Captures<'_>| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    String::new()
                }
            });
            stripped.replace("\\\"", "\"")
        })
        .collect()
}

/// Append the arguments of `line` to `args`; the first occurrence wins
pub fn push_vmargs(args: &mut ArgList, line: &str) {
    args.extend(tokenize_vmargs(line));
}
