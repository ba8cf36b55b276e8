/// Best-effort source normalization passes.
///
/// These are structural pattern rewrites, not parsers. Malformed or unusual
/// input may come out as something the compiler rejects; it must never come
/// out as a program with different behavior.
pub mod java;
pub mod native;

use regex::Regex;

/// "If `line` is missing and something in the source needs it, add it"
#[derive(Debug)]
pub struct InjectionRule {
    line: &'static str,
    present: Regex,
    trigger: Regex,
}

impl InjectionRule {
    /// Both patterns are compile-time constants
    pub fn new(line: &'static str, present: &str, trigger: &str) -> Self {
        Self {
            line,
            present: Regex::new(present).expect("invalid injection presence regex"),
            trigger: Regex::new(trigger).expect("invalid injection trigger regex"),
        }
    }

    pub fn line(&self) -> &'static str {
        self.line
    }

    pub fn needed(&self, source: &str) -> bool {
        self.needed_in(source, source)
    }

    /// Presence is checked against the whole `source`, the trigger only
    /// against `code`
    pub fn needed_in(&self, source: &str, code: &str) -> bool {
        !self.present.is_match(source) && self.trigger.is_match(code)
    }
}

/// Prepend every needed line, in rule order
pub fn inject_missing(source: &str, rules: &[InjectionRule]) -> String {
    inject_missing_in(source, source, rules)
}

/// Like `inject_missing`, with triggers matched against `code` only
pub fn inject_missing_in(source: &str, code: &str, rules: &[InjectionRule]) -> String {
    let missing: Vec<&str> = rules
        .iter()
        .filter(|rule| rule.needed_in(source, code))
        .map(InjectionRule::line)
        .collect();

    if missing.is_empty() {
        return source.to_string();
    }

    let mut out = missing.join("\n");
    out.push('\n');
    out.push_str(source);
    out
}

/// Brace nesting depth at byte offset `pos`, skipping string and character
/// literals and comments. `None` when `pos` itself lies inside one of those.
pub(crate) fn code_depth_at(source: &str, pos: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let end = pos.min(bytes.len());
    let mut depth = 0usize;
    let mut i = 0;

    while i < end {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < end && bytes[i] != b'\n' {
                    i += 1;
                }
                if i >= end {
                    return None;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < end && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
                if i >= end {
                    return None;
                }
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < end && bytes[i] != quote && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= end {
                    return None;
                }
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    Some(depth)
}

/// `pos` is real code outside every brace pair
pub(crate) fn is_top_level_code(source: &str, pos: usize) -> bool {
    code_depth_at(source, pos) == Some(0)
}
