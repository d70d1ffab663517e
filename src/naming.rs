use regex::Regex;
use std::sync::LazyLock;

use crate::config::VendorRule;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[/ ]+").expect("separator pattern"));
static HYPHEN_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-([A-Za-z0-9_])").expect("hyphen pattern"));

/// Strict, reserved and edition-gated Rust keywords.
pub const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "gen",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Split on runs of `/` or space. Empty leading/trailing segments are kept.
pub fn segments(name: &str) -> impl Iterator<Item = &str> {
    SEPARATORS.split(name)
}

/// Final path segment, scope/organisation dropped.
pub fn last_segment(name: &str) -> &str {
    segments(name).last().unwrap_or(name)
}

/// Remove every occurrence of each prefix, one prefix at a time in list order.
pub fn strip_prefixes(segment: &str, prefixes: &[String]) -> String {
    let mut out = segment.to_string();
    for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
        out = out.replace(prefix.as_str(), "");
    }
    out
}

pub fn is_reserved(ident: &str) -> bool {
    RESERVED.contains(&ident)
}

/// `node-resolve` -> `nodeResolve`.
pub fn camel_case(input: &str) -> String {
    HYPHEN_WORD
        .replace_all(input, |caps: &regex::Captures| caps[1].to_ascii_uppercase())
        .into_owned()
}

/// First rule that applies decides, even if it yields no group.
pub fn detect_vendor(name: &str, rules: &[VendorRule]) -> Option<String> {
    rules
        .iter()
        .find(|rule| rule.applies(name))
        .and_then(|rule| rule.group_for(name))
}
