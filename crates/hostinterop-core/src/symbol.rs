//! Symbols, keywords and host-name munging.

use std::fmt;
use std::sync::Arc;

/// A possibly namespace-qualified symbol (`name` or `ns/name`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    namespace: Option<Arc<str>>,
    name: Arc<str>,
}

impl Symbol {
    /// Create an unqualified symbol.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Create a namespace-qualified symbol.
    pub fn qualified(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Parse `ns/name` or `name` (a lone `/` is the division symbol).
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Self::qualified(ns, name),
            _ => Self::new(text),
        }
    }

    /// The symbol's name part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The symbol's namespace part, if qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the symbol has a namespace part.
    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Replacement text for characters that are legal in source names but not
/// in host member names.
fn munged_char(ch: char) -> Option<&'static str> {
    Some(match ch {
        '-' => "_",
        ':' => "_COLON_",
        '+' => "_PLUS_",
        '>' => "_GT_",
        '<' => "_LT_",
        '=' => "_EQ_",
        '~' => "_TILDE_",
        '!' => "_BANG_",
        '@' => "_CIRCA_",
        '#' => "_SHARP_",
        '\'' => "_SINGLEQUOTE_",
        '"' => "_DOUBLEQUOTE_",
        '%' => "_PERCENT_",
        '^' => "_CARET_",
        '&' => "_AMPERSAND_",
        '*' => "_STAR_",
        '|' => "_BAR_",
        '{' => "_LBRACE_",
        '}' => "_RBRACE_",
        '[' => "_LBRACK_",
        ']' => "_RBRACK_",
        '/' => "_SLASH_",
        '\\' => "_BSLASH_",
        '?' => "_QMARK_",
        _ => return None,
    })
}

/// Convert a source-level name into the host member name it denotes.
///
/// ```
/// use hostinterop_core::munge;
///
/// assert_eq!(munge("get-value"), "get_value");
/// assert_eq!(munge("empty?"), "empty_QMARK_");
/// assert_eq!(munge("ToString"), "ToString");
/// ```
pub fn munge(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match munged_char(ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_qualified_and_plain() {
        let q = Symbol::parse("clojure.core/map");
        assert_eq!(q.namespace(), Some("clojure.core"));
        assert_eq!(q.name(), "map");

        let plain = Symbol::parse("System.Math");
        assert!(!plain.is_qualified());
        assert_eq!(plain.name(), "System.Math");

        assert_eq!(Symbol::parse("/").name(), "/");
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Symbol::qualified("a", "b").to_string(), "a/b");
        assert_eq!(Symbol::new("x").to_string(), "x");
    }

    #[test]
    fn munge_replaces_special_characters() {
        assert_eq!(munge("swap!"), "swap_BANG_");
        assert_eq!(munge("->x"), "__GT_x");
        assert_eq!(munge("plain_name"), "plain_name");
    }
}
