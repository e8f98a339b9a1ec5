//! Shell escaping of single words.

use cmds_utils::TokenizeError;
use std::str::FromStr;

use crate::value::Value;

/// Quote characters usable by [`quote_dance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Single,
    Double,
}

impl QuoteKind {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    /// The opposite quote, used to quote occurrences of this one.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }
}

impl FromStr for QuoteKind {
    type Err = TokenizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "'" => Ok(Self::Single),
            "double" | "\"" => Ok(Self::Double),
            other => Err(TokenizeError::bad_option("quote_type", other, "single or double")),
        }
    }
}

const fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | ':' | '+' | '/' | '@')
}

/// Escape a string so the shell reads it back as exactly one word.
///
/// The empty string becomes `''`, newlines become `'\n'` and every other
/// character outside `[A-Za-z0-9_\-.,:+/@]` is preceded by a backslash.
///
/// ```rust
/// use cmds_tokenize::escape;
///
/// assert_eq!(escape("hey there!"), r"hey\ there\!");
/// assert_eq!(escape(""), "''");
/// ```
#[must_use]
pub fn escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    let mut escaped = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        if c == '\n' {
            escaped.push_str("'\n'");
        } else {
            if !is_shell_safe(c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
    }
    escaped
}

/// Escape a scalar value after stringifying it.
#[must_use]
pub fn escape_value(value: &Value) -> String {
    escape(&value.to_shell_string())
}

/// Wrap `s` in `kind` quotes, closing and re-opening around every
/// occurrence of that quote and quoting it with the other kind.
///
/// Only the quote character is neutralized. A double-quoted result still
/// allows `$` and backtick expansion; use [`QuoteKind::Single`] for literal
/// output.
///
/// ```rust
/// use cmds_tokenize::{quote_dance, QuoteKind};
///
/// assert_eq!(quote_dance("you're", QuoteKind::Single), r#"'you'"'"'re'"#);
/// ```
#[must_use]
pub fn quote_dance(s: &str, kind: QuoteKind) -> String {
    let outside = kind.as_char();
    let inside = kind.other().as_char();
    let dance: String = [outside, inside, outside, inside, outside].iter().collect();

    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push(outside);
    quoted.push_str(&s.replace(outside, &dance));
    quoted.push(outside);
    quoted
}

/// Single-quote a string for the shell.
#[must_use]
pub fn quote(s: &str) -> String {
    quote_dance(s, QuoteKind::Single)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_safe_words_untouched() {
        assert_eq!(escape("abc-DEF_1.2,3:4+5/6@7"), "abc-DEF_1.2,3:4+5/6@7");
    }

    #[test]
    fn test_escape_metacharacters() {
        assert_eq!(escape("<ex>"), r"\<ex\>");
        assert_eq!(escape("$(whoami)"), r"\$\(whoami\)");
        assert_eq!(escape("it's"), r"it\'s");
        assert_eq!(escape("/where ever/it/is.psql"), r"/where\ ever/it/is.psql");
    }

    #[test]
    fn test_escape_newline() {
        assert_eq!(escape("a\nb"), "a'\n'b");
    }

    #[test]
    fn test_escape_value_scalars() {
        assert_eq!(escape_value(&Value::Nil), "''");
        assert_eq!(escape_value(&Value::from(12345)), "12345");
        assert_eq!(escape_value(&Value::from(false)), "false");
    }

    #[test]
    fn test_quote_dance_single() {
        assert_eq!(quote_dance("you're", QuoteKind::Single), r#"'you'"'"'re'"#);
    }

    #[test]
    fn test_quote_dance_double() {
        assert_eq!(
            quote_dance(r#"such a "goober" dude"#, QuoteKind::Double),
            r#""such a "'"'"goober"'"'" dude""#
        );
        assert_eq!(
            quote_dance(r#"hey "ho" let's go"#, QuoteKind::Double),
            r#""hey "'"'"ho"'"'" let's go""#
        );
    }

    #[test]
    fn test_quote_kind_from_str() {
        assert_eq!("single".parse::<QuoteKind>().unwrap(), QuoteKind::Single);
        assert_eq!("double".parse::<QuoteKind>().unwrap(), QuoteKind::Double);
        assert!(matches!(
            "not_there".parse::<QuoteKind>(),
            Err(TokenizeError::BadOption { .. })
        ));
    }
}
