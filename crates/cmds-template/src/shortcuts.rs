//! `%s`-style shortcut rewriting.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SHORTCUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(%+)(?:s|\{([A-Za-z_]+\??)\}|<([A-Za-z_]+\??)>s)")
        .expect("shortcut pattern is valid")
});

/// Rewrite shortcut placeholders into template tags.
///
/// | shortcut | becomes |
/// |----------|---------|
/// | `%s` | `<%= arg %>` |
/// | `%{key}`, `%<key>s` | `<%= key %>` |
/// | `%{key?}`, `%<key?>s` | `<%= key? %>` |
///
/// A shortcut must start the text or follow whitespace or `=`, and must end
/// the text or precede whitespace. Doubling the leading `%` escapes it: one
/// `%` is dropped and the rest stays literal (`%%s` becomes `%s`), in which
/// case only the start of the text or whitespace may precede it.
///
/// ```rust
/// use cmds_template::replace_shortcuts;
///
/// assert_eq!(replace_shortcuts("psql %s --user=%{user}"), "psql <%= arg %> --user=<%= user %>");
/// assert_eq!(replace_shortcuts("printf %%s"), "printf %s");
/// ```
#[must_use]
pub fn replace_shortcuts(template: &str) -> String {
    SHORTCUT
        .replace_all(template, |caps: &Captures<'_>| rewrite(template, caps))
        .into_owned()
}

fn rewrite(template: &str, caps: &Captures<'_>) -> String {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));

    let before = template[..start].chars().next_back();
    let after = template[end..].chars().next();
    let ends_ok = after.is_none_or(char::is_whitespace);
    let starts_after_space = before.is_none_or(char::is_whitespace);

    let percents = caps.get(1).map_or(0, |m| m.len());
    let key = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());

    if !ends_ok {
        return whole.to_string();
    }

    if percents == 1 {
        if starts_after_space || before == Some('=') {
            return match key {
                Some(key) => format!("<%= {key} %>"),
                None => "<%= arg %>".to_string(),
            };
        }
        return whole.to_string();
    }

    if starts_after_space {
        // Drop one `%`, keep the rest literally.
        return whole[1..].to_string();
    }
    whole.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_to_replace(input: &str, output: &str) {
        for (text, expected) in [
            (input.to_string(), output.to_string()),
            (format!("blah {input}"), format!("blah {output}")),
            (format!("{input} blah"), format!("{output} blah")),
            (format!("blah\n{input}\nblah"), format!("blah\n{output}\nblah")),
        ] {
            assert_eq!(replace_shortcuts(&text), expected, "input: {text:?}");
        }
    }

    #[test]
    fn test_positional() {
        expect_to_replace("%s", "<%= arg %>");
    }

    #[test]
    fn test_positional_escaped() {
        expect_to_replace("%%s", "%s");
    }

    #[test]
    fn test_braced_key() {
        expect_to_replace("%{key}", "<%= key %>");
        expect_to_replace("%{key?}", "<%= key? %>");
    }

    #[test]
    fn test_braced_key_escaped() {
        expect_to_replace("%%{key}", "%{key}");
        expect_to_replace("%%{key?}", "%{key?}");
        expect_to_replace("%%%{key?}", "%%{key?}");
    }

    #[test]
    fn test_angle_key() {
        expect_to_replace("%<key>s", "<%= key %>");
        expect_to_replace("%<key?>s", "<%= key? %>");
    }

    #[test]
    fn test_angle_key_escaped() {
        expect_to_replace("%%<key>s", "%<key>s");
    }

    #[test]
    fn test_after_equals() {
        assert_eq!(replace_shortcuts("--name=%s"), "--name=<%= arg %>");
        assert_eq!(replace_shortcuts("--name=%{name}"), "--name=<%= name %>");
        // Escapes need whitespace or the start of the text.
        assert_eq!(replace_shortcuts("--name=%%s"), "--name=%%s");
    }

    #[test]
    fn test_embedded_is_literal() {
        assert_eq!(replace_shortcuts("date +%s"), "date +%s");
        assert_eq!(replace_shortcuts("%sx"), "%sx");
        assert_eq!(replace_shortcuts("a%{b}"), "a%{b}");
    }

    #[test]
    fn test_needs_whitespace_after() {
        assert_eq!(replace_shortcuts("echo %s; ls"), "echo %s; ls");
        assert_eq!(replace_shortcuts("echo %{key}|wc"), "echo %{key}|wc");
        assert_eq!(replace_shortcuts("echo %s ; ls"), "echo <%= arg %> ; ls");
    }
}
