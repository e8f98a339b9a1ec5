//! Text helpers used when formatting rendered commands.

/// Collapse every whitespace run (newlines included) to a single space and
/// trim both ends.
#[must_use]
pub fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the indentation common to every non-blank line.
#[must_use]
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .reduce(common_prefix)
        .unwrap_or("");

    if indent.is_empty() {
        return text.to_string();
    }

    text.split_inclusive('\n')
        .map(|line| line.strip_prefix(indent).unwrap_or_else(|| line.trim_start_matches([' ', '\t'])))
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

/// Format a multi-line command for display, keeping one shell word group per
/// line and joining the lines with `\` continuations.
///
/// Runs of blank lines collapse to a single blank line, which is emitted as
/// a bare `\`. The last line gets no continuation.
#[must_use]
pub fn pretty_format(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = false;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if blank_run {
                continue;
            }
            blank_run = true;
        } else {
            blank_run = false;
        }
        lines.push(line);
    }

    let last = lines.len().saturating_sub(1);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == last || line.ends_with('\\') {
                line.to_string()
            } else if line.is_empty() {
                "\\".to_string()
            } else {
                format!("{line} \\")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squish_collapses_newlines_and_tabs() {
        assert_eq!(squish("  a \n\t b\n\nc  "), "a b c");
        assert_eq!(squish(""), "");
        assert_eq!(squish(" \n "), "");
    }

    #[test]
    fn test_dedent_removes_common_indent() {
        let text = "    defaults\n      -x 1\n\n    export\n";
        assert_eq!(dedent(text), "defaults\n  -x 1\n\nexport\n");
    }

    #[test]
    fn test_dedent_no_indent_is_identity() {
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }

    #[test]
    fn test_pretty_format_last_line_is_bare() {
        assert_eq!(pretty_format("a\n  b"), "a \\\n  b");
    }

    #[test]
    fn test_pretty_format_adds_continuations() {
        let text = "psql\n  --host=x  \n\n\n\n  db\\";
        assert_eq!(pretty_format(text), "psql \\\n  --host=x \\\n\\\n  db\\");
    }
}
