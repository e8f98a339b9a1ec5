//! Final whitespace formatting of a rendered command.

use cmds_utils::TemplateError;
use cmds_utils::text::{dedent, pretty_format, squish};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How whitespace in a rendered command is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// One line, single spaces.
    #[default]
    Squish,
    /// Keep lines, joined with `\` continuations.
    Pretty,
    /// Leave as rendered.
    Raw,
}

impl Format {
    /// Dedent `rendered`, then apply this format.
    #[must_use]
    pub fn apply(self, rendered: &str) -> String {
        match self {
            Self::Squish => squish(rendered),
            Self::Pretty => pretty_format(dedent(rendered).trim_matches('\n')),
            Self::Raw => dedent(rendered),
        }
    }
}

impl FromStr for Format {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squish" => Ok(Self::Squish),
            "pretty" => Ok(Self::Pretty),
            "raw" => Ok(Self::Raw),
            other => Err(TemplateError::BadExpression {
                expr: other.to_string(),
                reason: "format should be squish, pretty or raw".to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squish => write!(f, "squish"),
            Self::Pretty => write!(f, "pretty"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERED: &str = "\n    psql\n      --host=x\n\n\n      db\n  ";

    #[test]
    fn test_squish() {
        assert_eq!(Format::Squish.apply(RENDERED), "psql --host=x db");
    }

    #[test]
    fn test_pretty() {
        assert_eq!(
            Format::Pretty.apply("\n    psql\n      --host=x\n    db\n"),
            "psql \\\n  --host=x \\\ndb"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("pretty".parse::<Format>().unwrap(), Format::Pretty);
        assert!("fancy".parse::<Format>().is_err());
    }
}
