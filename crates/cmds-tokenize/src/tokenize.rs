//! Turning values and option maps into shell tokens.

use cmds_utils::TokenizeError;
use tracing::trace;

use crate::escape::{escape, escape_value, quote};
use crate::options::{ArrayMode, FalseMode, FalseShortOptMode, HashMode, TokenizeOptions};
use crate::value::{Value, join_values};

/// Tokenize a single value.
///
/// `nil` produces no tokens at all, scalars one escaped token, and arrays and
/// maps one or more tokens depending on `array_mode` / `hash_mode`.
///
/// ```rust
/// use cmds_tokenize::{tokenize_value, ArrayMode, TokenizeOptions, Value};
///
/// let opts = TokenizeOptions::default().array_mode(ArrayMode::Repeat);
/// let tokens = tokenize_value(&Value::array(["a b", "c"]), &opts).unwrap();
/// assert_eq!(tokens, vec![r"a\ b", "c"]);
/// ```
///
/// # Errors
///
/// Never fails for the enum-typed modes; kept fallible so every tokenize
/// entry point shares one signature with [`tokenize_option`].
pub fn tokenize_value(value: &Value, opts: &TokenizeOptions) -> Result<Vec<String>, TokenizeError> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Array(items) => tokenize_array(items, opts),
        Value::Map(entries) => match opts.hash_mode {
            HashMode::Join => {
                let joined: Vec<Value> = entries
                    .iter()
                    .map(|(k, v)| {
                        Value::Str(format!(
                            "{k}{sep}{v}",
                            sep = opts.hash_join_string,
                            v = v.join(&opts.hash_join_string)
                        ))
                    })
                    .collect();
                tokenize_array(&joined, opts)
            }
            HashMode::Json => Ok(vec![quote(&value.to_json_string())]),
        },
        scalar => Ok(vec![escape_value(scalar)]),
    }
}

fn tokenize_array(items: &[Value], opts: &TokenizeOptions) -> Result<Vec<String>, TokenizeError> {
    let flat;
    let items = if opts.flatten_array_values {
        flat = Value::flatten(items);
        flat.as_slice()
    } else {
        items
    };

    match opts.array_mode {
        ArrayMode::Join => Ok(vec![escape(&join_values(items, &opts.array_join_string))]),
        ArrayMode::Repeat => {
            let mut tokens = Vec::with_capacity(items.len());
            for item in items {
                tokens.extend(tokenize_value(item, opts)?);
            }
            Ok(tokens)
        }
        ArrayMode::Json => Ok(vec![quote(&Value::Array(items.to_vec()).to_json_string())]),
    }
}

/// Tokenize one named option into CLI flag tokens.
///
/// Single-character names are short options (`-x <value>`), anything longer
/// is a long option (`--name=<value>`); separators come from `opts`.
///
/// ```rust
/// use cmds_tokenize::{tokenize_option, TokenizeOptions, Value};
///
/// let opts = TokenizeOptions::default();
/// assert_eq!(tokenize_option("x", &Value::from(1), &opts).unwrap(), vec!["-x 1"]);
/// assert_eq!(tokenize_option("blah", &Value::from(true), &opts).unwrap(), vec!["--blah"]);
/// assert!(tokenize_option("blah", &Value::from(false), &opts).unwrap().is_empty());
/// ```
///
/// # Errors
///
/// - [`TokenizeError::EmptyOptionName`] when `name` is empty.
/// - [`TokenizeError::ShortNegationUnset`] when negating a short option
///   without a `false_short_opt_mode`.
/// - [`TokenizeError::CapitalizeNegation`] when capitalizing a name outside `a-z`.
pub fn tokenize_option(
    name: &str,
    value: &Value,
    opts: &TokenizeOptions,
) -> Result<Vec<String>, TokenizeError> {
    if name.is_empty() {
        return Err(TokenizeError::EmptyOptionName);
    }

    let name = if opts.dash_opt_names {
        name.replace('_', "-")
    } else {
        name.to_string()
    };

    let short = name.chars().count() == 1;
    let (prefix, separator) = if short {
        ("-", opts.short_opt_separator.as_str())
    } else {
        ("--", opts.long_opt_separator.as_str())
    };
    let flag = format!("{prefix}{}", escape(&name));

    let tokens = match value {
        Value::Bool(true) => vec![flag],
        Value::Bool(false) => negate(&name, &flag, separator, short, opts)?,
        other => tokenize_value(other, opts)?
            .into_iter()
            .map(|token| format!("{flag}{separator}{token}"))
            .collect(),
    };

    trace!(option = %name, tokens = tokens.len(), "tokenized option");
    Ok(tokens)
}

fn negate(
    name: &str,
    flag: &str,
    separator: &str,
    short: bool,
    opts: &TokenizeOptions,
) -> Result<Vec<String>, TokenizeError> {
    if opts.false_mode == FalseMode::Omit {
        return Ok(Vec::new());
    }
    if !short {
        return Ok(vec![format!("--no-{}", escape(name))]);
    }

    match &opts.false_short_opt_mode {
        None => Err(TokenizeError::ShortNegationUnset {
            name: name.to_string(),
        }),
        Some(FalseShortOptMode::Capitalize) => {
            if !name.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(TokenizeError::CapitalizeNegation {
                    name: name.to_string(),
                });
            }
            Ok(vec![format!("-{}", name.to_ascii_uppercase())])
        }
        Some(FalseShortOptMode::Long) => Ok(vec![format!("--no-{}", escape(name))]),
        Some(FalseShortOptMode::String) => Ok(vec![format!("{flag}{separator}false")]),
        Some(FalseShortOptMode::Custom(custom)) => {
            Ok(vec![format!("{flag}{separator}{}", escape(custom))])
        }
    }
}

/// Tokenize an option map into one space-separated string.
///
/// Entries are emitted sorted by key, whatever order they were given in.
///
/// ```rust
/// use cmds_tokenize::{tokenize_options, TokenizeOptions, Value};
///
/// let entries = vec![
///     ("b".to_string(), Value::from(2)),
///     ("a".to_string(), Value::from(1)),
///     ("c".to_string(), Value::from(3)),
/// ];
/// assert_eq!(
///     tokenize_options(&entries, &TokenizeOptions::default()).unwrap(),
///     "-a 1 -b 2 -c 3"
/// );
/// ```
///
/// # Errors
///
/// Propagates the first [`tokenize_option`] error.
pub fn tokenize_options(
    entries: &[(String, Value)],
    opts: &TokenizeOptions,
) -> Result<String, TokenizeError> {
    let mut sorted: Vec<&(String, Value)> = entries.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut tokens = Vec::new();
    for (name, value) in sorted {
        tokens.extend(tokenize_option(name, value, opts)?);
    }
    Ok(tokens.join(" "))
}

/// Tokenize positional values into one space-separated string.
///
/// Maps are treated as option maps, everything else as plain values. Values
/// producing no tokens leave no gap in the output.
///
/// # Errors
///
/// Propagates tokenization errors.
pub fn tokenize(values: &[Value], opts: &TokenizeOptions) -> Result<String, TokenizeError> {
    let mut parts = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Map(entries) => {
                let rendered = tokenize_options(entries, opts)?;
                if !rendered.is_empty() {
                    parts.push(rendered);
                }
            }
            other => parts.extend(tokenize_value(other, opts)?),
        }
    }
    Ok(parts.join(" "))
}
