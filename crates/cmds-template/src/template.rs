//! Parsing and rendering command templates.
//!
//! The tag language is a small, fixed subset of ERB:
//!
//! | tag | meaning |
//! |-----|---------|
//! | `<%= a, b %>` | tokenize the values and insert them, space separated |
//! | `<%== a %>` | insert the values unescaped |
//! | `<% if a %>` / `<% unless a %>` … `<% else %>` … `<% end %>` | conditionals |
//! | `<% for v in a %>` / `<% for k, v in a %>` … `<% end %>` | loops |
//! | `<%# … %>` | comment |
//! | `<%%` | a literal `<%` |
//!
//! Expressions are `arg` (the next positional value), `args[N]` or
//! `@args[N]`, `name` (a required keyword), `name?` (an optional keyword),
//! quoted strings, integers, `true`, `false` and `nil`.

use cmds_tokenize::{TokenizeOptions, Value, tokenize};
use cmds_utils::TemplateError;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::trace;

use crate::context::RenderContext;
use crate::format::Format;
use crate::shortcuts::replace_shortcuts;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Arg,
    ArgAt(usize),
    Key(String),
    OptionalKey(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Output {
        exprs: Vec<Expr>,
        raw: bool,
    },
    Cond {
        expr: Expr,
        negate: bool,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Loop {
        vars: Vec<String>,
        iter: Expr,
        body: Vec<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Output,
    Raw,
    Statement,
}

#[derive(Debug)]
enum Token {
    Text(String),
    Tag {
        kind: TagKind,
        body: String,
        offset: usize,
    },
}

/// How a block ended.
enum Terminator {
    End { offset: usize },
    Else { offset: usize },
    Eof,
}

/// A parsed command template.
///
/// Shortcuts (`%s`, `%{key}`, …) are rewritten before parsing, so they may be
/// mixed freely with tags.
///
/// ```rust
/// use cmds_template::{Format, Template};
/// use cmds_tokenize::{TokenizeOptions, Value};
/// use std::collections::BTreeMap;
///
/// let template = Template::parse("psql <%= opts %> %{database}").unwrap();
/// let kwds = BTreeMap::from([
///     ("database".to_string(), Value::from("blah")),
///     ("opts".to_string(), Value::map([("host", "localhost")])),
/// ]);
/// let cmd = template
///     .render(&[], &kwds, &TokenizeOptions::default(), Format::Squish)
///     .unwrap();
/// assert_eq!(cmd, "psql --host=localhost blah");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] for unclosed tags, stray `else` / `end`,
    /// unterminated blocks and malformed expressions.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let rewritten = replace_shortcuts(source);
        let tokens = lex(&rewritten)?;
        let mut parser = Parser {
            tokens: tokens.into_iter(),
        };
        let (nodes, terminator) = parser.block()?;
        match terminator {
            Terminator::Eof => {}
            Terminator::End { offset } => {
                return Err(TemplateError::UnexpectedTag {
                    tag: "end".to_string(),
                    offset,
                });
            }
            Terminator::Else { offset } => {
                return Err(TemplateError::UnexpectedTag {
                    tag: "else".to_string(),
                    offset,
                });
            }
        }
        trace!(nodes = nodes.len(), "parsed template");
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against `ctx` without any whitespace formatting.
    ///
    /// # Errors
    ///
    /// Returns missing-value and tokenize errors.
    pub fn render_with(
        &self,
        ctx: &mut RenderContext<'_>,
        opts: &TokenizeOptions,
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        render_nodes(&self.nodes, ctx, opts, &mut out)?;
        Ok(out)
    }

    /// Render with positional and keyword values, then format.
    ///
    /// # Errors
    ///
    /// See [`Template::render_with`].
    pub fn render(
        &self,
        args: &[Value],
        kwds: &BTreeMap<String, Value>,
        opts: &TokenizeOptions,
        format: Format,
    ) -> Result<String, TemplateError> {
        let mut ctx = RenderContext::new(args, kwds);
        let rendered = self.render_with(&mut ctx, opts)?;
        Ok(format.apply(&rendered))
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse and render `template` in one go.
///
/// # Errors
///
/// See [`Template::parse`] and [`Template::render_with`].
pub fn render(
    template: &str,
    args: &[Value],
    kwds: &BTreeMap<String, Value>,
    opts: &TokenizeOptions,
    format: Format,
) -> Result<String, TemplateError> {
    Template::parse(template)?.render(args, kwds, opts, format)
}

fn lex(src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(found) = src[pos..].find("<%") {
        let open = pos + found;
        text.push_str(&src[pos..open]);

        if src[open + 2..].starts_with('%') {
            text.push_str("<%");
            pos = open + 3;
            continue;
        }

        let close = src[open + 2..]
            .find("%>")
            .map(|i| open + 2 + i)
            .ok_or(TemplateError::UnclosedTag { offset: open })?;
        let inner = &src[open + 2..close];
        pos = close + 2;

        let (kind, body) = if let Some(body) = inner.strip_prefix("==") {
            (TagKind::Raw, body)
        } else if let Some(body) = inner.strip_prefix('=') {
            (TagKind::Output, body)
        } else if inner.starts_with('#') {
            continue;
        } else {
            (TagKind::Statement, inner)
        };

        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(Token::Tag {
            kind,
            body: body.trim().to_string(),
            offset: open,
        });
    }

    text.push_str(&src[pos..]);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    fn block(&mut self) -> Result<(Vec<Node>, Terminator), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            let (kind, body, offset) = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Tag { kind, body, offset } => (kind, body, offset),
            };

            match kind {
                TagKind::Output | TagKind::Raw => nodes.push(Node::Output {
                    exprs: parse_exprs(&body)?,
                    raw: kind == TagKind::Raw,
                }),
                TagKind::Statement => {
                    let (keyword, rest) = body
                        .split_once(char::is_whitespace)
                        .map_or((body.as_str(), ""), |(k, r)| (k, r.trim()));
                    match keyword {
                        "end" => return Ok((nodes, Terminator::End { offset })),
                        "else" => return Ok((nodes, Terminator::Else { offset })),
                        "if" | "unless" => nodes.push(self.conditional(keyword, rest, &body)?),
                        "for" => nodes.push(self.for_loop(rest, &body)?),
                        _ => {
                            return Err(TemplateError::BadExpression {
                                expr: body.clone(),
                                reason: "expected if, unless, else, for or end".to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok((nodes, Terminator::Eof))
    }

    fn conditional(&mut self, keyword: &str, rest: &str, opened: &str) -> Result<Node, TemplateError> {
        let expr = parse_expr(rest)?;
        let (then, terminator) = self.block()?;
        let otherwise = match terminator {
            Terminator::End { .. } => Vec::new(),
            Terminator::Eof => return Err(unterminated(opened)),
            Terminator::Else { .. } => match self.block()? {
                (otherwise, Terminator::End { .. }) => otherwise,
                (_, Terminator::Eof) => return Err(unterminated(opened)),
                (_, Terminator::Else { offset }) => {
                    return Err(TemplateError::UnexpectedTag {
                        tag: "else".to_string(),
                        offset,
                    });
                }
            },
        };
        Ok(Node::Cond {
            expr,
            negate: keyword == "unless",
            then,
            otherwise,
        })
    }

    fn for_loop(&mut self, rest: &str, opened: &str) -> Result<Node, TemplateError> {
        let bad = |reason: &str| TemplateError::BadExpression {
            expr: opened.to_string(),
            reason: reason.to_string(),
        };

        let (vars, iter) = rest
            .split_once(" in ")
            .ok_or_else(|| bad("expected `for NAME in EXPR`"))?;
        let vars: Vec<String> = vars.split(',').map(|v| v.trim().to_string()).collect();
        if vars.is_empty() || vars.len() > 2 || !vars.iter().all(|v| is_ident(v)) {
            return Err(bad("loops bind one or two names"));
        }
        let iter = parse_expr(iter)?;

        let (body, terminator) = self.block()?;
        match terminator {
            Terminator::End { .. } => Ok(Node::Loop { vars, iter, body }),
            Terminator::Eof => Err(unterminated(opened)),
            Terminator::Else { offset } => Err(TemplateError::UnexpectedTag {
                tag: "else".to_string(),
                offset,
            }),
        }
    }
}

fn unterminated(opened: &str) -> TemplateError {
    TemplateError::UnterminatedBlock {
        opened: opened.to_string(),
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split on commas outside quotes.
fn parse_exprs(body: &str) -> Result<Vec<Expr>, TemplateError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => {
                current.push(c);
                escaped = true;
            }
            (Some(q), c) if c == q => {
                current.push(c);
                quote = None;
            }
            (None, '\'' | '"') => {
                current.push(c);
                quote = Some(c);
            }
            (None, ',') => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts.iter().map(|part| parse_expr(part)).collect()
}

fn parse_expr(src: &str) -> Result<Expr, TemplateError> {
    let expr = src.trim();
    let bad = |reason: &str| TemplateError::BadExpression {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    if expr.is_empty() {
        return Err(bad("empty expression"));
    }

    match expr {
        "arg" => return Ok(Expr::Arg),
        "true" => return Ok(Expr::Literal(Value::Bool(true))),
        "false" => return Ok(Expr::Literal(Value::Bool(false))),
        "nil" => return Ok(Expr::Literal(Value::Nil)),
        _ => {}
    }

    if let Some(index) = expr
        .trim_start_matches('@')
        .strip_prefix("args[")
        .and_then(|s| s.strip_suffix(']'))
    {
        return index
            .trim()
            .parse()
            .map(Expr::ArgAt)
            .map_err(|_| bad("index must be a non-negative integer"));
    }

    if let Some(quote) = expr.chars().next().filter(|c| matches!(c, '\'' | '"')) {
        let inner = expr
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
            .filter(|_| expr.len() >= 2)
            .ok_or_else(|| bad("unterminated string"))?;
        return Ok(Expr::Literal(Value::Str(unescape(inner))));
    }

    if let Ok(i) = expr.parse::<i64>() {
        return Ok(Expr::Literal(Value::Int(i)));
    }

    if let Some(name) = expr.strip_suffix('?')
        && is_ident(name)
    {
        return Ok(Expr::OptionalKey(name.to_string()));
    }
    if is_ident(expr) {
        return Ok(Expr::Key(expr.to_string()));
    }

    Err(bad("expected arg, args[N], name, name?, a literal or a quoted string"))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn eval(expr: &Expr, ctx: &mut RenderContext<'_>) -> Result<Value, TemplateError> {
    match expr {
        Expr::Arg => ctx.next_arg().cloned(),
        Expr::ArgAt(index) => ctx.arg_at(*index).cloned(),
        Expr::Key(name) => ctx.lookup(name).cloned(),
        Expr::OptionalKey(name) => Ok(match ctx.lookup_optional(name) {
            None | Some(Value::Bool(false)) => Value::Nil,
            Some(value) => value.clone(),
        }),
        Expr::Literal(value) => Ok(value.clone()),
    }
}

fn render_nodes(
    nodes: &[Node],
    ctx: &mut RenderContext<'_>,
    opts: &TokenizeOptions,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output { exprs, raw } => {
                let values = exprs
                    .iter()
                    .map(|expr| eval(expr, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                if *raw {
                    let parts: Vec<String> = values
                        .iter()
                        .filter(|v| !v.is_nil())
                        .map(Value::to_shell_string)
                        .collect();
                    out.push_str(&parts.join(" "));
                } else {
                    out.push_str(&tokenize(&values, opts)?);
                }
            }
            Node::Cond {
                expr,
                negate,
                then,
                otherwise,
            } => {
                let branch = if eval(expr, ctx)?.is_truthy() != *negate {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, ctx, opts, out)?;
            }
            Node::Loop { vars, iter, body } => {
                for bindings in loop_bindings(&eval(iter, ctx)?, vars.len()) {
                    for (name, value) in vars.iter().zip(bindings) {
                        ctx.push_local(name, value);
                    }
                    let rendered = render_nodes(body, ctx, opts, out);
                    ctx.pop_locals(vars.len());
                    rendered?;
                }
            }
        }
    }
    Ok(())
}

/// Values bound per iteration: `(key, value)` pairs for maps, `(index,
/// item)` for arrays when two names are given.
fn loop_bindings(value: &Value, names: usize) -> Vec<Vec<Value>> {
    match value {
        Value::Nil => Vec::new(),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| {
                if names == 2 {
                    vec![Value::from(k), v.clone()]
                } else {
                    vec![Value::array([Value::from(k), v.clone()])]
                }
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if names == 2 {
                    vec![Value::from(i), item.clone()]
                } else {
                    vec![item.clone()]
                }
            })
            .collect(),
        scalar => vec![vec![scalar.clone()]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kwds(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn prepare(template: &str, args: &[Value], kwds: &BTreeMap<String, Value>) -> Result<String, TemplateError> {
        render(template, args, kwds, &TokenizeOptions::default(), Format::Squish)
    }

    #[test]
    fn test_lex_literal_percent_tag() {
        let tokens = lex("a <%% b").unwrap();
        assert!(matches!(&tokens[..], [Token::Text(t)] if t == "a <% b"));
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(prepare("a <%# note %>b", &[], &BTreeMap::new()).unwrap(), "a b");
    }

    #[test]
    fn test_parse_expressions() {
        assert_eq!(parse_expr("arg").unwrap(), Expr::Arg);
        assert_eq!(parse_expr("@args[2]").unwrap(), Expr::ArgAt(2));
        assert_eq!(parse_expr("args[0]").unwrap(), Expr::ArgAt(0));
        assert_eq!(parse_expr("x?").unwrap(), Expr::OptionalKey("x".to_string()));
        assert_eq!(parse_expr("current_host").unwrap(), Expr::Key("current_host".to_string()));
        assert_eq!(
            parse_expr(r#""a, \"b\"""#).unwrap(),
            Expr::Literal(Value::from(r#"a, "b""#))
        );
        assert_eq!(parse_expr("42").unwrap(), Expr::Literal(Value::Int(42)));
        assert!(matches!(parse_expr("a + b"), Err(TemplateError::BadExpression { .. })));
        assert!(matches!(parse_expr("args[-1]"), Err(TemplateError::BadExpression { .. })));
    }

    #[test]
    fn test_parse_exprs_respects_quotes() {
        let exprs = parse_exprs(r#" 'a,b', x "#).unwrap();
        assert_eq!(
            exprs,
            vec![Expr::Literal(Value::from("a,b")), Expr::Key("x".to_string())]
        );
    }

    #[test]
    fn test_unclosed_tag() {
        assert_eq!(
            Template::parse("echo <%= x").unwrap_err(),
            TemplateError::UnclosedTag { offset: 5 }
        );
    }

    #[test]
    fn test_stray_end_and_else() {
        assert!(matches!(
            Template::parse("a <% end %>"),
            Err(TemplateError::UnexpectedTag { tag, offset: 2 }) if tag == "end"
        ));
        assert!(matches!(
            Template::parse("a <% else %>"),
            Err(TemplateError::UnexpectedTag { tag, offset: 2 }) if tag == "else"
        ));
    }

    #[test]
    fn test_unterminated_blocks() {
        assert!(matches!(
            Template::parse("<% if x %>a"),
            Err(TemplateError::UnterminatedBlock { opened }) if opened == "if x"
        ));
        assert!(matches!(
            Template::parse("<% for v in xs %>a"),
            Err(TemplateError::UnterminatedBlock { .. })
        ));
    }

    #[test]
    fn test_unknown_statement() {
        assert!(matches!(
            Template::parse("<% while x %><% end %>"),
            Err(TemplateError::BadExpression { .. })
        ));
    }

    #[test]
    fn test_if_else_and_unless() {
        let tpl = "<% if x? %>yes<% else %>no<% end %> <% unless x? %>absent<% end %>";
        let with = kwds(&[("x", Value::from(1))]);
        assert_eq!(prepare(tpl, &[], &with).unwrap(), "yes");
        assert_eq!(prepare(tpl, &[], &BTreeMap::new()).unwrap(), "no absent");
    }

    #[test]
    fn test_raw_output_is_not_escaped() {
        let k = kwds(&[("glob", Value::from("*.rs"))]);
        assert_eq!(prepare("ls <%== glob %>", &[], &k).unwrap(), "ls *.rs");
        assert_eq!(prepare("ls <%= glob %>", &[], &k).unwrap(), r"ls \*.rs");
    }

    #[test]
    fn test_multiple_exprs_in_one_tag() {
        let args = vec![Value::from("a b"), Value::from("c")];
        assert_eq!(
            prepare("echo <%= arg, arg %>", &args, &BTreeMap::new()).unwrap(),
            r"echo a\ b c"
        );
    }

    #[test]
    fn test_loop_over_array_with_index() {
        let k = kwds(&[("xs", Value::array(["a", "b"]))]);
        assert_eq!(
            prepare("<% for i, x in xs %>-<%= i %>=<%= x %> <% end %>", &[], &k).unwrap(),
            "-0=a -1=b"
        );
    }

    #[test]
    fn test_loop_locals_do_not_leak() {
        let k = kwds(&[("xs", Value::array(["a"]))]);
        assert!(matches!(
            prepare("<% for x in xs %><% end %><%= x %>", &[], &k),
            Err(TemplateError::MissingKey { key, .. }) if key == "x"
        ));
    }

    #[test]
    fn test_source_is_kept() {
        let template: Template = "echo %s".parse().unwrap();
        assert_eq!(template.source(), "echo %s");
    }
}
