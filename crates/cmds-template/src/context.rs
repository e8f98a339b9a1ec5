//! Value lookup for template rendering.

use cmds_tokenize::Value;
use cmds_utils::TemplateError;
use std::collections::BTreeMap;

/// Positional and keyword values available to a template.
///
/// Positional values are consumed through a cursor by [`next_arg`]; keyword
/// values are looked up by name, loop variables shadowing keywords.
///
/// [`next_arg`]: RenderContext::next_arg
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    args: &'a [Value],
    kwds: &'a BTreeMap<String, Value>,
    cursor: usize,
    locals: Vec<(String, Value)>,
}

impl<'a> RenderContext<'a> {
    #[must_use]
    pub const fn new(args: &'a [Value], kwds: &'a BTreeMap<String, Value>) -> Self {
        Self {
            args,
            kwds,
            cursor: 0,
            locals: Vec::new(),
        }
    }

    /// Look up a required keyword.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingKey`] listing the known keys.
    pub fn lookup(&self, name: &str) -> Result<&Value, TemplateError> {
        self.lookup_optional(name)
            .ok_or_else(|| TemplateError::MissingKey {
                key: name.to_string(),
                available: self.available_keys(),
            })
    }

    /// Look up a keyword that may be absent.
    #[must_use]
    pub fn lookup_optional(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .or_else(|| self.kwds.get(name))
    }

    /// Take the next positional value.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingArg`] once the values run out.
    pub fn next_arg(&mut self) -> Result<&'a Value, TemplateError> {
        let value = self.arg_at(self.cursor)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Positional value by index, without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingArg`] if `index` is out of range.
    pub fn arg_at(&self, index: usize) -> Result<&'a Value, TemplateError> {
        self.args.get(index).ok_or(TemplateError::MissingArg {
            index,
            count: self.args.len(),
        })
    }

    /// Positional values consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }

    pub(crate) fn push_local(&mut self, name: &str, value: Value) {
        self.locals.push((name.to_string(), value));
    }

    pub(crate) fn pop_locals(&mut self, count: usize) {
        let keep = self.locals.len().saturating_sub(count);
        self.locals.truncate(keep);
    }

    fn available_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.kwds.keys().cloned().collect();
        keys.extend(self.locals.iter().map(|(k, _)| k.clone()));
        keys.sort();
        keys.dedup();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kwds() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("domain".to_string(), Value::from("com.example")),
            ("flag".to_string(), Value::from(false)),
        ])
    }

    #[test]
    fn test_lookup() {
        let kwds = kwds();
        let ctx = RenderContext::new(&[], &kwds);
        assert_eq!(ctx.lookup("domain").unwrap(), &Value::from("com.example"));
        assert_eq!(ctx.lookup_optional("flag"), Some(&Value::from(false)));
        assert!(ctx.lookup_optional("nope").is_none());
    }

    #[test]
    fn test_missing_key_lists_available() {
        let kwds = kwds();
        let ctx = RenderContext::new(&[], &kwds);
        assert_eq!(
            ctx.lookup("c"),
            Err(TemplateError::MissingKey {
                key: "c".to_string(),
                available: vec!["domain".to_string(), "flag".to_string()],
            })
        );
    }

    #[test]
    fn test_args_cursor() {
        let args = vec![Value::from("a"), Value::from("b")];
        let kwds = BTreeMap::new();
        let mut ctx = RenderContext::new(&args, &kwds);
        assert_eq!(ctx.next_arg().unwrap(), &Value::from("a"));
        assert_eq!(ctx.arg_at(0).unwrap(), &Value::from("a"));
        assert_eq!(ctx.next_arg().unwrap(), &Value::from("b"));
        assert_eq!(ctx.consumed(), 2);
        assert_eq!(
            ctx.next_arg(),
            Err(TemplateError::MissingArg { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_locals_shadow_keywords() {
        let kwds = kwds();
        let mut ctx = RenderContext::new(&[], &kwds);
        ctx.push_local("domain", Value::from("local"));
        assert_eq!(ctx.lookup("domain").unwrap(), &Value::from("local"));
        ctx.pop_locals(1);
        assert_eq!(ctx.lookup("domain").unwrap(), &Value::from("com.example"));
    }
}
