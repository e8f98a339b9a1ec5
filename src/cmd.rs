//! The `Cmd` command object.
//!
//! A [`Cmd`] bundles a template with base values and run settings, so a
//! command can be defined once and prepared or run many times.

use cmds_config::{Config, EnvMode};
use cmds_runner::{CmdResult, Input, IoBlock, SpawnOptions, Spawner, capture, chomp};
use cmds_template::{Format, RenderContext, Template};
use cmds_tokenize::{TokenizeOptions, Value, escape};
use cmds_utils::{CmdsError, SpawnError, TemplateError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keyword values, by name.
pub type Kwds = BTreeMap<String, Value>;

/// A command template with base values and run settings.
///
/// Values given to an operation are appended to (positional) or merged over
/// (keyword) the base values.
///
/// ```rust
/// use cmds::{Cmd, Kwds};
/// use cmds_tokenize::Value;
///
/// let psql = Cmd::new("psql %{opts} %s")
///     .kwd("opts", Value::map([("host", "localhost"), ("username", "bingo bob")]));
///
/// assert_eq!(
///     psql.prepare(&[Value::from("blah")], &Kwds::new()).unwrap(),
///     r"psql --host=localhost --username=bingo\ bob blah"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cmd {
    template: String,
    args: Vec<Value>,
    kwds: Kwds,
    input: Option<Vec<u8>>,
    assert: bool,
    env: BTreeMap<String, String>,
    env_mode: EnvMode,
    format: Format,
    chdir: Option<PathBuf>,
    unset_env: bool,
    tokenize: TokenizeOptions,
}

impl Cmd {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// A command with its settings taken from `config`.
    #[must_use]
    pub fn with_config(template: impl Into<String>, config: &Config) -> Self {
        Self {
            template: template.into(),
            assert: config.run.assert,
            env: config.env.clone(),
            env_mode: config.run.env_mode,
            format: config.run.format,
            chdir: config.run.chdir.clone(),
            unset_env: config.run.unset_env,
            tokenize: config.tokenize.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub const fn kwds(&self) -> &Kwds {
        &self.kwds
    }

    #[must_use]
    pub const fn is_asserting(&self) -> bool {
        self.assert
    }

    /// Append a base positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a base keyword value.
    #[must_use]
    pub fn kwd(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwds.insert(name.into(), value.into());
        self
    }

    /// Default stdin for every run.
    #[must_use]
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Fail captures and checked operations on non-zero exit status.
    #[must_use]
    pub const fn assert(mut self, assert: bool) -> Self {
        self.assert = assert;
        self
    }

    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub const fn env_mode(mut self, mode: EnvMode) -> Self {
        self.env_mode = mode;
        self
    }

    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn chdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.chdir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub const fn unset_env(mut self, unset: bool) -> Self {
        self.unset_env = unset;
        self
    }

    #[must_use]
    pub fn tokenize_options(mut self, options: TokenizeOptions) -> Self {
        self.tokenize = options;
        self
    }

    /// A new command with `args` appended, `kwds` merged over the base
    /// keywords and, if given, `input` replacing the default input.
    #[must_use]
    pub fn curry(
        &self,
        args: impl IntoIterator<Item = Value>,
        kwds: Kwds,
        input: Option<Vec<u8>>,
    ) -> Self {
        let mut curried = self.clone();
        curried.args.extend(args);
        curried.kwds.extend(kwds);
        if input.is_some() {
            curried.input = input;
        }
        curried
    }

    /// Render the template without whitespace formatting.
    ///
    /// Under [`EnvMode::Inline`] the environment is prepended as
    /// `NAME=value` assignments, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] for bad templates or missing values.
    pub fn render(&self, args: &[Value], kwds: &Kwds) -> Result<String, TemplateError> {
        let template = Template::parse(&self.template)?;

        let all_args: Vec<Value> = self.args.iter().chain(args).cloned().collect();
        let mut all_kwds = self.kwds.clone();
        all_kwds.extend(kwds.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut ctx = RenderContext::new(&all_args, &all_kwds);
        let rendered = Format::Raw.apply(&template.render_with(&mut ctx, &self.tokenize)?);

        if self.env_mode == EnvMode::Inline && !self.env.is_empty() {
            let assignments: Vec<String> = self
                .env
                .iter()
                .map(|(name, value)| format!("{name}={}", escape(value)))
                .collect();
            return Ok(format!("{}\n\n{rendered}", assignments.join("\n\n")));
        }
        Ok(rendered)
    }

    /// Render and format the command string.
    ///
    /// # Errors
    ///
    /// See [`Cmd::render`].
    pub fn prepare(&self, args: &[Value], kwds: &Kwds) -> Result<String, TemplateError> {
        let prepared = self.format.apply(&self.render(args, kwds)?);
        debug!(cmd = %prepared, format = %self.format, "prepared command");
        Ok(prepared)
    }

    /// Spawn options for this command. Never asserting: each operation
    /// decides that itself.
    #[must_use]
    pub fn spawn_options(&self) -> SpawnOptions {
        let mut options = SpawnOptions::new().unset_env(self.unset_env);
        if let Some(dir) = &self.chdir {
            options = options.chdir(dir);
        }
        if self.env_mode == EnvMode::SpawnArg {
            options = options.envs(self.env.clone());
        }
        options
    }

    fn default_input(&self) -> Option<Input> {
        self.input.clone().map(Input::Bytes)
    }

    /// Run and collect stdout and stderr.
    ///
    /// `input` replaces the default input when given.
    ///
    /// # Errors
    ///
    /// Render and spawn errors, and [`SpawnError::NonZeroExit`] when the
    /// command asserts and exits non-zero.
    pub fn capture(
        &self,
        args: &[Value],
        kwds: &Kwds,
        input: Option<Input>,
    ) -> Result<CmdResult, CmdsError> {
        let cmd = self.prepare(args, kwds)?;
        let input = input.or_else(|| self.default_input());
        let result = capture(&cmd, input, &self.spawn_options())?;
        if self.assert {
            return Ok(result.assert()?);
        }
        Ok(result)
    }

    /// Run with output going to this process's stdout and stderr.
    ///
    /// # Errors
    ///
    /// Render and spawn errors. A non-zero status is not an error.
    pub fn stream(&self, args: &[Value], kwds: &Kwds) -> Result<i32, CmdsError> {
        self.stream_with(args, kwds, IoBlock::None)
    }

    /// Run with input and sinks set up by `io`.
    ///
    /// # Errors
    ///
    /// As for [`Cmd::stream`], plus [`SpawnError::ConflictingInput`] if the
    /// command has a default input and `io` supplies one too.
    pub fn stream_with(&self, args: &[Value], kwds: &Kwds, io: IoBlock<'_>) -> Result<i32, CmdsError> {
        let cmd = self.prepare(args, kwds)?;
        let spawner = Spawner::new(self.spawn_options());
        Ok(spawner.spawn(&cmd, self.default_input(), io)?)
    }

    /// Stream, failing on a non-zero status.
    ///
    /// # Errors
    ///
    /// As for [`Cmd::stream`], plus [`SpawnError::NonZeroExit`].
    pub fn stream_checked(&self, args: &[Value], kwds: &Kwds) -> Result<(), CmdsError> {
        let cmd = self.prepare(args, kwds)?;
        let status = Spawner::new(self.spawn_options()).spawn(&cmd, self.default_input(), IoBlock::None)?;
        SpawnError::check_status(&cmd, status, None)?;
        Ok(())
    }

    /// Stream and report whether the status was zero.
    ///
    /// # Errors
    ///
    /// See [`Cmd::stream`].
    pub fn is_ok(&self, args: &[Value], kwds: &Kwds) -> Result<bool, CmdsError> {
        Ok(self.stream(args, kwds)? == 0)
    }

    /// Stream and report whether the status was non-zero.
    ///
    /// # Errors
    ///
    /// See [`Cmd::stream`].
    pub fn is_error(&self, args: &[Value], kwds: &Kwds) -> Result<bool, CmdsError> {
        Ok(self.stream(args, kwds)? != 0)
    }

    /// Captured stdout.
    ///
    /// # Errors
    ///
    /// See [`Cmd::capture`].
    pub fn out(&self, args: &[Value], kwds: &Kwds, input: Option<Input>) -> Result<String, CmdsError> {
        Ok(self.capture(args, kwds, input)?.out)
    }

    /// Captured stdout, failing on a non-zero status whether or not the
    /// command asserts.
    ///
    /// # Errors
    ///
    /// See [`Cmd::capture`].
    pub fn out_checked(
        &self,
        args: &[Value],
        kwds: &Kwds,
        input: Option<Input>,
    ) -> Result<String, CmdsError> {
        Ok(self.capture(args, kwds, input)?.assert()?.out)
    }

    /// Captured stdout without its trailing newline.
    ///
    /// # Errors
    ///
    /// See [`Cmd::capture`].
    pub fn chomp(&self, args: &[Value], kwds: &Kwds, input: Option<Input>) -> Result<String, CmdsError> {
        Ok(chomp(&self.out(args, kwds, input)?).to_string())
    }

    /// [`Cmd::out_checked`] without the trailing newline.
    ///
    /// # Errors
    ///
    /// See [`Cmd::out_checked`].
    pub fn chomp_checked(
        &self,
        args: &[Value],
        kwds: &Kwds,
        input: Option<Input>,
    ) -> Result<String, CmdsError> {
        Ok(chomp(&self.out_checked(args, kwds, input)?).to_string())
    }

    /// Captured stderr.
    ///
    /// # Errors
    ///
    /// See [`Cmd::capture`].
    pub fn err(&self, args: &[Value], kwds: &Kwds, input: Option<Input>) -> Result<String, CmdsError> {
        Ok(self.capture(args, kwds, input)?.err)
    }

    /// Stream with this process's stdin passed straight to the child.
    ///
    /// # Errors
    ///
    /// See [`Cmd::stream_with`].
    pub fn proxy(&self) -> Result<i32, CmdsError> {
        self.stream_with(&[], &Kwds::new(), IoBlock::input(|| Input::Inherit))
    }
}
