//! Command implementations.
//!
//! Each handler returns the process exit status on success; errors carry
//! context and are reported by `run`.

use anyhow::{Context, Result, bail};
use cmds_config::Config;
use cmds_runner::{Input, IoBlock};
use cmds_tokenize::Value;
use cmds_utils::{CmdsError, SpawnError};
use std::io::Write;

use super::args::{InputArgs, TemplateArgs};
use crate::cmd::{Cmd, Kwds};

/// Parse a value given on the command line: JSON when it parses as JSON,
/// otherwise the text itself.
#[must_use]
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text).map_or_else(|_| Value::from(text), Value::from)
}

/// Split `KEY=VALUE` pairs into keyword values.
pub fn parse_kwds(pairs: &[String]) -> Result<Kwds> {
    let mut kwds = Kwds::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("keyword value `{pair}` should be KEY=VALUE");
        };
        if key.is_empty() {
            bail!("keyword value `{pair}` has an empty key");
        }
        kwds.insert(key.to_string(), parse_value(value));
    }
    Ok(kwds)
}

fn values(template: &TemplateArgs) -> Result<(Vec<Value>, Kwds)> {
    let args = template.args.iter().map(|a| parse_value(a)).collect();
    let kwds = parse_kwds(&template.kwds)?;
    Ok((args, kwds))
}

fn input_of(input: &InputArgs) -> Option<Input> {
    if input.stdin {
        Some(Input::Inherit)
    } else {
        input.input.as_deref().map(Input::from)
    }
}

pub fn execute_prepare_command(template: &TemplateArgs, config: &Config) -> Result<i32> {
    let (args, kwds) = values(template)?;
    let prepared = Cmd::with_config(&template.template, config)
        .prepare(&args, &kwds)
        .map_err(CmdsError::from)
        .context("Failed to prepare command")?;
    println!("{prepared}");
    Ok(0)
}

pub fn execute_run_command(
    template: &TemplateArgs,
    input: &InputArgs,
    config: &Config,
) -> Result<i32> {
    let (args, kwds) = values(template)?;
    let cmd = Cmd::with_config(&template.template, config);

    let status = match input_of(input) {
        Some(input) => cmd.stream_with(&args, &kwds, IoBlock::input(move || input)),
        None => cmd.stream(&args, &kwds),
    }
    .context("Failed to run command")?;

    if cmd.is_asserting() {
        let prepared = cmd.prepare(&args, &kwds).map_err(CmdsError::from)?;
        SpawnError::check_status(&prepared, status, None).map_err(CmdsError::from)?;
    }
    Ok(status)
}

pub fn execute_capture_command(
    template: &TemplateArgs,
    input: &InputArgs,
    json: bool,
    config: &Config,
) -> Result<i32> {
    let (args, kwds) = values(template)?;
    let result = Cmd::with_config(&template.template, config)
        .capture(&args, &kwds, input_of(input))
        .context("Failed to capture command")?;

    if json {
        println!("{}", result.to_json());
        return Ok(0);
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.out.as_bytes())?;
    stdout.flush()?;
    let mut stderr = std::io::stderr().lock();
    stderr.write_all(result.err.as_bytes())?;
    Ok(result.status)
}

pub fn execute_config_command(json: bool, config: &Config) -> Result<i32> {
    let effective = config.effective_config();

    if json {
        let object: serde_json::Map<String, serde_json::Value> = effective
            .into_iter()
            .map(|(key, (value, source))| {
                (
                    key,
                    serde_json::json!({ "value": value, "source": source.label() }),
                )
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&object)?);
        return Ok(0);
    }

    if let Some(path) = &config.path {
        println!("# {}", path.display());
    }
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in effective {
        println!("{key:<width$} = {value:?}  ({source})");
    }
    Ok(0)
}
