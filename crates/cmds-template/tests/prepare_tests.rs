use cmds_template::{Format, Template, render};
use cmds_tokenize::{TokenizeOptions, Value};
use cmds_utils::TemplateError;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn kwds(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn prepare(
    template: &str,
    args: &[Value],
    kwds: &BTreeMap<String, Value>,
) -> Result<String, TemplateError> {
    render(template, args, kwds, &TokenizeOptions::default(), Format::Squish)
}

fn psql_opts() -> Value {
    Value::map([
        ("username", Value::from("bingo bob")),
        ("host", Value::from("localhost")),
        ("port", Value::from(12345)),
    ])
}

const PSQL: &str = r"psql --host=localhost --port=12345 --username=bingo\ bob blah < /where\ ever/it/is.psql";

#[test]
fn test_keyword_substitutions() {
    let k = kwds(&[
        ("database", Value::from("blah")),
        ("filepath", Value::from("/where ever/it/is.psql")),
        ("opts", psql_opts()),
    ]);
    assert_eq!(
        prepare("psql <%= opts %> <%= database %> < <%= filepath %>", &[], &k).unwrap(),
        PSQL
    );
    assert_eq!(
        prepare("psql %{opts} %{database} < %{filepath}", &[], &k).unwrap(),
        PSQL
    );
}

#[test]
fn test_positional_substitutions() {
    let args = [psql_opts(), Value::from("blah"), Value::from("/where ever/it/is.psql")];
    assert_eq!(
        prepare("psql <%= arg %> <%= arg %> < <%= arg %>", &args, &BTreeMap::new()).unwrap(),
        PSQL
    );
    assert_eq!(prepare("psql %s %s < %s", &args, &BTreeMap::new()).unwrap(), PSQL);
}

#[test]
fn test_direct_arg_references() {
    let args = [Value::from("blah"), psql_opts(), Value::from("/where ever/it/is.psql")];
    assert_eq!(
        prepare(
            "psql <%= @args[1] %> <%= @args[0] %> < <%= @args[2] %>",
            &args,
            &BTreeMap::new()
        )
        .unwrap(),
        PSQL
    );
}

#[test]
fn test_no_values() {
    assert_eq!(
        prepare("blah <% if true %>blow<% end %>", &[], &BTreeMap::new()).unwrap(),
        "blah blow"
    );
}

#[test]
fn test_positional_and_keyword() {
    let k = kwds(&[("y", Value::from("why"))]);
    assert_eq!(
        prepare("blah <%= arg %> <%= y %>", &[Value::from("ex")], &k).unwrap(),
        "blah ex why"
    );
}

const DEFAULTS_EXPORT: &str = "
    defaults
    <% if current_host? %>
      -currentHost <%= current_host %>
    <% end %>
    export <%= domain %> <%= filepath %>
";

#[test]
fn test_if_with_value_present() {
    let k = kwds(&[
        ("current_host", Value::from("xyz")),
        ("domain", Value::from("com.nrser.blah")),
        ("filepath", Value::from("/tmp/export.plist")),
    ]);
    assert_eq!(
        prepare(DEFAULTS_EXPORT, &[], &k).unwrap(),
        "defaults -currentHost xyz export com.nrser.blah /tmp/export.plist"
    );
}

#[test]
fn test_if_with_value_missing() {
    let k = kwds(&[
        ("domain", Value::from("com.nrser.blah")),
        ("filepath", Value::from("/tmp/export.plist")),
    ]);
    assert_eq!(
        prepare(DEFAULTS_EXPORT, &[], &k).unwrap(),
        "defaults export com.nrser.blah /tmp/export.plist"
    );
}

#[test]
fn test_loop_escapes_values() {
    let tpl = "
        defaults write <%= domain %> <%= key %> -dict
        <% for key, value in values %>
          <%= key %> <%= value %>
        <% end %>
    ";
    let k = kwds(&[
        ("domain", Value::from("com.nrser.blah")),
        ("key", Value::from("k")),
        ("values", Value::map([("x", "<ex>"), ("y", "why")])),
    ]);
    assert_eq!(
        prepare(tpl, &[], &k).unwrap(),
        r"defaults write com.nrser.blah k -dict x \<ex\> y why"
    );
}

#[test]
fn test_optional_subs_are_omitted() {
    let k = kwds(&[("x", Value::from("ex")), ("z", Value::from("zee"))]);
    assert_eq!(
        prepare("blah <%= x? %> <%= y? %> <%= z? %>", &[], &k).unwrap(),
        "blah ex zee"
    );
}

#[test]
fn test_optional_false_is_omitted() {
    let k = kwds(&[("x", Value::from(false))]);
    assert_eq!(prepare("%{x?}", &[], &k).unwrap(), "");
}

#[test]
fn test_missing_keyword_fails() {
    let k = kwds(&[("b", Value::from("bee!"))]);
    let err = prepare("a <%= b %> <%= c %>", &[], &k).unwrap_err();
    assert_eq!(
        err,
        TemplateError::MissingKey {
            key: "c".to_string(),
            available: vec!["b".to_string()],
        }
    );
}

#[test]
fn test_missing_positional_fails() {
    let err = prepare("a <%= arg %> <%= arg %>", &[Value::from("bee!")], &BTreeMap::new())
        .unwrap_err();
    assert_eq!(err, TemplateError::MissingArg { index: 1, count: 1 });
}

#[test]
fn test_shortcuts() {
    let args = [Value::from("hello world!")];
    let k = kwds(&[("key", Value::from("hello world!"))]);
    let expected = r"./test/echo_cmd.rb hello\ world\!";

    assert_eq!(prepare("./test/echo_cmd.rb %s", &args, &BTreeMap::new()).unwrap(), expected);
    assert_eq!(prepare("./test/echo_cmd.rb %{key}", &[], &k).unwrap(), expected);
    assert_eq!(prepare("./test/echo_cmd.rb %<key>s", &[], &k).unwrap(), expected);
}

#[test]
fn test_pretty_format_keeps_lines() {
    let template = Template::parse(
        "
        psql
          --host=<%= host %>
          <%= database %>
        ",
    )
    .unwrap();
    let k = kwds(&[("host", Value::from("db.local")), ("database", Value::from("app"))]);
    assert_eq!(
        template
            .render(&[], &k, &TokenizeOptions::default(), Format::Pretty)
            .unwrap(),
        "psql \\\n  --host=db.local \\\n  app"
    );
}

#[test]
fn test_tokenize_options_flow_through() {
    let k = kwds(&[("opts", Value::map([("tags", Value::array(["a", "b"]))]))]);
    let opts = TokenizeOptions::default().array_mode("repeat".parse().unwrap());
    assert_eq!(
        render("tag %{opts}", &[], &k, &opts, Format::Squish).unwrap(),
        "tag --tags=a --tags=b"
    );
}

proptest! {
    /// **Property 1: Positional values round-trip through the shell**
    ///
    /// A value substituted with `%s` is read back by a shell word splitter as
    /// exactly one word equal to the value. Squishing trims trailing
    /// whitespace, so values end in a non-space.
    #[test]
    fn prop_positional_value_is_one_word(
        value in "([a-zA-Z0-9 !$&*()\\[\\]{};'\"|?<>~#=-]{0,39}[a-zA-Z0-9!$&*(){};'\"|?<>~#=-])?"
    ) {
        let cmd = prepare("echo %s", &[Value::from(value.as_str())], &BTreeMap::new()).unwrap();
        let words = shell_words::split(&cmd).unwrap();
        prop_assert_eq!(words, vec!["echo".to_string(), value]);
    }
}
