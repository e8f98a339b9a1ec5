use cmds_tokenize::{
    ArrayMode, QuoteKind, TokenizeOptions, Value, escape, escape_value, quote_dance,
    tokenize_option, tokenize_options,
};
use proptest::prelude::*;

fn split(s: &str) -> Vec<String> {
    shell_words::split(s).expect("escaped output must split")
}

proptest! {
    /// **Property 1: Escaped strings are one shell word**
    #[test]
    fn prop_escape_splits_back_to_input(s in "\\PC*") {
        prop_assert_eq!(split(&escape(&s)), vec![s]);
    }

    /// **Property 1b: Escaped strings with newlines are one shell word**
    #[test]
    fn prop_escape_handles_newlines(parts in proptest::collection::vec("[a-z $']{0,5}", 1..4)) {
        let s = parts.join("\n");
        prop_assert_eq!(split(&escape(&s)), vec![s]);
    }

    /// **Property 2: Escaped scalars stringify and split back**
    #[test]
    fn prop_escape_scalars(i in any::<i64>(), b in any::<bool>()) {
        prop_assert_eq!(split(&escape_value(&Value::from(i))), vec![i.to_string()]);
        prop_assert_eq!(split(&escape_value(&Value::from(b))), vec![b.to_string()]);
    }

    /// **Property 3: Single quote dance evaluates to the input**
    #[test]
    fn prop_single_quote_dance(s in "[^\\x00]*") {
        prop_assert_eq!(split(&quote_dance(&s, QuoteKind::Single)), vec![s]);
    }

    /// **Property 4: Double quote dance evaluates to the input**
    ///
    /// Backslashes and expansions stay special inside double quotes, so the
    /// input avoids them.
    #[test]
    fn prop_double_quote_dance(s in "[a-zA-Z0-9 '\"!.,]*") {
        prop_assert_eq!(split(&quote_dance(&s, QuoteKind::Double)), vec![s]);
    }

    /// **Property 5: Option maps are ordered by key whatever the input order**
    #[test]
    fn prop_options_sorted(
        keys in proptest::collection::btree_set("[a-z]{1,6}", 1..8),
        seed in any::<u64>()
    ) {
        let sorted: Vec<(String, Value)> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), Value::from(i)))
            .collect();

        let mut shuffled = sorted.clone();
        let len = shuffled.len();
        shuffled.rotate_left(usize::try_from(seed % len as u64).unwrap());
        shuffled.reverse();

        let opts = TokenizeOptions::default();
        prop_assert_eq!(
            tokenize_options(&shuffled, &opts).unwrap(),
            tokenize_options(&sorted, &opts).unwrap()
        );
    }

    /// **Property 6: Repeat mode emits one option per flattened element**
    #[test]
    fn prop_repeat_one_token_per_element(items in proptest::collection::vec(any::<i32>(), 0..10)) {
        let opts = TokenizeOptions::default().array_mode(ArrayMode::Repeat);
        let tokens = tokenize_option("blah", &Value::array(items.clone()), &opts).unwrap();
        prop_assert_eq!(tokens.len(), items.len());
        for (token, item) in tokens.iter().zip(&items) {
            prop_assert_eq!(token, &format!("--blah={item}"));
        }
    }
}

#[test]
fn test_options_order_examples() {
    let opts = TokenizeOptions::default();
    let a = vec![
        ("b".to_string(), Value::from(2)),
        ("a".to_string(), Value::from(1)),
        ("c".to_string(), Value::from(3)),
    ];
    let b = vec![
        ("a".to_string(), Value::from(1)),
        ("b".to_string(), Value::from(2)),
        ("c".to_string(), Value::from(3)),
    ];
    assert_eq!(tokenize_options(&a, &opts).unwrap(), "-a 1 -b 2 -c 3");
    assert_eq!(tokenize_options(&b, &opts).unwrap(), "-a 1 -b 2 -c 3");
}

#[test]
fn test_json_token_parses_back() {
    let opts = TokenizeOptions::default().array_mode(ArrayMode::Json);
    let tokens = tokenize_option("b", &Value::array([1, 2, 3]), &opts).unwrap();
    assert_eq!(tokens.len(), 1);
    let words = split(&tokens[0]);
    let parsed: serde_json::Value = serde_json::from_str(&words[1]).unwrap();
    assert_eq!(parsed, serde_json::json!([1, 2, 3]));
}

#[test]
fn test_shell_metacharacters_are_neutralized() {
    for input in ["; rm -rf /", "$(whoami)", "`ls`", "| nc", "> out.txt", "&& x", "$HOME", "${VAR}"] {
        assert_eq!(split(&escape(input)), vec![input.to_string()]);
    }
}

#[cfg(unix)]
mod posix_shell {
    use super::*;
    use std::process::Command;

    /// What `/bin/sh` hands to `printf %s` for `word`.
    fn shell_echo(word: &str) -> String {
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(format!("printf %s {word}"))
            .output()
            .expect("sh must run");
        assert!(output.status.success(), "sh failed for {word:?}");
        String::from_utf8(output.stdout).expect("utf-8 output")
    }

    #[test]
    fn test_quote_dance_evaluates_in_sh() {
        for input in ["", "plain", "it's", "say \"hi\"", "both ' and \"", "a b\tc", "x\ny", "''\"\""] {
            assert_eq!(shell_echo(&quote_dance(input, QuoteKind::Single)), input, "single: {input:?}");
            assert_eq!(shell_echo(&quote_dance(input, QuoteKind::Double)), input, "double: {input:?}");
        }
        for input in ["$HOME", "`ls`", "back\\slash", "$(whoami)"] {
            assert_eq!(shell_echo(&quote_dance(input, QuoteKind::Single)), input, "single: {input:?}");
        }
    }

    #[test]
    fn test_escape_evaluates_in_sh() {
        for input in ["", "my file.txt", "; rm -rf /", "$(whoami)", "a\nb", "it's \"quoted\"", "*?[x]"] {
            assert_eq!(shell_echo(&escape(input)), input, "escape: {input:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// **Property 7: Single quote dance survives a real shell**
        #[test]
        fn prop_single_quote_dance_in_sh(s in "[a-zA-Z0-9 '\"$`\\\\!;&|<>*?.]{0,20}") {
            prop_assert_eq!(shell_echo(&quote_dance(&s, QuoteKind::Single)), s);
        }
    }
}
