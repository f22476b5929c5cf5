//! Property-based tests for output capture
//!
//! For any sequence of `console.log` calls with literal arguments the runner
//! must capture exactly one line per call, in call order, each line being the
//! arguments joined by a single space.

use caddy_js::runner::{Bindings, Runner};
use proptest::prelude::*;

/// Arguments that survive a round trip through a single-quoted JS literal
fn argument_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9]{0,8}",
        "[a-z][a-z ]{0,10}",
        "[0-9]{1,4}\\.[0-9]{1,2}",
    ]
}

/// One call: a non-empty argument list
fn call_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(argument_strategy(), 1..4)
}

fn script_for(calls: &[Vec<String>]) -> String {
    calls
        .iter()
        .map(|args| {
            let literals: Vec<String> = args.iter().map(|arg| format!("'{}'", arg)).collect();
            format!("console.log({});", literals.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn one_line_per_call_in_order(calls in prop::collection::vec(call_strategy(), 0..6)) {
        let outcome = Runner::default()
            .run_source(&script_for(&calls), &Bindings::new())
            .unwrap();

        let expected: Vec<String> = calls.iter().map(|args| args.join(" ")).collect();
        prop_assert_eq!(outcome.stdout, expected);
    }

    #[test]
    fn scripts_without_output_capture_nothing(values in prop::collection::vec(0i32..1000, 0..8)) {
        let script = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("var v{} = {} * 2;", i, v))
            .collect::<Vec<_>>()
            .join("\n");
        let outcome = Runner::default().run_source(&script, &Bindings::new()).unwrap();
        prop_assert!(outcome.stdout.is_empty());
    }
}
