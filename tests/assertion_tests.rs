//! Integration tests for the assertion façade

mod common;

use common::{captured_context, run_local};
use idatest::prelude::*;
use idatest::{AssertionCollector, FailureKind};

fn expect() -> (Expect, AssertionCollector) {
    let collector = AssertionCollector::new();
    (Expect::new(collector.clone()), collector)
}

mod collection_equal {
    use super::*;

    #[test]
    fn test_equal_collections_pass() {
        let (e, _) = expect();
        assert!(e
            .collection_equal(Value::array([1, 2, 3]), Value::array([1, 2, 3]))
            .is_passed());
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let (e, _) = expect();
        let detail = e
            .collection_equal(Value::array([1, 2]), Value::array([1, 2, 3]))
            .into_result()
            .unwrap_err();
        assert_eq!(detail.kind, FailureKind::Assertion);
        assert!(detail.message.contains("different lengths"));
        assert!(detail.message.contains("(length 2): [1, 2]"));
        assert!(detail.message.contains("(length 3): [1, 2, 3]"));
    }

    #[test]
    fn test_first_differing_index_is_reported() {
        let (e, _) = expect();
        let detail = e
            .collection_equal(Value::array([1, 2, 3]), Value::array([1, 9, 3]))
            .into_result()
            .unwrap_err();
        assert!(detail.message.contains("index 1"));
        assert!(detail.message.contains("[1, 9, 3]"));
    }

    #[test]
    fn test_non_iterable_fails_without_panicking() {
        let (e, collector) = expect();
        assert!(!e.collection_equal(Value::new_object(), Value::array([1])).is_passed());
        assert_eq!(collector.failures().len(), 1);
    }
}

mod dynamic_dispatch {
    use super::*;

    #[test]
    fn test_script_names_map_to_predicates() {
        let (e, collector) = expect();
        let cases: Vec<(&str, Vec<Value>)> = vec![
            ("true", vec![Value::from(true)]),
            ("equal", vec![Value::from("a"), Value::from("a")]),
            ("integer", vec![Value::from(4)]),
            ("lessThan", vec![Value::from(10), Value::from(3)]),
            ("between", vec![Value::from(1), Value::from(3), Value::from(3)]),
            ("count", vec![Value::from(2), Value::array([7, 8])]),
            ("oneOf", vec![Value::from(2), Value::array([1, 2])]),
            ("evenNumber", vec![Value::from(8)]),
            ("email", vec![Value::from("qa@example.org")]),
            ("uuid", vec![Value::from("550e8400-e29b-41d4-a716-446655440000")]),
            ("collectionEqual", vec![Value::array([1]), Value::array([1])]),
        ];
        for (name, args) in &cases {
            let outcome = e.call(name, args).unwrap();
            assert!(outcome.is_passed(), "{} should pass", name);
        }
        assert_eq!(collector.len(), cases.len());
    }

    #[test]
    fn test_strict_bounds_exclude_equality() {
        let (e, _) = expect();
        let same = [Value::from(5), Value::from(5)];
        assert!(!e.call("greaterThan", &same).unwrap().is_passed());
        assert!(!e.call("lessThan", &same).unwrap().is_passed());
        assert!(e.call("greaterThanOrEqual", &same).unwrap().is_passed());
        assert!(e.call("lte", &same).unwrap().is_passed());
    }

    #[test]
    fn test_trailing_string_is_the_message() {
        let (e, _) = expect();
        let detail = e
            .call("equal", &[Value::from(1), Value::from(2), Value::from("ids differ")])
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(detail.message, "ids differ");
    }

    #[test]
    fn test_unknown_name_propagates() {
        let (e, collector) = expect();
        for name in ["hasElement", "instanceOf", "toEqual"] {
            let err = e.call(name, &[]).unwrap_err();
            assert!(matches!(err, Error::UnknownAssertion(_)));
        }
        assert!(collector.is_empty());
    }
}

mod inside_runs {
    use super::*;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_unknown_assertion_fails_only_its_test() {
        let (mut ctx, _console) = captured_context();
        ctx.test("typo", |e| -> Result<()> {
            e.call("equl", &[Value::from(1), Value::from(1)])?;
            Ok(())
        })
        .unwrap();
        ctx.test("fine", |e| {
            e.is_true(true);
        })
        .unwrap();

        let report = run_local(&ctx).await;
        let typo = report.record("typo").unwrap();
        assert_eq!(typo.failures[0].kind, FailureKind::Uncaught);
        assert!(typo.failures[0].message.contains("Unknown assertion method: equl"));
        assert!(report.record("fine").unwrap().passed);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_throws_inside_a_test() {
        let (mut ctx, _console) = captured_context();
        ctx.test("throws", |e| {
            e.throws(|| Value::Undefined.get("x"), Some("Cannot read property"));
            let not_callable = Value::from(3);
            e.throws(|| not_callable.call(&Value::Undefined, &[]), Some("is not a function"));
        })
        .unwrap();

        let report = run_local(&ctx).await;
        assert!(report.all_passed());
    }
}
