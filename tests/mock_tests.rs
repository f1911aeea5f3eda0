//! Integration tests for mock functions and delegating object views

use idatest::prelude::*;
use idatest::MockObjectView;
use std::rc::Rc;

fn service() -> Value {
    let obj = Value::object([("name", Value::from("service")), ("port", Value::from(8080))]);
    obj.set(
        "address",
        Value::function("address", |this, _| {
            let name = this.get("name")?;
            let port = this.get("port")?;
            Ok(Value::from(format!("{}:{}", name, port)))
        }),
    )
    .unwrap();
    obj
}

mod mock_fn {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_has_one_entry_per_call() {
        let mock = create_mock_fn(Value::Undefined);
        let args = [
            vec![],
            vec![Value::from(1), Value::from(2)],
            vec![Value::Null, Value::from("x")],
        ];
        for call in &args {
            mock.call(call).unwrap();
        }
        assert_eq!(mock.calls(), args.to_vec());
    }

    #[test]
    fn test_log_keeps_object_identity() {
        let mock = create_mock_fn(Value::Undefined);
        let payload = Value::new_object();
        mock.call(&[payload.clone()]).unwrap();
        assert!(mock.calls()[0][0].strict_equals(&payload));
    }

    #[test]
    fn test_clones_share_state() {
        let mock = create_mock_fn(1);
        let other = mock.clone();
        other.call(&[]).unwrap();
        other.set_return_value(2);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.call(&[]).unwrap(), Value::from(2));
    }

    #[test]
    fn test_implementation_sees_receiver() {
        let mock = create_mock_fn(Value::Undefined);
        mock.returns_with(|this, _| this.get("id"));
        let owner = Value::object([("id", 3)]);
        owner.set("method", mock.to_value()).unwrap();
        assert_eq!(owner.call_method("method", &[]).unwrap(), Value::from(3));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mock = create_mock_fn("start");
        mock.returns_with(|_, _| Ok(Value::from("impl")));
        mock.call(&[Value::from(1)]).unwrap();
        mock.reset();
        assert!(mock.calls().is_empty());
        assert_eq!(mock.call(&[]).unwrap(), Value::from("start"));
    }
}

mod mock_obj {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_prefer_overrides() {
        let view = create_mock_obj(&service(), &Value::object([("port", 9)]));
        assert_eq!(view.get("port").unwrap(), Value::from(9));
        assert_eq!(view.get("name").unwrap(), Value::from("service"));
    }

    #[test]
    fn test_original_methods_keep_their_receiver() {
        let original = service();
        let view = create_mock_obj(&original, &Value::object([("port", 9)]));
        let address = view.get("address").unwrap();
        assert!(address.is_callable());
        // Bound to the original, so it sees the original port
        assert_eq!(
            address.call(&view, &[]).unwrap(),
            Value::from("service:8080")
        );
    }

    #[test]
    fn test_override_functions_are_not_rebound() {
        let mock = create_mock_fn("stubbed");
        let view = create_mock_obj(
            &service(),
            &Value::object([("address", mock.to_value())]),
        );
        assert_eq!(view.call_method("address", &[Value::from(1)]).unwrap(), Value::from("stubbed"));
        assert_eq!(mock.calls(), vec![vec![Value::from(1)]]);
    }

    #[test]
    fn test_writes_split_between_overrides_and_backing() {
        let original = service();
        let overrides = Value::object([("port", 9)]);
        let view = create_mock_obj(&original, &overrides);

        view.set("port", Value::from(10)).unwrap();
        view.set("name", Value::from("renamed")).unwrap();

        assert_eq!(overrides.get("port").unwrap(), Value::from(10));
        assert!(!overrides.has("name").unwrap());
        assert_eq!(original.get("port").unwrap(), Value::from(8080));
        assert_eq!(original.get("name").unwrap(), Value::from("service"));
        assert_eq!(view.get("name").unwrap(), Value::from("renamed"));
    }

    #[test]
    fn test_enumeration_is_a_union() {
        let view = create_mock_obj(&service(), &Value::object([("port", 9), ("debug", 1)]));
        assert_eq!(view.keys().unwrap(), vec!["name", "port", "address", "debug"]);
        assert!(view.has("debug").unwrap());
        assert!(view.has("address").unwrap());
    }

    #[test]
    fn test_view_can_be_built_directly() {
        let view = MockObjectView::new(service(), Value::object([("port", 1)]));
        assert_eq!(view.get("port").unwrap(), Value::from(1));
        let wrapped = Value::host(Rc::new(view));
        assert!(wrapped.is_host());
        assert_eq!(wrapped.get("name").unwrap(), Value::from("service"));
    }

    #[test]
    fn test_assertions_work_on_views() {
        let collector = idatest::AssertionCollector::new();
        let e = Expect::new(collector.clone());
        let view = create_mock_obj(&service(), &Value::object([("port", 9)]));
        e.has_function("address", &view);
        e.has_properties(&["name", "port"], &view);
        e.object(view.clone());
        assert!(collector.failures().is_empty());
        assert_eq!(collector.len(), 3);
    }
}
