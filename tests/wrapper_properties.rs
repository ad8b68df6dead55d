use std::cell::Cell;

use pretty_assertions::assert_eq;
use rstest::rstest;
use typewrap::prelude::*;

/// `repeat(str, count=1, *multiples)` typed `(str: str, count: Numeric, multiples: Numeric)`,
/// counting how often its body runs.
fn repeat(calls: &Cell<usize>) -> WrappedCallable<impl Method + '_> {
    let params = Parameters::builder()
        .required("str")
        .optional("count")
        .rest("multiples")
        .build()
        .unwrap();
    let sig = TypeSignature::builder()
        .param("str", Type::Str)
        .param("count", Type::Numeric)
        .param("multiples", Type::Numeric)
        .build();
    let method = method_fn(move |args| {
        calls.set(calls.get() + 1);
        let times = args
            .positional()
            .iter()
            .skip(1)
            .filter_map(Value::as_number)
            .product::<f64>();
        Ok(Value::Str(args.required(0, "str")?.as_str().unwrap_or_default().repeat(times as usize)))
    });
    wrap("repeat", method, params, sig).unwrap()
}

/// `log(*, msg, severity=3, **extra)` typed `(msg: str, severity: Numeric, extra: str)`.
fn log_method(calls: &Cell<usize>) -> WrappedCallable<impl Method + '_> {
    let params = Parameters::builder()
        .keyword("msg")
        .optional_keyword("severity")
        .rest_keyword("extra")
        .build()
        .unwrap();
    let sig = TypeSignature::builder()
        .param("msg", Type::Str)
        .param("severity", Type::Numeric)
        .param("extra", Type::Str)
        .build();
    let method = method_fn(move |args| {
        calls.set(calls.get() + 1);
        let severity = args.keyword_or_else("severity", || Value::Int(3));
        Ok(Value::list(vec![args.required_keyword("msg")?.clone(), severity]))
    });
    wrap("log", method, params, sig).unwrap()
}

/// Keyword name and declared type of a keyword argument mismatch.
fn keyword_mismatch(err: Error) -> (String, Type) {
    match err {
        Error::ArgumentTypeMismatch { slot: ArgumentSlot::Keyword(name), expected, .. } => {
            (name, expected)
        },
        other => panic!("expected a keyword mismatch, got {:?}", other),
    }
}

#[rstest]
#[case(CallArguments::new().arg("x"), "x")]
#[case(CallArguments::new().arg("x").arg(3), "xxx")]
#[case(CallArguments::new().arg("x").arg(3).arg(2), "xxxxxx")]
#[case(CallArguments::new().arg("x").arg(2).arg(2).arg(0.5), "xx")]
fn rest_positional_type_applies_to_every_extra_argument(
    #[case] args: CallArguments,
    #[case] expected: &str,
) {
    let calls = Cell::new(0);
    let wrapped = repeat(&calls);
    assert_eq!(wrapped.call(args).unwrap(), Value::from(expected));
    assert_eq!(calls.get(), 1);
}

#[rstest]
#[case(CallArguments::new().arg(1), 0, Type::Str)]
#[case(CallArguments::new().arg("x").arg("3"), 1, Type::Numeric)]
#[case(CallArguments::new().arg("x").arg(3).arg(2).arg("bad"), 3, Type::Numeric)]
#[case(CallArguments::new().arg("x").arg(3).arg(2).arg(2).arg(Value::None), 4, Type::Numeric)]
fn positional_mismatch_names_position_and_skips_body(
    #[case] args: CallArguments,
    #[case] position: usize,
    #[case] expected_type: Type,
) {
    let calls = Cell::new(0);
    let wrapped = repeat(&calls);
    match wrapped.call(args) {
        Err(Error::ArgumentTypeMismatch { slot, expected, .. }) => {
            assert_eq!(slot, ArgumentSlot::Position(position));
            assert_eq!(expected, expected_type);
        },
        other => panic!("expected a positional mismatch, got {:?}", other),
    }
    assert_eq!(calls.get(), 0);
}

#[test]
fn log_scenario() {
    let calls = Cell::new(0);
    let log = log_method(&calls);

    let err = log.call(CallArguments::new().kwarg("msg", 123)).unwrap_err();
    assert_eq!(keyword_mismatch(err), ("msg".to_string(), Type::Str));

    let args = CallArguments::new().kwarg("msg", "hi").kwarg("severity", "Three");
    let err = log.call(args).unwrap_err();
    assert_eq!(keyword_mismatch(err), ("severity".to_string(), Type::Numeric));

    let args = CallArguments::new().kwarg("msg", "hi").kwarg("retries", 2);
    let err = log.call(args).unwrap_err();
    assert_eq!(keyword_mismatch(err), ("retries".to_string(), Type::Str));
    assert_eq!(calls.get(), 0);

    let result = log.call(CallArguments::new().kwarg("msg", "hi")).unwrap();
    assert_eq!(result, Value::list(vec!["hi".into(), 3.into()]));

    let args = CallArguments::new().kwarg("msg", "hi").kwarg("color", "red");
    let result = log.call(args).unwrap();
    assert_eq!(result, Value::list(vec!["hi".into(), 3.into()]));
    assert_eq!(calls.get(), 2);
}

#[rstest]
#[case::untyped_required(Parameters::builder().required("a").required("b").build().unwrap())]
#[case::untyped_rest(Parameters::builder().required("a").rest("more").build().unwrap())]
fn untyped_positional_slot_is_undeclared(#[case] params: Parameters) {
    let calls = Cell::new(0);
    let sig = TypeSignature::builder().param("a", Type::Int).build();
    let method = method_fn(|_args| {
        calls.set(calls.get() + 1);
        Ok(Value::None)
    });
    let wrapped = wrap("f", method, params, sig).unwrap();

    let err = wrapped.call(CallArguments::new().arg(1).arg(2)).unwrap_err();
    assert!(matches!(err, Error::MissingTypeDeclaration { slot: ArgumentSlot::Position(1) }));
    assert_eq!(calls.get(), 0);

    wrapped.call(CallArguments::new().arg(1)).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn untyped_rest_rejects_every_extra_at_its_own_position() {
    let params = Parameters::builder().required("a").optional("b").rest("more").build().unwrap();
    let sig = TypeSignature::builder().param("a", Type::Int).param("b", Type::Int).build();
    let wrapped = wrap("f", method_fn(|_args| Ok(Value::None)), params, sig).unwrap();

    assert!(wrapped.call(CallArguments::new().arg(1).arg(2)).is_ok());
    let err = wrapped.call(CallArguments::new().arg(1).arg(2).arg(3).arg(4)).unwrap_err();
    assert!(matches!(err, Error::MissingTypeDeclaration { slot: ArgumentSlot::Position(2) }));
}

#[test]
fn optional_keyword_may_be_omitted() {
    let calls = Cell::new(0);
    let log = log_method(&calls);
    assert!(log.call(CallArguments::new().kwarg("msg", "hi")).is_ok());
    assert!(log.call(CallArguments::new().kwarg("msg", "hi").kwarg("severity", 2.5)).is_ok());
}

#[test]
fn missing_required_keyword_is_a_mismatch() {
    let calls = Cell::new(0);
    let log = log_method(&calls);
    let err = log.call(CallArguments::new().kwarg("severity", 1)).unwrap_err();
    assert!(matches!(
        err,
        Error::ArgumentTypeMismatch { slot: ArgumentSlot::Keyword(ref k), ref actual, .. }
            if k == "msg" && actual == "missing"
    ));
    assert_eq!(calls.get(), 0);
}

#[rstest]
#[case::no_rest_parameter(Parameters::builder().keyword("msg").build().unwrap())]
#[case::untyped_rest_parameter(
    Parameters::builder().keyword("msg").rest_keyword("extra").build().unwrap()
)]
fn extra_keywords_without_rest_type_are_unexpected(#[case] params: Parameters) {
    let sig = TypeSignature::builder().param("msg", Type::Str).build();
    let wrapped = wrap("log", method_fn(|_args| Ok(Value::None)), params, sig).unwrap();
    let err = wrapped
        .call(CallArguments::new().kwarg("msg", "hi").kwarg("color", "red"))
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedKeywordArgument { ref keyword } if keyword == "color"));
}

#[test]
fn keyword_matched_once_is_not_rechecked_as_extra() {
    let params =
        Parameters::builder().optional_keyword("sep").rest_keyword("rest").build().unwrap();
    let sig = TypeSignature::builder().param("sep", Type::Str).param("rest", Type::Int).build();
    let wrapped = wrap("join", method_fn(|_args| Ok(Value::None)), params, sig).unwrap();
    assert!(wrapped.call(CallArguments::new().kwarg("sep", "-").kwarg("width", 3)).is_ok());
}

#[test]
fn calls_are_idempotent() {
    let calls = Cell::new(0);
    let wrapped = repeat(&calls);
    let args = CallArguments::new().arg("ab").arg(2);
    let first = wrapped.call(args.clone()).unwrap();
    let second = wrapped.call(args).unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.get(), 2);
    assert_eq!(wrapped.describe(), "repeat(str: str, count: Numeric = ..., *multiples: Numeric)");
}

#[test]
fn computed_default_is_never_validated() {
    let evaluations = Cell::new(0);
    let params = Parameters::builder().required("msg").optional("at").build().unwrap();
    let sig = TypeSignature::builder()
        .param("msg", Type::Str)
        .param("at", Type::Str)
        .build();
    let method = method_fn(|args| {
        let at = args.get_or_else(1, || {
            evaluations.set(evaluations.get() + 1);
            Value::Int(evaluations.get())
        });
        Ok(at)
    });
    let wrapped = wrap("stamp", method, params, sig).unwrap();

    // The default is an int although `at` is declared str; omitting it still passes.
    let first = wrapped.call(CallArguments::new().arg("tick")).unwrap();
    let second = wrapped.call(CallArguments::new().arg("tick")).unwrap();
    assert!(!Type::Str.accepts(&first));
    assert_eq!((first, second), (Value::Int(1), Value::Int(2)));

    // The same value supplied explicitly is rejected.
    let err = wrapped.call(CallArguments::new().arg("tick").arg(3)).unwrap_err();
    assert!(matches!(err, Error::ArgumentTypeMismatch { slot: ArgumentSlot::Position(1), .. }));
    assert_eq!(evaluations.get(), 2);
}

#[test]
fn shared_default_accumulates_across_calls() {
    let params = Parameters::builder().optional("a").build().unwrap();
    let sig = TypeSignature::builder().param("a", Type::list(Type::Int)).build();
    let shared = Value::list(vec![Value::from("not an int")]);
    let method = method_fn(move |args| {
        let a = args.get_or_else(0, || shared.clone());
        if let Value::List(items) = &a {
            items.borrow_mut().push(Value::Int(4));
        }
        Ok(a)
    });
    let wrapped = wrap("append_four", method, params, sig).unwrap();

    wrapped.call(CallArguments::new()).unwrap();
    let second = wrapped.call(CallArguments::new()).unwrap();
    assert_eq!(second.to_string(), "['not an int', 4, 4]");
}
