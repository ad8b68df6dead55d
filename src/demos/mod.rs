//! Example call sites for the typed-method wrapper.
//!
//! Every guarded demo prints the declared signature followed by one line per
//! example call: the result, or `error: <message>` for a rejected call. No
//! validation failure escapes a guarded demo. [`ticker`] is the exception:
//! it loops until interrupted and lets any failure end the run.

use std::cell::Cell;
use std::io::Write;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::signature::{Parameters, TypeSignature};
use crate::types::{Type, Value};
use crate::wrapper::{method_fn, wrap, CallArguments, Method, WrappedCallable};

/// Names accepted by [`run`], in the order [`run_all`] runs them.
pub const DEMOS: &[&str] = &["repeat", "log", "returns", "computed-default", "shared-default"];

/// Longest string `repeat` will build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

/// `repeat(str, count=1, *multiples)`: `str` repeated `count * product(multiples)` times.
pub fn repeat() -> Result<WrappedCallable<impl Method>> {
    let params = Parameters::builder().required("str").optional("count").rest("multiples").build()?;
    let signature = TypeSignature::builder()
        .param("str", Type::Str)
        .param("count", Type::Numeric)
        .param("multiples", Type::Numeric)
        .returns(Type::Str)
        .build();

    let method = method_fn(|args| {
        let text = args
            .required(0, "str")?
            .as_str()
            .ok_or_else(|| Error::argument_error("`str` must be a string"))?
            .to_string();
        let count = number(&args.get_or_else(1, || Value::Int(1)))?;
        let times = args
            .rest_from(2)
            .iter()
            .try_fold(count, |acc, v| number(v).map(|n| acc * n))?;
        Ok(Value::Str(text.repeat(repeat_count(times, text.len())?)))
    });
    wrap("repeat", method, params, signature)
}

/// `log(*, msg, severity=3, **extra)`: formats a log line.
pub fn log_line() -> Result<WrappedCallable<impl Method>> {
    let params = Parameters::builder()
        .keyword("msg")
        .optional_keyword("severity")
        .rest_keyword("extra")
        .build()?;
    let signature = TypeSignature::builder()
        .param("msg", Type::Str)
        .param("severity", Type::Numeric)
        .param("extra", Type::Str)
        .returns(Type::Str)
        .build();

    let method = method_fn(|args| {
        let msg = plain(args.required_keyword("msg")?);
        let severity = args.keyword_or_else("severity", || Value::Int(3));
        let extra = args
            .rest_keywords(&["msg", "severity"])
            .map(|(k, v)| format!("{}={}", k, plain(v)))
            .collect::<Vec<_>>();
        let mut line = format!("[{}] {}", severity, msg);
        if !extra.is_empty() {
            line.push_str(&format!(" ({})", extra.join(", ")));
        }
        Ok(Value::Str(line))
    });
    wrap("log", method, params, signature)
}

/// `average(*values) -> float`, which returns an `int` whenever the mean is whole.
pub fn average() -> Result<WrappedCallable<impl Method>> {
    let params = Parameters::builder().rest("values").build()?;
    let signature =
        TypeSignature::builder().param("values", Type::Numeric).returns(Type::Float).build();

    let method = method_fn(|args| {
        let values = args.rest_from(0);
        if values.is_empty() {
            return Err(Error::argument_error("average of no values"));
        }
        let sum = values.iter().map(number).sum::<Result<f64>>()?;
        let mean = sum / values.len() as f64;
        if mean.fract() == 0.0 {
            Ok(Value::Int(mean as i64))
        } else {
            Ok(Value::Float(mean))
        }
    });
    wrap("average", method, params, signature)
}

/// `stamp(msg, at=clock())`: `at` is declared `str`, but its default is the
/// integer `clock()` returns, computed fresh on every call that omits it.
pub fn stamp(clock: impl Fn() -> i64) -> Result<WrappedCallable<impl Method>> {
    let params = Parameters::builder().required("msg").optional("at").build()?;
    let signature = TypeSignature::builder()
        .param("msg", Type::Str)
        .param("at", Type::Str)
        .returns(Type::Str)
        .build();

    let method = method_fn(move |args| {
        let msg = plain(args.required(0, "msg")?);
        let at = args.get_or_else(1, || Value::Int(clock()));
        Ok(Value::Str(format!("{} @ {}", msg, plain(&at))))
    });
    wrap("stamp", method, params, signature)
}

/// `append_four(a=[1, 2, 3])`: appends 4 to `a` and returns it. The default
/// list is built once, when the method is defined, and shared by every call
/// that omits `a`.
pub fn append_four() -> Result<WrappedCallable<impl Method>> {
    let params = Parameters::builder().optional("a").build()?;
    let signature = TypeSignature::builder()
        .param("a", Type::list(Type::Int))
        .returns(Type::list(Type::Int))
        .build();

    let shared = Value::list(vec![1.into(), 2.into(), 3.into()]);
    let method = method_fn(move |args| {
        let a = args.get_or_else(0, || shared.clone());
        match &a {
            Value::List(items) => items.borrow_mut().push(Value::Int(4)),
            other => {
                return Err(Error::argument_error(format!("cannot append to {}", other.type_name())))
            },
        }
        Ok(a)
    });
    wrap("append_four", method, params, signature)
}

/// Runs every guarded demo in order.
pub fn run_all(out: &mut dyn Write) -> Result<()> {
    for (i, name) in DEMOS.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        run(name, out)?;
    }
    Ok(())
}

/// Runs the guarded demo called `name`.
pub fn run(name: &str, out: &mut dyn Write) -> Result<()> {
    log::info!("running demo `{}`", name);
    writeln!(out, "== {}", name)?;
    match name {
        "repeat" => {
            let repeat = repeat()?;
            writeln!(out, "{}", repeat.describe())?;
            attempt(out, &repeat, CallArguments::new().arg("x"))?;
            attempt(out, &repeat, CallArguments::new().arg("x").arg(3).arg(2))?;
            attempt(out, &repeat, CallArguments::new().arg("x").arg(3).arg(2).arg("bad"))?;
            attempt(out, &repeat, CallArguments::new().arg(5))?;
        },
        "log" => {
            let logger = log_line()?;
            writeln!(out, "{}", logger.describe())?;
            attempt(out, &logger, CallArguments::new().kwarg("msg", "hello"))?;
            attempt(out, &logger, CallArguments::new().kwarg("msg", 123))?;
            let bad_severity = CallArguments::new().kwarg("msg", "hi").kwarg("severity", "Three");
            attempt(out, &logger, bad_severity)?;
            attempt(out, &logger, CallArguments::new().kwarg("msg", "hi").kwarg("color", "red"))?;
            attempt(out, &logger, CallArguments::new().kwarg("msg", "hi").kwarg("color", 5))?;
            attempt(out, &logger, CallArguments::new().kwarg("severity", 1))?;
        },
        "returns" => {
            let average = average()?;
            writeln!(out, "{}", average.describe())?;
            attempt(out, &average, CallArguments::new().arg(1).arg(2))?;
            attempt(out, &average, CallArguments::new().arg(2).arg(4))?;
            attempt(out, &average, CallArguments::new())?;
        },
        "computed-default" => {
            let ticks = Cell::new(0);
            let stamp = stamp(|| {
                ticks.set(ticks.get() + 1);
                ticks.get()
            })?;
            writeln!(out, "{}", stamp.describe())?;
            attempt(out, &stamp, CallArguments::new().arg("boot"))?;
            attempt(out, &stamp, CallArguments::new().arg("boot"))?;
            attempt(out, &stamp, CallArguments::new().arg("boot").arg("noon"))?;
            attempt(out, &stamp, CallArguments::new().arg("boot").arg(12))?;
        },
        "shared-default" => {
            let append_four = append_four()?;
            writeln!(out, "{}", append_four.describe())?;
            attempt(out, &append_four, CallArguments::new())?;
            let fresh = Value::list(vec![8.into(), 9.into(), 10.into()]);
            attempt(out, &append_four, CallArguments::new().arg(fresh))?;
            attempt(out, &append_four, CallArguments::new())?;
            attempt(out, &append_four, CallArguments::new().arg(Value::list(vec!["a".into()])))?;
        },
        other => {
            return Err(Error::argument_error(format!(
                "unknown demo `{}` (expected one of: {})",
                other,
                DEMOS.join(", ")
            )))
        },
    }
    Ok(())
}

/// Calls the computed-default `stamp` forever, one line per `interval`,
/// with the wall clock as the default. Stops after `iterations` calls if given.
pub fn ticker(out: &mut dyn Write, interval: Duration, iterations: Option<u64>) -> Result<()> {
    let stamp = stamp(unix_seconds)?;
    writeln!(out, "{}", stamp.describe())?;

    let mut tick = 0u64;
    while iterations.map_or(true, |limit| tick < limit) {
        let line = stamp.call(CallArguments::new().arg(format!("tick {}", tick)))?;
        writeln!(out, "{}", plain(&line))?;
        out.flush()?;
        tick += 1;
        thread::sleep(interval);
    }
    Ok(())
}

/// Declared signature of one demo callable.
#[derive(Debug, Serialize)]
pub struct SignatureReport {
    /// Callable name.
    pub name: String,
    /// Python-style rendering.
    pub display: String,
    /// Declared parameters.
    pub parameters: Parameters,
    /// Declared types.
    pub signature: TypeSignature,
}

impl SignatureReport {
    /// Captures the declared signature of `method`.
    pub fn of<M: Method>(method: &WrappedCallable<M>) -> Self {
        Self {
            name: method.name().to_string(),
            display: method.describe(),
            parameters: method.parameters().clone(),
            signature: method.signature().clone(),
        }
    }
}

/// Declared signatures of every demo callable.
pub fn signatures() -> Result<Vec<SignatureReport>> {
    Ok(vec![
        SignatureReport::of(&repeat()?),
        SignatureReport::of(&log_line()?),
        SignatureReport::of(&average()?),
        SignatureReport::of(&stamp(unix_seconds)?),
        SignatureReport::of(&append_four()?),
    ])
}

/// Prints `name(args) => result`, or the error for a rejected call.
fn attempt<M: Method>(
    out: &mut dyn Write,
    method: &WrappedCallable<M>,
    args: CallArguments,
) -> Result<()> {
    let call = render_call(method.name(), &args);
    match method.call(args) {
        Ok(value) => writeln!(out, "{} => {}", call, value)?,
        Err(Error::Io(e)) => return Err(Error::Io(e)),
        Err(err) => writeln!(out, "{} => error: {}", call, err)?,
    }
    Ok(())
}

fn render_call(name: &str, args: &CallArguments) -> String {
    let parts = args
        .positional()
        .iter()
        .map(|v| v.to_string())
        .chain(args.keywords().iter().map(|(k, v)| format!("{}={}", k, v)))
        .collect::<Vec<_>>();
    format!("{}({})", name, parts.join(", "))
}

fn number(value: &Value) -> Result<f64> {
    value.as_number().ok_or_else(|| {
        Error::argument_error(format!("expected a number, got {}", value.type_name()))
    })
}

/// Turns the product of the repeat factors into a repetition count, refusing
/// counts that are not finite or would build a string over [`MAX_REPEAT_LEN`].
fn repeat_count(times: f64, unit_len: usize) -> Result<usize> {
    if !times.is_finite() {
        return Err(Error::argument_error(format!("repeat count must be finite, got {}", times)));
    }
    let count = times.max(0.0).trunc();
    if unit_len == 0 {
        return Ok(0);
    }
    if count > (MAX_REPEAT_LEN / unit_len) as f64 {
        return Err(Error::argument_error(format!(
            "repeat count {} exceeds the {} byte limit",
            count, MAX_REPEAT_LEN
        )));
    }
    Ok(count as usize)
}

/// Strings without quotes, everything else as displayed.
fn plain(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
