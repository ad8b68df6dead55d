//! The typed-method wrapper.
//!
//! [`wrap`] takes any [`Method`] together with its declared [`Parameters`]
//! and [`TypeSignature`] and returns a [`WrappedCallable`] with the same call
//! shape. Each call validates the arguments the caller actually supplied,
//! invokes the original method, then validates the result.
//!
//! Defaults belong to the original method. An omitted argument never reaches
//! the wrapper, so whatever default the method computes for it, once at
//! definition time or fresh on every call, is never checked against the
//! declared type.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::error::{ArgumentSlot, Error, Result};
use crate::signature::{
    ParamKind, ParameterDescriptor, Parameters, SignatureDisplay, TypeSignature,
};
use crate::types::{Type, Value};

/// Positional and keyword arguments of a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    positional: Vec<Value>,
    keywords: BTreeMap<String, Value>,
}

impl CallArguments {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier value for the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    /// Positional arguments in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments, sorted by name.
    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }

    /// The positional argument at `index`, if supplied.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// The keyword argument `name`, if supplied.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    /// Positional arguments from `index` on, for a `*rest` parameter.
    pub fn rest_from(&self, index: usize) -> &[Value] {
        self.positional.get(index..).unwrap_or(&[])
    }

    /// The positional argument at `index`, or an argument error naming `name`.
    pub fn required(&self, index: usize, name: &str) -> Result<&Value> {
        self.get(index).ok_or_else(|| {
            Error::argument_error(format!("missing required positional argument `{}`", name))
        })
    }

    /// The keyword argument `name`, or an argument error.
    pub fn required_keyword(&self, name: &str) -> Result<&Value> {
        self.keyword(name).ok_or_else(|| {
            Error::argument_error(format!("missing required keyword argument `{}`", name))
        })
    }

    /// The positional argument at `index`, or `default()` evaluated now.
    pub fn get_or_else(&self, index: usize, default: impl FnOnce() -> Value) -> Value {
        self.get(index).cloned().unwrap_or_else(default)
    }

    /// The keyword argument `name`, or `default()` evaluated now.
    pub fn keyword_or_else(&self, name: &str, default: impl FnOnce() -> Value) -> Value {
        self.keyword(name).cloned().unwrap_or_else(default)
    }

    /// Keyword arguments not named in `declared`, for a `**rest` parameter.
    pub fn rest_keywords<'a>(
        &'a self,
        declared: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.keywords
            .iter()
            .filter(move |(k, _)| !declared.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Anything callable with [`CallArguments`].
pub trait Method {
    /// Invokes the method.
    fn call(&self, args: CallArguments) -> Result<Value>;
}

impl<F> Method for F
where
    F: Fn(CallArguments) -> Result<Value>,
{
    fn call(&self, args: CallArguments) -> Result<Value> {
        self(args)
    }
}

/// Pins a closure to the [`Method`] call shape so its argument and return
/// types are inferred at the definition site.
pub fn method_fn<F>(f: F) -> F
where
    F: Fn(CallArguments) -> Result<Value>,
{
    f
}

/// A method whose arguments and result are checked against a signature.
#[derive(Debug)]
pub struct WrappedCallable<M> {
    name: String,
    method: M,
    parameters: Parameters,
    signature: TypeSignature,
}

/// Wraps `method` so every call is validated against `signature`.
///
/// Fails with [`Error::InvalidSignature`] if the signature types a parameter
/// that `parameters` does not declare.
pub fn wrap<M: Method>(
    name: impl Into<String>,
    method: M,
    parameters: Parameters,
    signature: TypeSignature,
) -> Result<WrappedCallable<M>> {
    signature.check_against(&parameters)?;
    Ok(WrappedCallable { name: name.into(), method, parameters, signature })
}

impl<M: Method> WrappedCallable<M> {
    /// The callable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Declared types.
    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    /// The declared signature rendered for display.
    pub fn describe(&self) -> String {
        let display = SignatureDisplay {
            name: &self.name,
            parameters: &self.parameters,
            signature: &self.signature,
        };
        display.to_string()
    }

    /// Validates `args` without invoking the method.
    pub fn check_arguments(&self, args: &CallArguments) -> Result<()> {
        self.check_positional(args.positional())?;
        self.check_keywords(args.keywords())
    }

    fn check_positional(&self, values: &[Value]) -> Result<()> {
        let mut slots = self.parameters.positional();
        let mut rest: Option<&ParameterDescriptor> = None;

        for (index, value) in values.iter().enumerate() {
            let param = match rest {
                Some(param) => param,
                None => {
                    let param = slots.next().ok_or(Error::MissingTypeDeclaration {
                        slot: ArgumentSlot::Position(index),
                    })?;
                    if param.kind == ParamKind::RestPositional {
                        rest = Some(param);
                    }
                    param
                },
            };

            let expected = self.signature.type_of(&param.name).ok_or(
                Error::MissingTypeDeclaration { slot: ArgumentSlot::Position(index) },
            )?;
            if !expected.accepts(value) {
                return Err(Error::mismatch(
                    ArgumentSlot::Position(index),
                    expected,
                    value.type_name(),
                ));
            }
        }
        Ok(())
    }

    /// Matches keywords against keyword parameters, then checks the leftovers
    /// against the rest-keyword type. Only the first leftover in sorted order is
    /// reported when nothing covers it.
    fn check_keywords(&self, keywords: &BTreeMap<String, Value>) -> Result<()> {
        let mut unmatched: BTreeSet<&str> = keywords.keys().map(String::as_str).collect();
        let mut rest_type: Option<&Type> = None;

        for param in self.parameters.keyword() {
            let name = param.name.as_str();
            let expected = self.signature.type_of(name);
            match param.kind {
                ParamKind::RequiredKeyword => {
                    unmatched.remove(name);
                    if let Some(expected) = expected {
                        match keywords.get(name) {
                            Some(value) if expected.accepts(value) => {},
                            Some(value) => {
                                return Err(Error::mismatch(
                                    ArgumentSlot::Keyword(name.to_string()),
                                    expected,
                                    value.type_name(),
                                ))
                            },
                            None => {
                                return Err(Error::mismatch(
                                    ArgumentSlot::Keyword(name.to_string()),
                                    expected,
                                    "missing",
                                ))
                            },
                        }
                    }
                },
                ParamKind::OptionalKeyword => {
                    if let Some(value) = keywords.get(name) {
                        unmatched.remove(name);
                        if let Some(expected) = expected.filter(|ty| !ty.accepts(value)) {
                            return Err(Error::mismatch(
                                ArgumentSlot::Keyword(name.to_string()),
                                expected,
                                value.type_name(),
                            ));
                        }
                    }
                },
                ParamKind::RestKeyword => {
                    rest_type = expected;
                    break;
                },
                _ => {},
            }
        }

        for key in unmatched {
            let expected = rest_type
                .ok_or_else(|| Error::UnexpectedKeywordArgument { keyword: key.to_string() })?;
            let value = &keywords[key];
            if !expected.accepts(value) {
                return Err(Error::mismatch(
                    ArgumentSlot::Keyword(key.to_string()),
                    expected,
                    value.type_name(),
                ));
            }
        }
        Ok(())
    }

    fn check_return(&self, result: Value) -> Result<Value> {
        match self.signature.returns() {
            Some(expected) if !expected.accepts(&result) => Err(Error::ReturnTypeMismatch {
                expected: expected.clone(),
                actual: result.type_of(),
            }),
            _ => Ok(result),
        }
    }
}

impl<M: Method> Method for WrappedCallable<M> {
    fn call(&self, args: CallArguments) -> Result<Value> {
        if let Err(err) = self.check_arguments(&args) {
            debug!("{}: rejected call: {}", self.name, err);
            return Err(err);
        }
        trace!(
            "{}: accepted {} positional and {} keyword argument(s)",
            self.name,
            args.positional().len(),
            args.keywords().len()
        );

        let result = self.method.call(args)?;
        self.check_return(result).map_err(|err| {
            debug!("{}: rejected result: {}", self.name, err);
            err
        })
    }
}
