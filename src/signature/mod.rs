//! Parameter descriptors and declared type signatures.
//!
//! A callable's shape is described by an ordered [`Parameters`] list; the
//! types it promises to accept and return live in a separate
//! [`TypeSignature`], built once with [`TypeSignature::builder`] and never
//! mutated afterwards.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::Type;

/// How a parameter is matched at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// Positional parameter that must be supplied.
    RequiredPositional,
    /// Positional parameter with a default.
    OptionalPositional,
    /// Collects the remaining positional arguments (`*args`).
    RestPositional,
    /// Keyword parameter that must be supplied.
    RequiredKeyword,
    /// Keyword parameter with a default.
    OptionalKeyword,
    /// Collects the remaining keyword arguments (`**kwargs`).
    RestKeyword,
}

impl ParamKind {
    /// Returns true for the three positional kinds.
    pub fn is_positional(self) -> bool {
        matches!(self, Self::RequiredPositional | Self::OptionalPositional | Self::RestPositional)
    }

    /// Returns true for the three keyword kinds.
    pub fn is_keyword(self) -> bool {
        !self.is_positional()
    }

    /// Ordering rank: descriptors must appear with non-decreasing rank.
    fn rank(self) -> u8 {
        match self {
            Self::RequiredPositional => 0,
            Self::OptionalPositional => 1,
            Self::RestPositional => 2,
            Self::RequiredKeyword | Self::OptionalKeyword => 3,
            Self::RestKeyword => 4,
        }
    }

    fn is_rest(self) -> bool {
        matches!(self, Self::RestPositional | Self::RestKeyword)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RequiredPositional => "required-positional",
            Self::OptionalPositional => "optional-positional",
            Self::RestPositional => "rest-positional",
            Self::RequiredKeyword => "required-keyword",
            Self::OptionalKeyword => "optional-keyword",
            Self::RestKeyword => "rest-keyword",
        };
        f.write_str(name)
    }
}

/// One declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    /// Parameter name, unique within the callable.
    pub name: String,
    /// How the parameter is matched.
    pub kind: ParamKind,
    /// Index among the positional parameters; `None` for keyword kinds.
    pub position: Option<usize>,
}

/// The ordered parameter list of a callable.
///
/// Construction enforces conventional ordering: required positionals,
/// optional positionals, at most one rest positional, then keyword
/// parameters in any order with at most one rest keyword, which comes last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    descriptors: Vec<ParameterDescriptor>,
}

impl Parameters {
    /// Validates `(name, kind)` pairs and assigns positions.
    pub fn new<N: Into<String>>(params: impl IntoIterator<Item = (N, ParamKind)>) -> Result<Self> {
        let mut descriptors = Vec::new();
        let mut seen = HashSet::new();
        let mut last: Option<ParamKind> = None;
        let mut next_position = 0usize;

        for (name, kind) in params {
            let name = name.into();
            if name.is_empty() {
                return Err(Error::signature_error("parameter names must not be empty"));
            }
            if !seen.insert(name.clone()) {
                return Err(Error::signature_error(format!("duplicate parameter `{}`", name)));
            }
            if let Some(prev) = last {
                let out_of_order = kind.rank() < prev.rank();
                let repeated_rest = prev.is_rest() && kind.rank() == prev.rank();
                if out_of_order || repeated_rest {
                    return Err(Error::signature_error(format!(
                        "{} parameter `{}` cannot follow a {} parameter",
                        kind, name, prev
                    )));
                }
            }

            let position = if kind.is_positional() {
                next_position += 1;
                Some(next_position - 1)
            } else {
                None
            };
            descriptors.push(ParameterDescriptor { name, kind, position });
            last = Some(kind);
        }

        Ok(Self { descriptors })
    }

    /// Starts building a parameter list.
    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::default()
    }

    /// All descriptors in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.descriptors.iter()
    }

    /// Positional-kind descriptors in declared order.
    pub fn positional(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.descriptors.iter().filter(|p| p.kind.is_positional())
    }

    /// Keyword-kind descriptors in declared order.
    pub fn keyword(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.descriptors.iter().filter(|p| p.kind.is_keyword())
    }

    /// Looks up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|p| p.name == name)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the callable takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Collects descriptors in call order; validated by [`ParametersBuilder::build`].
#[derive(Debug, Default)]
pub struct ParametersBuilder {
    params: Vec<(String, ParamKind)>,
}

impl ParametersBuilder {
    fn push(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push((name.into(), kind));
        self
    }

    /// Adds a required positional parameter.
    pub fn required(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::RequiredPositional)
    }

    /// Adds an optional positional parameter.
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::OptionalPositional)
    }

    /// Adds the rest positional parameter.
    pub fn rest(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::RestPositional)
    }

    /// Adds a required keyword parameter.
    pub fn keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::RequiredKeyword)
    }

    /// Adds an optional keyword parameter.
    pub fn optional_keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::OptionalKeyword)
    }

    /// Adds the rest keyword parameter.
    pub fn rest_keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::RestKeyword)
    }

    /// Validates ordering and uniqueness.
    pub fn build(self) -> Result<Parameters> {
        Parameters::new(self.params)
    }
}

/// Declared parameter types plus an optional return type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSignature {
    params: Vec<(String, Type)>,
    returns: Option<Type>,
}

impl TypeSignature {
    /// Starts building a signature.
    pub fn builder() -> TypeSignatureBuilder {
        TypeSignatureBuilder::default()
    }

    /// The declared type for parameter `name`, if any.
    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, ty)| ty)
    }

    /// The declared return type, if any.
    pub fn returns(&self) -> Option<&Type> {
        self.returns.as_ref()
    }

    /// Declared `(name, type)` pairs in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.params.iter().map(|(n, ty)| (n.as_str(), ty))
    }

    /// Fails if the signature types a parameter `parameters` does not declare.
    pub fn check_against(&self, parameters: &Parameters) -> Result<()> {
        for (name, _) in &self.params {
            if parameters.get(name).is_none() {
                return Err(Error::signature_error(format!(
                    "type declared for unknown parameter `{}`",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`TypeSignature`]. Later declarations for the same name win.
#[derive(Debug, Default)]
pub struct TypeSignatureBuilder {
    signature: TypeSignature,
}

impl TypeSignatureBuilder {
    /// Declares the expected type of parameter `name`.
    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        match self.signature.params.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = ty,
            None => self.signature.params.push((name, ty)),
        }
        self
    }

    /// Declares the expected return type.
    pub fn returns(mut self, ty: Type) -> Self {
        self.signature.returns = Some(ty);
        self
    }

    /// Finishes the signature.
    pub fn build(self) -> TypeSignature {
        self.signature
    }
}

/// Python-style rendering of a parameter list with its declared types,
/// e.g. `repeat(str: str, count: Numeric = ..., *multiples: Numeric) -> str`.
pub struct SignatureDisplay<'a> {
    /// Callable name.
    pub name: &'a str,
    /// Declared parameters.
    pub parameters: &'a Parameters,
    /// Declared types.
    pub signature: &'a TypeSignature,
}

impl fmt::Display for SignatureDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.parameters.len() + 1);
        // A bare `*` marks where keyword-only parameters begin unless `*rest` already does.
        let mut needs_separator =
            !self.parameters.iter().any(|p| p.kind == ParamKind::RestPositional);

        for param in self.parameters.iter() {
            if needs_separator && param.kind.is_keyword() && param.kind != ParamKind::RestKeyword {
                parts.push("*".to_string());
                needs_separator = false;
            }
            let prefix = match param.kind {
                ParamKind::RestPositional => "*",
                ParamKind::RestKeyword => "**",
                _ => "",
            };
            let mut part = format!("{}{}", prefix, param.name);
            if let Some(ty) = self.signature.type_of(&param.name) {
                part.push_str(&format!(": {}", ty));
            }
            if matches!(param.kind, ParamKind::OptionalPositional | ParamKind::OptionalKeyword) {
                part.push_str(" = ...");
            }
            parts.push(part);
        }

        write!(f, "{}({})", self.name, parts.join(", "))?;
        if let Some(ret) = self.signature.returns() {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_assigned_to_positional_kinds_only() {
        let params = Parameters::builder()
            .required("str")
            .optional("count")
            .rest("multiples")
            .keyword("sep")
            .build()
            .unwrap();
        let positions: Vec<_> = params.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn test_keyword_kinds_any_order() {
        let params = Parameters::builder()
            .optional_keyword("severity")
            .keyword("msg")
            .rest_keyword("extra")
            .build();
        assert!(params.is_ok());
    }

    #[test]
    fn test_ordering_violations_rejected() {
        assert!(Parameters::builder().optional("a").required("b").build().is_err());
        assert!(Parameters::builder().keyword("a").required("b").build().is_err());
        assert!(Parameters::builder().rest("a").rest("b").build().is_err());
        assert!(Parameters::builder().rest_keyword("a").keyword("b").build().is_err());
        assert!(Parameters::builder().rest_keyword("a").rest_keyword("b").build().is_err());
        assert!(Parameters::builder().required("a").keyword("a").build().is_err());
    }

    #[test]
    fn test_signature_builder_and_lookup() {
        let sig = TypeSignature::builder()
            .param("msg", Type::Int)
            .param("msg", Type::Str)
            .returns(Type::Str)
            .build();
        assert_eq!(sig.type_of("msg"), Some(&Type::Str));
        assert_eq!(sig.type_of("other"), None);
        assert_eq!(sig.returns(), Some(&Type::Str));
        assert_eq!(sig.params().count(), 1);
    }

    #[test]
    fn test_signature_rejects_unknown_parameter() {
        let params = Parameters::builder().required("a").build().unwrap();
        let sig = TypeSignature::builder().param("b", Type::Int).build();
        assert!(matches!(sig.check_against(&params), Err(Error::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_display() {
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
        let display = SignatureDisplay { name: "log", parameters: &params, signature: &sig };
        assert_eq!(
            display.to_string(),
            "log(*, msg: str, severity: Numeric = ..., **extra: str)"
        );
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ParamKind::RestKeyword).unwrap();
        assert_eq!(json, "\"rest-keyword\"");
    }
}
