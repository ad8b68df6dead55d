//! Derives parameter descriptors and type signatures from Python `def` headers.
//!
//! Parameter kinds follow Python's rules: plain names are required
//! positionals, `name=default` optional positionals, `*args` the rest
//! positional, and everything after `*` or `*args` a keyword parameter
//! (required unless it has a default). `**kwargs` is the rest keyword.
//! Annotations become the declared types and `-> T` the return type.

use serde::Serialize;
use tree_sitter::{Node, Parser as TSParser, Tree};

use crate::error::{Error, Result};
use crate::signature::{ParamKind, Parameters, SignatureDisplay, TypeSignature};
use crate::types::Type;
use crate::wrapper::{wrap, Method, WrappedCallable};

/// The main parser struct that handles parsing source code.
pub struct Parser {
    /// The tree-sitter parser instance.
    parser: TSParser,
}

impl Parser {
    /// Creates a new parser for Python.
    pub fn new() -> Result<Self> {
        let mut parser = TSParser::new();

        let language = tree_sitter_python::language();

        parser
            .set_language(language)
            .map_err(|e| Error::parser_error(format!("Failed to load language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parses a source code string into a syntax tree.
    pub fn parse_string(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| Error::parser_error("Failed to parse source code".to_string()))
    }
}

/// A function definition reduced to what the wrapper needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDef {
    /// Function name.
    pub name: String,
    /// Parameters in declared order.
    pub parameters: Parameters,
    /// Types taken from the annotations.
    pub signature: TypeSignature,
}

impl ParsedDef {
    /// Wraps `method` with the parsed parameters and annotations.
    pub fn wrap<M: Method>(self, method: M) -> Result<WrappedCallable<M>> {
        wrap(self.name, method, self.parameters, self.signature)
    }

    /// Python-style rendering of the parsed signature.
    pub fn describe(&self) -> String {
        let display = SignatureDisplay {
            name: &self.name,
            parameters: &self.parameters,
            signature: &self.signature,
        };
        display.to_string()
    }
}

/// Parses the first function definition in `source`.
pub fn parse_def(source: &str) -> Result<ParsedDef> {
    let mut parser = Parser::new()?;
    let tree = parser.parse_string(source)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(Error::parser_error("source contains syntax errors"));
    }

    let def = find_function(root)
        .ok_or_else(|| Error::parser_error("no function definition found"))?;
    let bytes = source.as_bytes();

    let name = def
        .child_by_field_name("name")
        .ok_or_else(|| Error::parser_error("function definition without a name"))?;
    let params = def
        .child_by_field_name("parameters")
        .ok_or_else(|| Error::parser_error("function definition without parameters"))?;

    let mut kinds: Vec<(String, ParamKind)> = Vec::new();
    let mut signature = TypeSignature::builder();
    let mut keyword_only = false;

    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let (name, kind, annotation) = match param.kind() {
            "identifier" => (text(param, bytes)?, plain_kind(keyword_only), None),
            "default_parameter" | "typed_default_parameter" => {
                let name = param
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                    .ok_or_else(|| Error::parser_error("unsupported default parameter"))?;
                let kind = if keyword_only {
                    ParamKind::OptionalKeyword
                } else {
                    ParamKind::OptionalPositional
                };
                (text(name, bytes)?, kind, param.child_by_field_name("type"))
            },
            "typed_parameter" => {
                let target = param
                    .named_child(0)
                    .ok_or_else(|| Error::parser_error("typed parameter without a name"))?;
                let (name, kind) = match target.kind() {
                    "list_splat_pattern" => (splat_name(target, bytes)?, ParamKind::RestPositional),
                    "dictionary_splat_pattern" => {
                        (splat_name(target, bytes)?, ParamKind::RestKeyword)
                    },
                    _ => (text(target, bytes)?, plain_kind(keyword_only)),
                };
                (name, kind, param.child_by_field_name("type"))
            },
            "list_splat_pattern" => (splat_name(param, bytes)?, ParamKind::RestPositional, None),
            "dictionary_splat_pattern" => (splat_name(param, bytes)?, ParamKind::RestKeyword, None),
            "keyword_separator" => {
                keyword_only = true;
                continue;
            },
            "positional_separator" | "comment" => continue,
            other => {
                return Err(Error::parser_error(format!("unsupported parameter form `{}`", other)))
            },
        };

        if kind == ParamKind::RestPositional {
            keyword_only = true;
        }
        if let Some(node) = annotation {
            signature = signature.param(name.clone(), annotation_type(node, bytes)?);
        }
        kinds.push((name, kind));
    }

    if let Some(node) = def.child_by_field_name("return_type") {
        signature = signature.returns(annotation_type(node, bytes)?);
    }

    let parsed = ParsedDef {
        name: text(name, bytes)?,
        parameters: Parameters::new(kinds)?,
        signature: signature.build(),
    };
    log::debug!("parsed {}", parsed.describe());
    Ok(parsed)
}

/// Converts an annotation node into a [`Type`].
fn annotation_type(node: Node, source: &[u8]) -> Result<Type> {
    match node.kind() {
        "type" => {
            let inner = node
                .named_child(0)
                .ok_or_else(|| Error::parser_error("empty type annotation"))?;
            annotation_type(inner, source)
        },
        "identifier" | "attribute" | "member_type" => Ok(Type::from_name(&text(node, source)?)),
        "none" => Ok(Type::None),
        "string" => {
            let raw = text(node, source)?;
            Ok(Type::from_name(raw.trim_matches(|c| c == '"' || c == '\'')))
        },
        "union_type" => {
            let mut cursor = node.walk();
            let members = node
                .named_children(&mut cursor)
                .map(|member| annotation_type(member, source))
                .collect::<Result<Vec<_>>>()?;
            Ok(Type::union_of(members))
        },
        "binary_operator" => {
            let operator = node.child_by_field_name("operator").map(|op| op.kind());
            if operator != Some("|") {
                return Err(Error::parser_error(format!(
                    "unsupported type expression `{}`",
                    text(node, source)?
                )));
            }
            let left = field(node, "left")?;
            let right = field(node, "right")?;
            let members = vec![annotation_type(left, source)?, annotation_type(right, source)?];
            Ok(Type::union_of(members))
        },
        "generic_type" => {
            let name = node
                .named_child(0)
                .ok_or_else(|| Error::parser_error("generic type without a name"))?;
            let mut params = Vec::new();
            if let Some(list) = node.named_child(1) {
                let mut cursor = list.walk();
                for param in list.named_children(&mut cursor) {
                    params.push(annotation_type(param, source)?);
                }
            }
            Type::from_generic(&text(name, source)?, params)
        },
        "subscript" => {
            let name = field(node, "value")?;
            let mut cursor = node.walk();
            let params = node
                .children_by_field_name("subscript", &mut cursor)
                .map(|param| annotation_type(param, source))
                .collect::<Result<Vec<_>>>()?;
            Type::from_generic(&text(name, source)?, params)
        },
        other => Err(Error::parser_error(format!("unsupported type annotation `{}`", other))),
    }
}

fn plain_kind(keyword_only: bool) -> ParamKind {
    if keyword_only {
        ParamKind::RequiredKeyword
    } else {
        ParamKind::RequiredPositional
    }
}

fn splat_name(node: Node, source: &[u8]) -> Result<String> {
    let inner = node
        .named_child(0)
        .ok_or_else(|| Error::parser_error("splat parameter without a name"))?;
    text(inner, source)
}

fn field<'t>(node: Node<'t>, name: &str) -> Result<Node<'t>> {
    node.child_by_field_name(name)
        .ok_or_else(|| Error::parser_error(format!("missing `{}` in `{}`", name, node.kind())))
}

fn text(node: Node, source: &[u8]) -> Result<String> {
    node.utf8_text(source)
        .map(str::to_string)
        .map_err(|e| Error::parser_error(format!("invalid UTF-8 in source: {}", e)))
}

/// Pre-order search for the first function definition.
fn find_function(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "function_definition" {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
