//! Runtime values and the expected types they are checked against.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// An expected type, or set of types, a value may be required to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// The `Any` type (top type)
    Any,

    /// The `None` type
    None,

    /// Boolean type (true/false)
    Bool,

    /// Integer number type
    Int,

    /// Floating-point number type
    Float,

    /// Any number: integer or floating-point
    Numeric,

    /// Unicode string type
    Str,

    /// Binary data type
    Bytes,

    /// Homogeneous list type
    List(Box<Type>),

    /// Dictionary type with key and value types
    Dict(Box<Type>, Box<Type>), // key type, value type

    /// Union type representing one of several possible types (T1 | T2 | ...)
    Union(Vec<Type>),

    /// Named type matched against a value's runtime type name
    Named(String),
}

impl Type {
    /// Creates a normalized union type by sorting and deduplicating the input types.
    /// This ensures that the same set of types always produces the same union,
    /// regardless of the order of input types.
    pub fn union_of(types: Vec<Type>) -> Type {
        let mut unique_types = BTreeSet::new();
        for ty in types {
            match ty {
                Type::Union(nested_types) => unique_types.extend(nested_types),
                _ => {
                    unique_types.insert(ty);
                },
            }
        }

        if unique_types.contains(&Type::Any) {
            return Type::Any;
        }

        let mut members: Vec<Type> = unique_types.into_iter().collect();
        match members.len() {
            0 => Type::Any,
            1 => members.remove(0),
            _ => Type::Union(members),
        }
    }

    /// Shorthand for `List[inner]`.
    pub fn list(inner: Type) -> Type {
        Type::List(Box::new(inner))
    }

    /// Shorthand for `Dict[key, value]`.
    pub fn dict(key: Type, value: Type) -> Type {
        Type::Dict(Box::new(key), Box::new(value))
    }

    /// Shorthand for `inner | None`.
    pub fn optional(inner: Type) -> Type {
        Type::union_of(vec![inner, Type::None])
    }

    /// Maps a plain (unparameterized) type name to a type.
    pub fn from_name(name: &str) -> Type {
        match name {
            "Any" | "object" => Type::Any,
            "None" | "NoneType" => Type::None,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "float" => Type::Float,
            "Numeric" | "Number" | "numbers.Number" => Type::Numeric,
            "str" | "String" => Type::Str,
            "bytes" => Type::Bytes,
            "list" | "List" => Type::list(Type::Any),
            "dict" | "Dict" => Type::dict(Type::Any, Type::Any),
            other => Type::Named(other.to_string()),
        }
    }

    /// Builds a parameterized type such as `List[int]` or `Optional[str]`.
    pub fn from_generic(name: &str, mut params: Vec<Type>) -> Result<Type> {
        let given = params.len();
        let arity = |expected: usize| {
            Error::parser_error(format!(
                "{} takes {} type parameter(s), got {}",
                name, expected, given
            ))
        };
        match name {
            "list" | "List" => {
                if params.len() != 1 {
                    return Err(arity(1));
                }
                Ok(Type::list(params.remove(0)))
            },
            "dict" | "Dict" => {
                if params.len() != 2 {
                    return Err(arity(2));
                }
                let value = params.remove(1);
                Ok(Type::dict(params.remove(0), value))
            },
            "Optional" => {
                if params.len() != 1 {
                    return Err(arity(1));
                }
                Ok(Type::optional(params.remove(0)))
            },
            "Union" => Ok(Type::union_of(params)),
            other => Err(Error::parser_error(format!("unsupported generic type `{}`", other))),
        }
    }

    /// Returns true if `value` satisfies this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Type::Any, _) => true,
            (Type::None, Value::None) => true,
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Int, Value::Int(_)) => true,
            (Type::Float, Value::Float(_)) => true,
            (Type::Numeric, Value::Int(_) | Value::Float(_)) => true,
            (Type::Str, Value::Str(_)) => true,
            (Type::Bytes, Value::Bytes(_)) => true,
            (Type::List(inner), Value::List(items)) => {
                items.borrow().iter().all(|item| inner.accepts(item))
            },
            (Type::Dict(key, val), Value::Dict(entries)) => entries
                .borrow()
                .iter()
                .all(|(k, v)| key.accepts(&Value::Str(k.clone())) && val.accepts(v)),
            (Type::Union(members), _) => members.iter().any(|member| member.accepts(value)),
            (Type::Named(name), _) => value.type_name() == name,
            _ => false,
        }
    }
}

impl Default for Type {
    fn default() -> Self {
        Self::Any
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::None => write!(f, "None"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Numeric => write!(f, "Numeric"),
            Type::Str => write!(f, "str"),
            Type::Bytes => write!(f, "bytes"),
            Type::List(inner) => write!(f, "List[{}]", inner),
            Type::Dict(k, v) => write!(f, "Dict[{}, {}]", k, v),
            Type::Union(types) => {
                let types_str = types
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{}", types_str)
            },
            Type::Named(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A dynamically-typed runtime value.
///
/// Lists and dicts are reference types: cloning a `Value` aliases the same
/// container, so a mutation through one handle is visible through every other.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The `None` value
    None,
    /// A boolean
    Bool(bool),
    /// A 64-bit integer
    Int(i64),
    /// A 64-bit float
    Float(f64),
    /// A string
    Str(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// A shared, mutable list
    List(Rc<RefCell<Vec<Value>>>),
    /// A shared, mutable dictionary with string keys
    Dict(Rc<RefCell<BTreeMap<String, Value>>>),
}

impl Value {
    /// Creates a new list value owning `items`.
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Creates a new dict value from key/value pairs.
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Dict(Rc::new(RefCell::new(map)))
    }

    /// The runtime type name, as reported in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// The most precise type describing this value.
    pub fn type_of(&self) -> Type {
        match self {
            Value::None => Type::None,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::Str,
            Value::Bytes(_) => Type::Bytes,
            Value::List(items) => {
                Type::list(Type::union_of(items.borrow().iter().map(Value::type_of).collect()))
            },
            Value::Dict(entries) => {
                let entries = entries.borrow();
                let key = if entries.is_empty() { Type::Any } else { Type::Str };
                Type::dict(key, Type::union_of(entries.values().map(Value::type_of).collect()))
            },
        }
    }

    /// Returns the string slice if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as a float if this is an `Int` or `Float`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "'{}'", s.escape_default()),
            Value::Bytes(b) => write!(f, "b'{}'", b.escape_ascii()),
            Value::List(items) => {
                let items_str = items
                    .borrow()
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{}]", items_str)
            },
            Value::Dict(entries) => {
                let entries_str = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("'{}': {}", k.escape_default(), v))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", entries_str)
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
