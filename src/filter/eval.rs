use std::{borrow::Cow, cmp::Ordering, collections::HashMap};

use regex::Regex;

use crate::{
    domain::{Project, Requirement, fields, split_links},
    filter::{BinaryOp, CompareOp, Expr, FilterError},
};

/// Names bound in every filter, whatever the requirement. These shadow
/// attributes of the same name.
pub const BUILTINS: [&str; 9] = [
    "req",
    "elements",
    "has_element",
    "link_error",
    "has_invalid_link",
    "match",
    "search",
    "fullmatch",
    "startswith",
];

/// The only method that may be called with `.name(...)` syntax.
const STARTSWITH: &str = "startswith";

/// The longest string `*` may build.
const MAX_STRING_LEN: usize = 1 << 20;

/// A value produced while evaluating a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// `None`
    None,
    /// `True` or `False`.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string, usually an attribute value.
    Str(Cow<'a, str>),
    /// A list of values.
    List(Vec<Value<'a>>),
    /// The requirement being filtered, bound to `req`.
    Req(&'a Requirement),
    /// One of the helper functions.
    Function(&'static str),
}

impl Value<'_> {
    /// Whether the value counts as true in a condition. Empty strings and
    /// lists, zero and `None` are false.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Req(req) => !req.is_empty(),
            Self::Function(_) => true,
        }
    }

    /// The name of the value's type, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Req(_) => "requirement",
            Self::Function(_) => "function",
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn type_error(message: impl Into<String>) -> FilterError {
    FilterError::Type(message.into())
}

fn str_arg<'v>(function: &str, value: &'v Value<'_>) -> Result<&'v str, FilterError> {
    value.as_str().ok_or_else(|| {
        type_error(format!(
            "{function}() expects a string, not '{}'",
            value.type_name()
        ))
    })
}

fn arguments<'a, const N: usize>(
    function: &str,
    args: Vec<Value<'a>>,
) -> Result<[Value<'a>; N], FilterError> {
    args.try_into().map_err(|args: Vec<Value<'a>>| {
        type_error(format!(
            "{function}() takes {N} argument(s) ({} given)",
            args.len()
        ))
    })
}

/// The names and values a filter is evaluated against.
pub struct Environment<'a> {
    req: &'a Requirement,
    project: &'a Project,
    /// Bound attribute name to the attribute name as written.
    attributes: HashMap<String, String>,
}

impl<'a> Environment<'a> {
    /// Binds every attribute known to the project, and every attribute of
    /// `req`.
    pub fn new(req: &'a Requirement, project: &'a Project) -> Self {
        let attributes = project
            .attribute_names()
            .into_iter()
            .chain(req.names().map(str::to_string))
            .map(|name| {
                let bound: String = name
                    .chars()
                    .map(|c| if c.is_whitespace() { '_' } else { c })
                    .collect();
                (bound, name)
            })
            .collect();
        Self {
            req,
            project,
            attributes,
        }
    }

    /// Returns `true` if `name` may appear in a filter.
    pub fn binds(&self, name: &str) -> bool {
        BUILTINS.contains(&name) || self.attributes.contains_key(name)
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value<'a>, FilterError> {
        match expr {
            Expr::Name(name) => self.lookup(name),
            Expr::Str(text) => Ok(Value::Str(Cow::Owned(text.clone()))),
            Expr::Int(value) => Ok(Value::Int(*value)),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.truthy())),
            Expr::Neg(inner) => match self.eval(inner)? {
                Value::Int(value) => value
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| type_error("integer overflow")),
                other => Err(type_error(format!(
                    "bad operand type for unary -: '{}'",
                    other.type_name()
                ))),
            },
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { self.eval(rhs) } else { Ok(lhs) }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { Ok(lhs) } else { self.eval(rhs) }
            }
            Expr::Binary(op, lhs, rhs) => arithmetic(*op, self.eval(lhs)?, self.eval(rhs)?),
            Expr::Compare(op, lhs, rhs) => {
                compare(*op, &self.eval(lhs)?, &self.eval(rhs)?).map(Value::Bool)
            }
            Expr::Call(target, args) => match self.eval(target)? {
                Value::Function(name) => {
                    let args = self.eval_all(args)?;
                    self.call(name, args)
                }
                other => Err(type_error(format!(
                    "'{}' object is not callable",
                    other.type_name()
                ))),
            },
            Expr::Index(target, index) => index_into(self.eval(target)?, &self.eval(index)?),
            Expr::Method(target, name, args) => {
                if name != STARTSWITH {
                    return Err(type_error(format!("unsupported method '{name}'")));
                }
                let mut all = vec![self.eval(target)?];
                all.extend(self.eval_all(args)?);
                self.call(STARTSWITH, all)
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> Result<Vec<Value<'a>>, FilterError> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn lookup(&self, name: &str) -> Result<Value<'a>, FilterError> {
        if name == "req" {
            return Ok(Value::Req(self.req));
        }
        if let Some(builtin) = BUILTINS.iter().copied().find(|builtin| *builtin == name) {
            return Ok(Value::Function(builtin));
        }
        let attribute = self
            .attributes
            .get(name)
            .ok_or_else(|| FilterError::UnknownName(name.to_string()))?;
        Ok(Value::Str(Cow::Borrowed(
            self.req.get(attribute).unwrap_or_default(),
        )))
    }

    fn call(&self, name: &str, args: Vec<Value<'a>>) -> Result<Value<'a>, FilterError> {
        match name {
            "elements" => {
                let [list] = arguments(name, args)?;
                let items = split_links(str_arg(name, &list)?)
                    .into_iter()
                    .map(|item| Value::Str(Cow::Owned(item.to_string())))
                    .collect();
                Ok(Value::List(items))
            }
            "has_element" => {
                let [list, item] = arguments(name, args)?;
                let item = str_arg(name, &item)?;
                Ok(Value::Bool(str_arg(name, &list)?.contains(item)))
            }
            "link_error" => {
                let [] = arguments(name, args)?;
                self.link_error().map(Value::Bool)
            }
            "has_invalid_link" => {
                let [] = arguments(name, args)?;
                Ok(Value::Bool(self.has_invalid_link()))
            }
            "match" | "search" | "fullmatch" => {
                let [pattern, text] = arguments(name, args)?;
                let pattern = str_arg(name, &pattern)?;
                let regex = match name {
                    "match" => format!("^(?:{pattern})"),
                    "fullmatch" => format!("^(?:{pattern})$"),
                    _ => pattern.to_string(),
                };
                let regex =
                    Regex::new(&regex).map_err(|error| FilterError::Pattern(error.to_string()))?;
                Ok(Value::Bool(regex.is_match(str_arg(name, &text)?)))
            }
            STARTSWITH => {
                let [text, prefix] = arguments(name, args)?;
                let text = str_arg(name, &text)?;
                let found = match &prefix {
                    Value::List(prefixes) => prefixes
                        .iter()
                        .map(|prefix| str_arg(name, prefix))
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .any(|prefix| text.starts_with(prefix)),
                    other => text.starts_with(str_arg(name, other)?),
                };
                Ok(Value::Bool(found))
            }
            _ => Err(FilterError::UnknownName(name.to_string())),
        }
    }

    /// True if a parent of this requirement does not list it as a child.
    fn link_error(&self) -> Result<bool, FilterError> {
        let own = self.req.id().unwrap_or_default();
        for parent_id in self.req.parents() {
            let parent = self.project.requirement(parent_id).ok_or_else(|| {
                FilterError::Lookup(format!("parent requirement {parent_id} not found"))
            })?;
            if !parent.children().contains(&own) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if a parent or child of this requirement is not in the project.
    fn has_invalid_link(&self) -> bool {
        [fields::PARENT, fields::CHILD]
            .into_iter()
            .filter_map(|field| self.req.get(field))
            .flat_map(split_links)
            .any(|id| !self.project.contains(id))
    }
}

fn arithmetic<'a>(op: BinaryOp, lhs: Value<'a>, rhs: Value<'a>) -> Result<Value<'a>, FilterError> {
    let overflow = || type_error("integer overflow");
    let result = match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int),
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int),
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int),
        (BinaryOp::Div | BinaryOp::Rem, Value::Int(_), Value::Int(0)) => {
            return Err(type_error("division by zero"));
        }
        (BinaryOp::Div, Value::Int(a), Value::Int(b)) => a.checked_div(*b).map(Value::Int),
        (BinaryOp::Rem, Value::Int(a), Value::Int(b)) => a.checked_rem(*b).map(Value::Int),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            Some(Value::Str(Cow::Owned(format!("{a}{b}"))))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Some(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => Some(Value::Str(repeat(s, *n)?)),
        _ => {
            return Err(type_error(format!(
                "unsupported operand types for {op:?}: '{}' and '{}'",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    result.ok_or_else(overflow)
}

/// Repeats `s` for `*`. A negative count gives the empty string.
fn repeat<'a>(s: &str, count: i64) -> Result<Cow<'a, str>, FilterError> {
    let count = usize::try_from(count).unwrap_or(0);
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Cow::Owned(s.repeat(count))),
        _ => Err(type_error(format!(
            "repeated string would exceed {MAX_STRING_LEN} bytes"
        ))),
    }
}

fn ordering(lhs: &Value<'_>, rhs: &Value<'_>) -> Result<Ordering, FilterError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        _ => Err(type_error(format!(
            "'<' not supported between '{}' and '{}'",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn contains(container: &Value<'_>, item: &Value<'_>) -> Result<bool, FilterError> {
    match container {
        Value::Str(text) => Ok(text.contains(str_arg("in", item)?)),
        Value::List(items) => Ok(items.contains(item)),
        Value::Req(req) => Ok(req.contains(str_arg("in", item)?)),
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn compare(op: CompareOp, lhs: &Value<'_>, rhs: &Value<'_>) -> Result<bool, FilterError> {
    Ok(match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => ordering(lhs, rhs)?.is_lt(),
        CompareOp::Le => ordering(lhs, rhs)?.is_le(),
        CompareOp::Gt => ordering(lhs, rhs)?.is_gt(),
        CompareOp::Ge => ordering(lhs, rhs)?.is_ge(),
        CompareOp::In => contains(rhs, lhs)?,
        CompareOp::NotIn => !contains(rhs, lhs)?,
    })
}

fn index_into<'a>(target: Value<'a>, index: &Value<'_>) -> Result<Value<'a>, FilterError> {
    let position = |len: usize, i: i64| -> Result<usize, FilterError> {
        let len = i64::try_from(len).map_err(|_| type_error("sequence too long"))?;
        let adjusted = if i < 0 { i + len } else { i };
        if (0..len).contains(&adjusted) {
            usize::try_from(adjusted).map_err(|_| type_error("index out of range"))
        } else {
            Err(FilterError::Lookup(format!("index {i} out of range")))
        }
    };
    match (target, index) {
        (Value::Req(req), Value::Str(key)) => req
            .get(key)
            .map(|value| Value::Str(Cow::Borrowed(value)))
            .ok_or_else(|| FilterError::Lookup(format!("requirement has no attribute '{key}'"))),
        (Value::List(mut items), Value::Int(i)) => {
            let p = position(items.len(), *i)?;
            Ok(items.swap_remove(p))
        }
        (Value::Str(text), Value::Int(i)) => {
            let chars: Vec<char> = text.chars().collect();
            let p = position(chars.len(), *i)?;
            Ok(Value::Str(Cow::Owned(chars[p].to_string())))
        }
        (target, index) => Err(type_error(format!(
            "'{}' cannot be indexed by '{}'",
            target.type_name(),
            index.type_name()
        ))),
    }
}
