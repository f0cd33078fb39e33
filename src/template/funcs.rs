use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::format::{sprint, sprintf, sprintln};
use super::value::Value;

/// Failure raised by a helper function while a template executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HelperError(pub String);

impl HelperError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Helper =
    Arc<dyn for<'a> Fn(&[Value<'a>]) -> Result<Value<'a>, HelperError> + Send + Sync>;

/// Named helper functions callable from templates.
///
/// A registry is never mutated after construction; [`FuncRegistry::merge`]
/// and [`FuncRegistry::with`] produce new registries.
#[derive(Clone)]
pub struct FuncRegistry {
    funcs: BTreeMap<String, Helper>,
}

impl FuncRegistry {
    pub fn empty() -> Self {
        Self {
            funcs: BTreeMap::new(),
        }
    }

    pub fn with<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&[Value<'a>]) -> Result<Value<'a>, HelperError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
        self
    }

    /// Returns a registry holding both sets; `other` wins on name clashes.
    pub fn merge(&self, other: &FuncRegistry) -> FuncRegistry {
        let mut funcs = self.funcs.clone();
        funcs.extend(
            other
                .funcs
                .iter()
                .map(|(name, func)| (name.clone(), Arc::clone(func))),
        );
        FuncRegistry { funcs }
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.funcs.get(name)
    }

    /// True when `name` resolves either to a registered helper or a builtin.
    pub fn is_callable(&self, name: &str) -> bool {
        self.funcs.contains_key(name) || BUILTINS.contains(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }
}

impl Default for FuncRegistry {
    fn default() -> Self {
        FuncRegistry::empty()
            .with("ToUpper", to_upper)
            .with("FirstUpper", first_upper)
            .with("AddNum", add_num)
    }
}

impl fmt::Debug for FuncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

fn expect_args(name: &str, args: &[Value<'_>], want: usize) -> Result<(), HelperError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(HelperError(format!(
            "wrong number of args for {name}: want {want} got {}",
            args.len()
        )))
    }
}

fn string_arg<'v>(name: &str, value: &'v Value<'_>) -> Result<&'v str, HelperError> {
    value.as_str().ok_or_else(|| {
        HelperError(format!(
            "wrong type for value in {name}; expected string; got {}",
            value.kind()
        ))
    })
}

fn int_arg(name: &str, value: &Value<'_>) -> Result<i64, HelperError> {
    value.as_int().ok_or_else(|| {
        HelperError(format!(
            "wrong type for value in {name}; expected int; got {}",
            value.kind()
        ))
    })
}

fn to_upper<'a>(args: &[Value<'a>]) -> Result<Value<'a>, HelperError> {
    expect_args("ToUpper", args, 1)?;
    Ok(Value::from(string_arg("ToUpper", &args[0])?.to_uppercase()))
}

fn first_upper<'a>(args: &[Value<'a>]) -> Result<Value<'a>, HelperError> {
    expect_args("FirstUpper", args, 1)?;
    Ok(Value::from(title_case(string_arg("FirstUpper", &args[0])?)))
}

fn add_num<'a>(args: &[Value<'a>]) -> Result<Value<'a>, HelperError> {
    expect_args("AddNum", args, 2)?;
    let num = int_arg("AddNum", &args[0])?;
    let a = int_arg("AddNum", &args[1])?;
    num.checked_add(a)
        .map(Value::Int)
        .ok_or_else(|| HelperError(format!("AddNum: {num} + {a} overflows")))
}

/// Upper-cases the first letter of every word and leaves the rest untouched.
///
/// Underscores and apostrophes do not start a new word, so `full_name`
/// becomes `Full_name` and `o'neil` becomes `O'neil`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_' || c == '\'');
    }
    out
}

const BUILTINS: &[&str] = &[
    "and", "or", "not", "len", "index", "eq", "ne", "lt", "le", "gt", "ge", "print", "printf",
    "println",
];

/// Evaluates one of the language builtins. Returns `None` when `name` is not
/// a builtin.
pub(crate) fn call_builtin<'a>(
    name: &str,
    mut args: Vec<Value<'a>>,
) -> Option<Result<Value<'a>, HelperError>> {
    let result = match name {
        "and" => at_least(name, &args, 1).map(|()| {
            let pos = args.iter().position(|v| !v.is_true());
            args.swap_remove(pos.unwrap_or(args.len() - 1))
        }),
        "or" => at_least(name, &args, 1).map(|()| {
            let pos = args.iter().position(Value::is_true);
            args.swap_remove(pos.unwrap_or(args.len() - 1))
        }),
        "not" => expect_args(name, &args, 1).map(|()| Value::Bool(!args[0].is_true())),
        "len" => expect_args(name, &args, 1).and_then(|()| length(&args[0])),
        "index" => expect_args(name, &args, 2).and_then(|()| index(args)),
        "eq" => at_least(name, &args, 2).and_then(|()| {
            let mut any = false;
            for other in &args[1..] {
                any |= equal(&args[0], other)?;
            }
            Ok(Value::Bool(any))
        }),
        "ne" => expect_args(name, &args, 2)
            .and_then(|()| equal(&args[0], &args[1]))
            .map(|eq| Value::Bool(!eq)),
        "lt" | "le" | "gt" | "ge" => expect_args(name, &args, 2)
            .and_then(|()| compare(&args[0], &args[1]))
            .map(|ord| {
                Value::Bool(match name {
                    "lt" => ord.is_lt(),
                    "le" => ord.is_le(),
                    "gt" => ord.is_gt(),
                    _ => ord.is_ge(),
                })
            }),
        "print" => sprint(&args).map(Value::from),
        "println" => sprintln(&args).map(Value::from),
        "printf" => at_least(name, &args, 1).and_then(|()| {
            let format = string_arg(name, &args[0])?;
            sprintf(format, &args[1..]).map(Value::from)
        }),
        _ => return None,
    };
    Some(result)
}

fn at_least(name: &str, args: &[Value<'_>], min: usize) -> Result<(), HelperError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(HelperError(format!(
            "wrong number of args for {name}: want at least {min} got {}",
            args.len()
        )))
    }
}

fn length<'a>(value: &Value<'a>) -> Result<Value<'a>, HelperError> {
    let len = match value {
        Value::Str(s) => s.len(),
        Value::List(items) => items.len(),
        other => return Err(HelperError(format!("len of type {}", other.kind()))),
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| HelperError::new("len overflows int"))
}

fn index(mut args: Vec<Value<'_>>) -> Result<Value<'_>, HelperError> {
    let idx = int_arg("index", &args[1])?;
    match args.swap_remove(0) {
        Value::List(mut items) => {
            let len = items.len();
            usize::try_from(idx)
                .ok()
                .filter(|i| *i < len)
                .map(|i| items.swap_remove(i))
                .ok_or_else(|| HelperError(format!("index out of range: {idx}")))
        }
        other => Err(HelperError(format!(
            "can't index item of type {}",
            other.kind()
        ))),
    }
}

fn equal(a: &Value<'_>, b: &Value<'_>) -> Result<bool, HelperError> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        _ => Err(HelperError(format!(
            "incompatible types for comparison: {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}

fn compare(a: &Value<'_>, b: &Value<'_>) -> Result<std::cmp::Ordering, HelperError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => Err(HelperError(format!(
            "incompatible types for comparison: {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}
