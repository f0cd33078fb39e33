use std::borrow::Cow;
use std::fmt;

/// A typed node of the data tree that templates can reach into with `.Field`.
///
/// Field names are resolved against a fixed set per type; `None` means the
/// name does not exist and execution fails.
pub trait Record: fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn field(&self, name: &str) -> Option<Value<'_>>;
}

/// Values flowing through template pipelines.
#[derive(Clone, Debug)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Cow<'a, str>),
    List(Vec<Value<'a>>),
    Record(&'a dyn Record),
}

impl<'a> Value<'a> {
    pub fn records<R: Record>(items: &'a [R]) -> Self {
        Value::List(items.iter().map(|item| Value::Record(item)).collect())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Record(record) => record.type_name(),
        }
    }

    /// Go template truthiness: false, 0, nil and empty strings or lists are false.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Record(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Appends the printed form of the value, or returns the kind of value
    /// that has no printed form.
    pub(crate) fn print_to(&self, out: &mut String) -> Result<(), &'static str> {
        match self {
            Value::Nil => out.push_str("<no value>"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    item.print_to(out)?;
                }
                out.push(']');
            }
            Value::Record(record) => return Err(record.type_name()),
        }
        Ok(())
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Str(Cow::Owned(s))
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value<'_> {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
