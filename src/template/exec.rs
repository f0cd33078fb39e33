use std::borrow::Cow;

use super::ast::{Arg, Branch, Command, Node, Pipeline};
use super::funcs::call_builtin;
use super::value::Value;
use super::{ExecError, FuncRegistry};

/// Walks a parsed template with `data` as both `.` and `$`.
pub fn execute<'a>(
    name: &str,
    nodes: &[Node],
    funcs: &FuncRegistry,
    data: Value<'a>,
) -> Result<String, ExecError> {
    let mut state = State {
        name,
        funcs,
        vars: vec![("$".to_string(), data.clone())],
        out: String::new(),
    };
    state.walk(&data, nodes)?;
    Ok(state.out)
}

struct State<'s, 'a> {
    name: &'s str,
    funcs: &'s FuncRegistry,
    /// Variable stack; inner scopes truncate back to their mark on exit.
    vars: Vec<(String, Value<'a>)>,
    out: String,
}

impl<'a> State<'_, 'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> ExecError {
        ExecError {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn walk(&mut self, dot: &Value<'a>, nodes: &[Node]) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action { line, pipe } => {
                    let value = self.eval_pipeline(dot, pipe, *line, true)?;
                    if pipe.decl.is_empty() {
                        value.print_to(&mut self.out).map_err(|kind| {
                            self.error(*line, format!("can't print value of type {kind}"))
                        })?;
                    }
                }
                Node::If(branch) => {
                    let mark = self.vars.len();
                    let result = self.eval_pipeline(dot, &branch.pipe, branch.line, true).and_then(
                        |value| {
                            if value.is_true() {
                                self.walk(dot, &branch.list)
                            } else {
                                self.walk(dot, &branch.else_list)
                            }
                        },
                    );
                    self.vars.truncate(mark);
                    result?;
                }
                Node::With(branch) => {
                    let mark = self.vars.len();
                    let result = self.eval_pipeline(dot, &branch.pipe, branch.line, true).and_then(
                        |value| {
                            if value.is_true() {
                                self.walk(&value, &branch.list)
                            } else {
                                self.walk(dot, &branch.else_list)
                            }
                        },
                    );
                    self.vars.truncate(mark);
                    result?;
                }
                Node::Range(branch) => {
                    let mark = self.vars.len();
                    let result = self.walk_range(dot, branch);
                    self.vars.truncate(mark);
                    result?;
                }
            }
        }
        Ok(())
    }

    fn walk_range(&mut self, dot: &Value<'a>, branch: &Branch) -> Result<(), ExecError> {
        match self.eval_pipeline(dot, &branch.pipe, branch.line, false)? {
            Value::List(items) => self.range_over(dot, branch, items.into_iter()),
            Value::Int(n) if n >= 0 => self.range_over(dot, branch, (0..n).map(Value::Int)),
            Value::Nil => self.walk(dot, &branch.else_list),
            other => Err(self.error(
                branch.line,
                format!("range can't iterate over {}", other.kind()),
            )),
        }
    }

    fn range_over(
        &mut self,
        dot: &Value<'a>,
        branch: &Branch,
        items: impl Iterator<Item = Value<'a>>,
    ) -> Result<(), ExecError> {
        let mut items = items.peekable();
        if items.peek().is_none() {
            return self.walk(dot, &branch.else_list);
        }

        let mark = self.vars.len();
        for (i, item) in (0_i64..).zip(items) {
            match branch.pipe.decl.as_slice() {
                [elem] => self.vars.push((elem.clone(), item.clone())),
                [index, elem] => {
                    self.vars.push((index.clone(), Value::Int(i)));
                    self.vars.push((elem.clone(), item.clone()));
                }
                _ => {}
            }
            let result = self.walk(&item, &branch.list);
            self.vars.truncate(mark);
            result?;
        }
        Ok(())
    }

    fn eval_pipeline(
        &mut self,
        dot: &Value<'a>,
        pipe: &Pipeline,
        line: usize,
        declare: bool,
    ) -> Result<Value<'a>, ExecError> {
        let mut piped = None;
        for cmd in &pipe.cmds {
            piped = Some(self.eval_command(dot, cmd, piped, line)?);
        }
        let value = piped.unwrap_or(Value::Nil);

        if declare {
            for name in &pipe.decl {
                self.vars.push((name.clone(), value.clone()));
            }
        }
        Ok(value)
    }

    fn eval_command(
        &mut self,
        dot: &Value<'a>,
        cmd: &Command,
        piped: Option<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, ExecError> {
        match cmd.args.as_slice() {
            [Arg::Func(name), rest @ ..]
                if matches!(name.as_str(), "and" | "or") && self.funcs.get(name).is_none() =>
            {
                self.eval_logic(name == "and", dot, rest, piped, line)
            }
            [Arg::Func(name), rest @ ..] => {
                let mut args = Vec::with_capacity(rest.len() + 1);
                for arg in rest {
                    args.push(self.eval_arg(dot, arg, line)?);
                }
                args.extend(piped);
                self.call(name, args, line)
            }
            [Arg::Nil] => Err(self.error(line, "nil is not a command")),
            [arg] if piped.is_none() => self.eval_arg(dot, arg, line),
            [] => Err(self.error(line, "empty command")),
            [first, ..] => Err(self.error(
                line,
                format!("can't give argument to non-function {}", describe(first)),
            )),
        }
    }

    /// `and` / `or` stop evaluating arguments once the result is decided and
    /// return the deciding argument.
    fn eval_logic(
        &mut self,
        is_and: bool,
        dot: &Value<'a>,
        args: &[Arg],
        piped: Option<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, ExecError> {
        if args.is_empty() && piped.is_none() {
            let name = if is_and { "and" } else { "or" };
            return Err(self.error(
                line,
                format!("error calling {name}: wrong number of args for {name}: want at least 1 got 0"),
            ));
        }
        let mut last = Value::Nil;
        for arg in args {
            last = self.eval_arg(dot, arg, line)?;
            if last.is_true() != is_and {
                return Ok(last);
            }
        }
        Ok(piped.unwrap_or(last))
    }

    fn eval_arg(&mut self, dot: &Value<'a>, arg: &Arg, line: usize) -> Result<Value<'a>, ExecError> {
        match arg {
            Arg::Dot => Ok(dot.clone()),
            Arg::Field(chain) => self.resolve(dot.clone(), chain, line),
            Arg::Variable { name, fields } => {
                let value = self.lookup(name, line)?;
                self.resolve(value, fields, line)
            }
            Arg::Func(name) => self.call(name, Vec::new(), line),
            Arg::Bool(b) => Ok(Value::Bool(*b)),
            Arg::Int(i) => Ok(Value::Int(*i)),
            Arg::Str(s) => Ok(Value::Str(Cow::Owned(s.clone()))),
            Arg::Nil => Ok(Value::Nil),
            Arg::Pipe(pipe) => self.eval_pipeline(dot, pipe, line, false),
        }
    }

    fn lookup(&self, name: &str, line: usize) -> Result<Value<'a>, ExecError> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| self.error(line, format!("undefined variable: {name}")))
    }

    fn resolve(
        &self,
        mut value: Value<'a>,
        chain: &[String],
        line: usize,
    ) -> Result<Value<'a>, ExecError> {
        for field in chain {
            value = match value {
                Value::Record(record) => record.field(field).ok_or_else(|| {
                    self.error(
                        line,
                        format!(
                            "can't evaluate field {field} in type {}",
                            record.type_name()
                        ),
                    )
                })?,
                Value::Nil => {
                    return Err(self.error(line, format!("nil pointer evaluating .{field}")))
                }
                other => {
                    return Err(self.error(
                        line,
                        format!("can't evaluate field {field} in type {}", other.kind()),
                    ))
                }
            };
        }
        Ok(value)
    }

    fn call(&self, name: &str, args: Vec<Value<'a>>, line: usize) -> Result<Value<'a>, ExecError> {
        let result = match self.funcs.get(name) {
            Some(helper) => (**helper)(&args),
            None => match call_builtin(name, args) {
                Some(result) => result,
                None => return Err(self.error(line, format!("function {name:?} not defined"))),
            },
        };
        result.map_err(|err| self.error(line, format!("error calling {name}: {err}")))
    }
}

fn describe(arg: &Arg) -> String {
    match arg {
        Arg::Dot => ".".to_string(),
        Arg::Field(chain) => format!(".{}", chain.join(".")),
        Arg::Variable { name, fields } if fields.is_empty() => name.clone(),
        Arg::Variable { name, fields } => format!("{name}.{}", fields.join(".")),
        Arg::Func(name) => name.clone(),
        Arg::Bool(b) => b.to_string(),
        Arg::Int(i) => i.to_string(),
        Arg::Str(s) => format!("{s:?}"),
        Arg::Nil => "nil".to_string(),
        Arg::Pipe(_) => "(pipeline)".to_string(),
    }
}
