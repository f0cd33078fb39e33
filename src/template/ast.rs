#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    /// `{{pipeline}}`, printed unless it declares variables
    Action { line: usize, pipe: Pipeline },
    If(Branch),
    Range(Branch),
    With(Branch),
}

/// Shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub line: usize,
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Variables declared with `:=`, in source order
    pub decl: Vec<String>,
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Func(String),
    Bool(bool),
    Int(i64),
    Str(String),
    Nil,
    Pipe(Box<Pipeline>),
}
