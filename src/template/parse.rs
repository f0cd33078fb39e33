use super::ast::{Arg, Branch, Command, Node, Pipeline};
use super::lexer::{scan, Item, Spanned, Token};
use super::{FuncRegistry, ParseError};

/// Parses template source into a node tree. Function names are checked
/// against `funcs` so a call to an unknown helper fails here rather than
/// during execution.
pub fn parse(name: &str, src: &str, funcs: &FuncRegistry) -> Result<Vec<Node>, ParseError> {
    let items = scan(name, src)?;
    let mut parser = Parser {
        name,
        funcs,
        items: items.into_iter(),
    };

    let (list, end) = parser.parse_list()?;
    match end {
        Terminator::Eof => Ok(list),
        Terminator::End { line } => Err(parser.error(line, "unexpected {{end}}")),
        Terminator::Else { line, .. } => Err(parser.error(line, "unexpected {{else}}")),
    }
}

enum Terminator {
    Eof,
    End { line: usize },
    Else { line: usize, rest: Vec<Spanned> },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    If,
    Range,
    With,
}

impl Kind {
    fn keyword(self) -> &'static str {
        match self {
            Kind::If => "if",
            Kind::Range => "range",
            Kind::With => "with",
        }
    }
}

struct Parser<'p> {
    name: &'p str,
    funcs: &'p FuncRegistry,
    items: std::vec::IntoIter<Item>,
}

struct Cursor<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.line, |t| t.line)
    }
}

impl Parser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, line, message)
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Terminator), ParseError> {
        let mut list = Vec::new();

        while let Some(item) = self.items.next() {
            let (tokens, line) = match item {
                Item::Text(text) => {
                    list.push(Node::Text(text));
                    continue;
                }
                Item::Action { tokens, line } => (tokens, line),
            };

            match tokens.first().map(|t| &t.token) {
                None => return Err(self.error(line, "missing value for command")),
                Some(Token::End) => {
                    if let Some(extra) = tokens.get(1) {
                        return Err(self.error(
                            extra.line,
                            format!("unexpected {} in end", extra.token.describe()),
                        ));
                    }
                    return Ok((list, Terminator::End { line }));
                }
                Some(Token::Else) => {
                    return Ok((
                        list,
                        Terminator::Else {
                            line,
                            rest: tokens[1..].to_vec(),
                        },
                    ))
                }
                Some(Token::If) => list.push(self.parse_control(Kind::If, &tokens[1..], line)?),
                Some(Token::Range) => {
                    list.push(self.parse_control(Kind::Range, &tokens[1..], line)?)
                }
                Some(Token::With) => {
                    list.push(self.parse_control(Kind::With, &tokens[1..], line)?)
                }
                Some(_) => {
                    let pipe = self.parse_pipeline(&tokens, line, 1, "command")?;
                    list.push(Node::Action { line, pipe });
                }
            }
        }

        Ok((list, Terminator::Eof))
    }

    fn parse_control(
        &mut self,
        kind: Kind,
        tokens: &[Spanned],
        line: usize,
    ) -> Result<Node, ParseError> {
        let max_decl = if kind == Kind::Range { 2 } else { 1 };
        let pipe = self.parse_pipeline(tokens, line, max_decl, kind.keyword())?;
        let (list, end) = self.parse_list()?;

        let else_list = match end {
            Terminator::End { .. } => Vec::new(),
            Terminator::Eof => {
                return Err(self.error(line, format!("unexpected EOF in {}", kind.keyword())))
            }
            Terminator::Else {
                line: else_line,
                rest,
            } => match (kind, rest.first().map(|t| &t.token)) {
                (_, None) => {
                    let (else_list, end) = self.parse_list()?;
                    match end {
                        Terminator::End { .. } => else_list,
                        Terminator::Else { line, .. } => {
                            return Err(self.error(line, "expected end; found {{else}}"))
                        }
                        Terminator::Eof => {
                            return Err(self.error(
                                else_line,
                                format!("unexpected EOF in {}", kind.keyword()),
                            ))
                        }
                    }
                }
                // `else if` / `else with` chains share the outer `end`
                (Kind::If, Some(Token::If)) => {
                    vec![self.parse_control(Kind::If, &rest[1..], else_line)?]
                }
                (Kind::With, Some(Token::With)) => {
                    vec![self.parse_control(Kind::With, &rest[1..], else_line)?]
                }
                (_, Some(token)) => {
                    return Err(self.error(
                        else_line,
                        format!("unexpected {} in else", token.describe()),
                    ))
                }
            },
        };

        let branch = Branch {
            line,
            pipe,
            list,
            else_list,
        };
        Ok(match kind {
            Kind::If => Node::If(branch),
            Kind::Range => Node::Range(branch),
            Kind::With => Node::With(branch),
        })
    }

    fn parse_pipeline(
        &self,
        tokens: &[Spanned],
        line: usize,
        max_decl: usize,
        context: &str,
    ) -> Result<Pipeline, ParseError> {
        let mut cur = Cursor {
            tokens,
            pos: 0,
            line,
        };
        let decl = self.parse_decl(&mut cur, max_decl, context)?;
        let pipe = self.parse_commands(&mut cur, decl, context)?;

        if let Some(token) = cur.peek() {
            return Err(self.error(
                cur.line(),
                format!("unexpected {} in {context}", token.describe()),
            ));
        }
        Ok(pipe)
    }

    fn parse_decl(
        &self,
        cur: &mut Cursor<'_>,
        max_decl: usize,
        context: &str,
    ) -> Result<Vec<String>, ParseError> {
        let tokens = cur.tokens;
        let rest: Vec<&Token> = tokens[cur.pos..].iter().map(|t| &t.token).collect();
        match rest.as_slice() {
            [Token::Variable(var), Token::Declare, ..] if var.fields.is_empty() => {
                cur.pos += 2;
                Ok(vec![var.name.clone()])
            }
            [Token::Variable(first), Token::Comma, Token::Variable(second), Token::Declare, ..]
                if first.fields.is_empty() && second.fields.is_empty() =>
            {
                if max_decl < 2 {
                    return Err(self.error(
                        cur.line(),
                        format!("too many declarations in {context}"),
                    ));
                }
                cur.pos += 4;
                Ok(vec![first.name.clone(), second.name.clone()])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn parse_commands(
        &self,
        cur: &mut Cursor<'_>,
        decl: Vec<String>,
        context: &str,
    ) -> Result<Pipeline, ParseError> {
        let mut cmds = Vec::new();
        loop {
            let cmd = self.parse_command(cur)?;
            if cmd.args.is_empty() {
                return Err(self.error(cur.line(), format!("missing value for {context}")));
            }
            cmds.push(cmd);
            if cur.peek() != Some(&Token::Pipe) {
                break;
            }
            cur.advance();
        }
        Ok(Pipeline { decl, cmds })
    }

    fn parse_command(&self, cur: &mut Cursor<'_>) -> Result<Command, ParseError> {
        let mut args = Vec::new();

        while let Some(token) = cur.peek() {
            let arg = match token {
                Token::Pipe | Token::RightParen => break,
                Token::Dot => Arg::Dot,
                Token::Field(chain) => Arg::Field(chain.clone()),
                Token::Variable(var) => Arg::Variable {
                    name: var.name.clone(),
                    fields: var.fields.clone(),
                },
                Token::Ident(name) => {
                    if !self.funcs.is_callable(name) {
                        return Err(
                            self.error(cur.line(), format!("function {name:?} not defined"))
                        );
                    }
                    Arg::Func(name.clone())
                }
                Token::True => Arg::Bool(true),
                Token::False => Arg::Bool(false),
                Token::Nil => Arg::Nil,
                Token::Int(i) => Arg::Int(*i),
                Token::Str(s) => Arg::Str(s.clone()),
                Token::LeftParen => {
                    let open_line = cur.line();
                    cur.advance();
                    let pipe = self.parse_commands(cur, Vec::new(), "parenthesized pipeline")?;
                    if cur.peek() != Some(&Token::RightParen) {
                        return Err(self.error(open_line, "unclosed left paren"));
                    }
                    Arg::Pipe(Box::new(pipe))
                }
                other => {
                    return Err(self.error(
                        cur.line(),
                        format!("unexpected {} in operand", other.describe()),
                    ))
                }
            };
            cur.advance();
            args.push(arg);
        }

        Ok(Command { args })
    }
}
