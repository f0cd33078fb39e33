use logos::{Lexer, Logos};

use super::ParseError;

const LEFT_DELIM: &str = "{{";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: String,
    pub fields: Vec<String>,
}

/// Tokens inside a `{{ ... }}` action.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("}}")]
    RightDelim,

    /// `-}}`, trims whitespace following the action
    #[token("-}}")]
    TrimRightDelim,

    #[token("|")]
    Pipe,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token(":=")]
    Declare,

    #[token(",")]
    Comma,

    /// `.` on its own, the current value
    #[token(".")]
    Dot,

    /// `.Field` or `.Field.Nested`
    #[regex(r"(\.[A-Za-z_][A-Za-z0-9_]*)+", field_chain)]
    Field(Vec<String>),

    /// `$`, `$name` or `$name.Field`
    #[regex(r"\$[A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", variable)]
    Variable(VarRef),

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("end")]
    End,

    #[token("range")]
    Range,

    #[token("with")]
    With,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("nil")]
    Nil,

    /// Function name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#, quoted_string)]
    #[regex(r"`[^`]*`", raw_string)]
    Str(String),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::RightDelim => "\"}}\"".to_string(),
            Token::TrimRightDelim => "\"-}}\"".to_string(),
            Token::Pipe => "\"|\"".to_string(),
            Token::LeftParen => "\"(\"".to_string(),
            Token::RightParen => "\")\"".to_string(),
            Token::Declare => "\":=\"".to_string(),
            Token::Comma => "\",\"".to_string(),
            Token::Dot => "\".\"".to_string(),
            Token::Field(chain) => format!("<.{}>", chain.join(".")),
            Token::Variable(var) => format!("<{}>", var.name),
            Token::If => "<if>".to_string(),
            Token::Else => "<else>".to_string(),
            Token::End => "<end>".to_string(),
            Token::Range => "<range>".to_string(),
            Token::With => "<with>".to_string(),
            Token::True => "<true>".to_string(),
            Token::False => "<false>".to_string(),
            Token::Nil => "<nil>".to_string(),
            Token::Ident(name) => format!("<{name}>"),
            Token::Int(i) => format!("<{i}>"),
            Token::Str(s) => format!("{s:?}"),
        }
    }
}

fn field_chain(lex: &mut Lexer<Token>) -> Vec<String> {
    lex.slice()[1..].split('.').map(str::to_string).collect()
}

fn variable(lex: &mut Lexer<Token>) -> VarRef {
    let mut parts = lex.slice().split('.');
    let name = parts.next().unwrap_or("$").to_string();
    VarRef {
        name,
        fields: parts.map(str::to_string).collect(),
    }
}

fn raw_string(lex: &mut Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

fn quoted_string(lex: &mut Lexer<Token>) -> Option<String> {
    let s = lex.slice();
    let mut out = String::with_capacity(s.len());
    let mut chars = s[1..s.len() - 1].chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => hex_char(&mut chars, 2)?,
            'u' => hex_char(&mut chars, 4)?,
            'U' => hex_char(&mut chars, 8)?,
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// A template split into literal text and the token lists of its actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Text(String),
    Action { tokens: Vec<Spanned>, line: usize },
}

/// Splits template source into text and actions, applying `{{-` / `-}}`
/// trimming and dropping comments.
pub fn scan(name: &str, src: &str) -> Result<Vec<Item>, ParseError> {
    let mut items = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    loop {
        let Some(open) = src[pos..].find(LEFT_DELIM) else {
            push_text(&mut items, &src[pos..], trim_next, false);
            break;
        };
        let start = pos + open;
        let line = line_at(src, start);
        let mut inner = start + LEFT_DELIM.len();

        let trim_prev = is_left_trim(&src[inner..]);
        push_text(&mut items, &src[pos..start], trim_next, trim_prev);
        if trim_prev {
            inner += 1;
        }

        let body = &src[inner..];
        let comment_at = inner + (body.len() - body.trim_start_matches(is_trim_space).len());
        let (end, trim) = if src[comment_at..].starts_with("/*") {
            scan_comment(name, src, comment_at, line)?
        } else {
            let (tokens, end, trim) = scan_action(name, src, inner, line)?;
            items.push(Item::Action { tokens, line });
            (end, trim)
        };
        pos = end;
        trim_next = trim;
    }

    Ok(items)
}

fn is_left_trim(s: &str) -> bool {
    s.starts_with('-') && s.as_bytes().get(1).is_some_and(u8::is_ascii_whitespace)
}

/// Whitespace removed by trim markers. Other Unicode spaces are kept.
fn is_trim_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
    let text = if trim_start {
        text.trim_start_matches(is_trim_space)
    } else {
        text
    };
    let text = if trim_end {
        text.trim_end_matches(is_trim_space)
    } else {
        text
    };
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

/// Returns the offset just past the comment's closing delimiter and whether
/// it was `-}}`.
fn scan_comment(
    name: &str,
    src: &str,
    at: usize,
    line: usize,
) -> Result<(usize, bool), ParseError> {
    let close = src[at + 2..]
        .find("*/")
        .map(|i| at + 2 + i + 2)
        .ok_or_else(|| ParseError::new(name, line, "unclosed comment"))?;
    let rest = &src[close..];
    if rest.starts_with("}}") {
        return Ok((close + 2, false));
    }
    let trimmed = rest.trim_start_matches(is_trim_space);
    if trimmed.len() < rest.len() && trimmed.starts_with("-}}") {
        return Ok((close + (rest.len() - trimmed.len()) + 3, true));
    }
    Err(ParseError::new(
        name,
        line,
        "comment ends before closing delimiter",
    ))
}

/// Lexes tokens from `inner` up to the closing delimiter. Returns the tokens,
/// the offset past the delimiter, and whether it was `-}}`.
fn scan_action(
    name: &str,
    src: &str,
    inner: usize,
    line: usize,
) -> Result<(Vec<Spanned>, usize, bool), ParseError> {
    let mut lexer = Token::lexer(&src[inner..]);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let offset = inner + span.start;
        match result {
            Ok(Token::RightDelim) => return Ok((tokens, inner + span.end, false)),
            Ok(Token::TrimRightDelim) => {
                if !src[..offset].ends_with(|c: char| c.is_ascii_whitespace()) {
                    return Err(ParseError::new(
                        name,
                        line_at(src, offset),
                        "\"-}}\" must be preceded by a space",
                    ));
                }
                return Ok((tokens, inner + span.end, true));
            }
            Ok(token) => tokens.push(Spanned {
                token,
                line: line_at(src, offset),
            }),
            Err(()) => {
                return Err(ParseError::new(
                    name,
                    line_at(src, offset),
                    format!("bad token {:?} in action", &src[offset..inner + span.end]),
                ))
            }
        }
    }

    Err(ParseError::new(name, line, "unclosed action"))
}

/// 1-based line of a byte offset.
pub fn line_at(src: &str, offset: usize) -> usize {
    src[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
