//! The `print`, `println` and `printf` builtins, following Go's `fmt` rules
//! for the value kinds templates can produce.

use std::iter::Peekable;
use std::str::Chars;

use super::funcs::HelperError;
use super::value::Value;

/// Operands are joined with a space when neither side is a string.
pub(crate) fn sprint(args: &[Value<'_>]) -> Result<String, HelperError> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !is_str(&args[i - 1]) && !is_str(arg) {
            out.push(' ');
        }
        write_plain(&mut out, arg)?;
    }
    Ok(out)
}

/// Operands are always space separated and a newline is appended.
pub(crate) fn sprintln(args: &[Value<'_>]) -> Result<String, HelperError> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_plain(&mut out, arg)?;
    }
    out.push('\n');
    Ok(out)
}

#[derive(Default)]
struct Spec {
    minus: bool,
    plus: bool,
    zero: bool,
    width: usize,
}

/// Supports the `v s d t q x X` verbs, the `- + 0` flags and a width.
/// Mismatches are rendered inline the way Go does (`%!d(string=a)`).
pub(crate) fn sprintf(format: &str, args: &[Value<'_>]) -> Result<String, HelperError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let spec = parse_spec(&mut chars);
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next_arg) else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        next_arg += 1;

        let text = format_verb(verb, &spec, arg)?;
        pad(&mut out, &text, &spec, matches!(verb, 'd' | 'x' | 'X'));
    }

    if next_arg < args.len() {
        out.push_str("%!(EXTRA ");
        for (i, arg) in args[next_arg..].iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(arg.kind());
            out.push('=');
            write_plain(&mut out, arg)?;
        }
        out.push(')');
    }
    Ok(out)
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Spec {
    let mut spec = Spec::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.minus = true,
            '+' => spec.plus = true,
            '0' => spec.zero = true,
            _ => break,
        }
        chars.next();
    }
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        spec.width = spec.width.saturating_mul(10).saturating_add(digit as usize);
        chars.next();
    }
    spec
}

fn format_verb(verb: char, spec: &Spec, arg: &Value<'_>) -> Result<String, HelperError> {
    let text = match (verb, arg) {
        ('v', _) | ('s', Value::Str(_) | Value::List(_)) => {
            let mut s = String::new();
            write_plain(&mut s, arg)?;
            s
        }
        ('d', Value::Int(i)) if spec.plus && *i >= 0 => format!("+{i}"),
        ('d', Value::Int(i)) => i.to_string(),
        ('t', Value::Bool(b)) => b.to_string(),
        ('q', Value::Str(s)) => format!("{s:?}"),
        ('x', Value::Int(i)) => signed_hex(*i, false),
        ('X', Value::Int(i)) => signed_hex(*i, true),
        ('x', Value::Str(s)) => s.bytes().map(|b| format!("{b:02x}")).collect(),
        ('X', Value::Str(s)) => s.bytes().map(|b| format!("{b:02X}")).collect(),
        _ => {
            let mut s = format!("%!{verb}({}=", arg.kind());
            write_plain(&mut s, arg)?;
            s.push(')');
            s
        }
    };
    Ok(text)
}

fn signed_hex(i: i64, upper: bool) -> String {
    let sign = if i < 0 { "-" } else { "" };
    let abs = i.unsigned_abs();
    if upper {
        format!("{sign}{abs:X}")
    } else {
        format!("{sign}{abs:x}")
    }
}

fn pad(out: &mut String, text: &str, spec: &Spec, numeric: bool) {
    let fill = spec.width.saturating_sub(text.chars().count());
    if fill == 0 {
        out.push_str(text);
    } else if spec.minus {
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && numeric {
        let signed = text.starts_with('-') || text.starts_with('+');
        let (sign, digits) = text.split_at(usize::from(signed));
        out.push_str(sign);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(text);
    }
}

fn is_str(value: &Value<'_>) -> bool {
    matches!(value, Value::Str(_))
}

fn write_plain(out: &mut String, value: &Value<'_>) -> Result<(), HelperError> {
    match value {
        Value::Nil => {
            out.push_str("<nil>");
            Ok(())
        }
        other => other
            .print_to(out)
            .map_err(|kind| HelperError::new(format!("can't print value of type {kind}"))),
    }
}
