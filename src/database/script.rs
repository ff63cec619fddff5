//! The annotation-script directive language: a small, sandboxed grammar of
//! call-syntax directives that is parsed directly, never executed as host
//! code. Directives: `org`, `code`, `notcode`, `data`, `label`,
//! `operand_disp`, `operand_label`, `comment_head`, `comment_tail`.

use std::fmt::Write as _;

use super::hint::LabelPolicy;
use super::{DataType, Database};
use crate::error::ReachError;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Str(String),
    Ident(String),
}

#[derive(Debug, Clone)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    LParen,
    RParen,
    Comma,
    Eq,
}

fn err(line: usize, message: impl Into<String>) -> ReachError {
    ReachError::Script {
        line,
        message: message.into(),
    }
}

fn tokenize(line_no: usize, line: &str) -> Result<Vec<Token>, ReachError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '"' => {
                i += 1;
                let mut s = String::new();
                loop {
                    if i >= chars.len() {
                        return Err(err(line_no, "unterminated string literal"));
                    }
                    match chars[i] {
                        '"' => {
                            i += 1;
                            break;
                        }
                        '\\' => {
                            i += 1;
                            let esc = *chars.get(i).ok_or_else(|| {
                                err(line_no, "unterminated escape in string literal")
                            })?;
                            s.push(match esc {
                                'n' => '\n',
                                't' => '\t',
                                '\\' => '\\',
                                '"' => '"',
                                other => return Err(err(line_no, format!("unknown escape \\{other}"))),
                            });
                            i += 1;
                        }
                        other => {
                            s.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                if c == '-' && (i >= chars.len() || !chars[i].is_ascii_hexdigit()) {
                    return Err(err(line_no, "malformed negative number"));
                }
                let mut j = i;
                if j < chars.len() && chars[j] == 'x' {
                    j += 1;
                    while j < chars.len() && chars[j].is_ascii_hexdigit() {
                        j += 1;
                    }
                } else {
                    while j < chars.len() && chars[j].is_ascii_hexdigit() {
                        j += 1;
                    }
                }
                let text: String = chars[start..j].iter().collect();
                let value = parse_int(&text)
                    .ok_or_else(|| err(line_no, format!("malformed integer literal: {text}")))?;
                tokens.push(Token::Int(value));
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(err(line_no, format!("unexpected character: {other:?}"))),
        }
    }
    Ok(tokens)
}

fn parse_int(text: &str) -> Option<i64> {
    let (neg, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(if neg { -value } else { value })
}

struct Call {
    name: String,
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

fn parse_call(line_no: usize, tokens: &[Token]) -> Result<Call, ReachError> {
    let mut it = tokens.iter().peekable();
    let name = match it.next() {
        Some(Token::Ident(name)) => name.clone(),
        _ => return Err(err(line_no, "expected directive name")),
    };
    match it.next() {
        Some(Token::LParen) => {}
        _ => return Err(err(line_no, "expected '(' after directive name")),
    }
    let mut positional = Vec::new();
    let mut keyword = Vec::new();
    if matches!(it.peek(), Some(Token::RParen)) {
        it.next();
    } else {
        loop {
            let first = it.next().ok_or_else(|| err(line_no, "unexpected end of directive"))?;
            let (key, value_tok) = if let Token::Ident(ident) = first {
                if matches!(it.peek(), Some(Token::Eq)) {
                    it.next();
                    (Some(ident.clone()), it.next())
                } else {
                    (None, Some(first))
                }
            } else {
                (None, Some(first))
            };
            let value = match value_tok {
                Some(Token::Int(v)) => Value::Int(*v),
                Some(Token::Str(s)) => Value::Str(s.clone()),
                Some(Token::Ident(s)) => Value::Ident(s.clone()),
                _ => return Err(err(line_no, "expected a value")),
            };
            match key {
                Some(k) => keyword.push((k, value)),
                None => positional.push(value),
            }
            match it.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                _ => return Err(err(line_no, "expected ',' or ')'")),
            }
        }
    }
    if it.next().is_some() {
        return Err(err(line_no, "unexpected trailing tokens"));
    }
    Ok(Call {
        name,
        positional,
        keyword,
    })
}

impl Call {
    fn arg(&self, line_no: usize, index: usize, name: &str) -> Result<&Value, ReachError> {
        if let Some(v) = self.positional.get(index) {
            return Ok(v);
        }
        self.keyword
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| err(line_no, format!("missing argument: {name}")))
    }

    fn opt_arg(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keyword.iter().find(|(k, _)| k == name).map(|(_, v)| v))
    }

    fn addr(&self, line_no: usize, index: usize, name: &str) -> Result<u16, ReachError> {
        as_addr(line_no, self.arg(line_no, index, name)?)
    }
}

fn as_addr(line_no: usize, value: &Value) -> Result<u16, ReachError> {
    match value {
        Value::Int(v) if (0..=0xFFFF).contains(v) => Ok(*v as u16),
        Value::Int(v) => Err(err(line_no, format!("address out of range: {v}"))),
        other => Err(err(line_no, format!("expected an address, got {other:?}"))),
    }
}

fn as_int(line_no: usize, value: &Value) -> Result<i64, ReachError> {
    match value {
        Value::Int(v) => Ok(*v),
        other => Err(err(line_no, format!("expected an integer, got {other:?}"))),
    }
}

fn as_str(line_no: usize, value: &Value) -> Result<String, ReachError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(err(line_no, format!("expected a string, got {other:?}"))),
    }
}

/// Parses and applies an annotation script to `db`. Lines that are blank or
/// begin with `#` are ignored. Parsing and dispatch are line-local: a
/// directive never sees state from the line before it.
pub fn apply_script(db: &mut Database, script: &str) -> Result<(), ReachError> {
    for (offset, raw_line) in script.lines().enumerate() {
        let line_no = offset + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens = tokenize(line_no, line)?;
        let call = parse_call(line_no, &tokens)?;
        apply_directive(db, line_no, &call)?;
    }
    Ok(())
}

fn apply_directive(db: &mut Database, line_no: usize, call: &Call) -> Result<(), ReachError> {
    match call.name.as_str() {
        "org" => {
            db.set_org(call.addr(line_no, 0, "addr")?);
        }
        "code" => {
            db.force_code(call.addr(line_no, 0, "addr")?);
        }
        "notcode" => {
            let base = call.addr(line_no, 0, "base")?;
            let max_ = match call.opt_arg(1, "max_") {
                Some(v) => as_addr(line_no, v)?,
                None => base,
            };
            if max_ < base {
                return Err(err(line_no, "notcode: max_ precedes base"));
            }
            for a in base..=max_ {
                db.force_notcode(a);
            }
        }
        "data" => {
            let base = call.addr(line_no, 0, "base")?;
            let type_ = match call.opt_arg(1, "type_") {
                Some(Value::Ident(name)) => parse_data_type(line_no, name)?,
                Some(other) => return Err(err(line_no, format!("bad type_: {other:?}"))),
                None => DataType::Byte,
            };
            let max_arg = call.opt_arg(2, "max_");
            let count_arg = call
                .keyword
                .iter()
                .find(|(k, _)| k == "count")
                .map(|(_, v)| v);
            let count = match (max_arg, count_arg) {
                (Some(_), Some(_)) => {
                    return Err(err(line_no, "data: specify only one of max_ or count"))
                }
                (Some(v), None) => {
                    let max_ = as_addr(line_no, v)?;
                    if max_ < base {
                        return Err(err(line_no, "data: max_ precedes base"));
                    }
                    let span = max_ as u32 - base as u32 + 1;
                    let elem = type_.size() as u32;
                    if span % elem != 0 {
                        return Err(err(
                            line_no,
                            format!("data: span {span} is not a multiple of element size {elem}"),
                        ));
                    }
                    span / elem
                }
                (None, Some(v)) => {
                    let count = as_int(line_no, v)?;
                    if count <= 0 {
                        return Err(err(line_no, "data: count must be positive"));
                    }
                    count as u32
                }
                (None, None) => 1,
            };
            let elem = type_.size() as u32;
            for i in 0..count {
                let addr = base as u32 + i * elem;
                if addr > 0xFFFF {
                    return Err(err(line_no, "data: range exceeds the address space"));
                }
                db.set_data_type(addr as u16, type_);
            }
        }
        "label" => {
            let name = as_str(line_no, call.arg(line_no, 0, "name")?)?;
            let base = call.addr(line_no, 1, "base")?;
            let size = match call.opt_arg(2, "size") {
                Some(v) => as_int(line_no, v)?,
                None => 1,
            };
            if size <= 0 || size > 0xFFFF {
                return Err(err(line_no, "label: size out of range"));
            }
            db.add_label(name, base, size as u16)
                .map_err(|e| err(line_no, e.to_string()))?;
        }
        "operand_disp" => {
            let addr = call.addr(line_no, 0, "addr")?;
            let disp = as_int(line_no, call.arg(line_no, 1, "disp")?)?;
            db.set_operand_disp(addr, disp as i32);
        }
        "operand_label" => {
            let addr = call.addr(line_no, 0, "addr")?;
            let policy = match call.arg(line_no, 1, "policy")? {
                Value::Ident(s) if s == "OPERAND_LABEL_AUTO" => LabelPolicy::Auto,
                Value::Ident(s) if s == "OPERAND_LABEL_NONE" => LabelPolicy::None,
                Value::Str(name) => LabelPolicy::Named(name.clone()),
                other => return Err(err(line_no, format!("bad operand_label policy: {other:?}"))),
            };
            db.set_operand_label_policy(addr, policy);
        }
        "comment_head" => {
            let addr = call.addr(line_no, 0, "addr")?;
            let text = as_str(line_no, call.arg(line_no, 1, "text")?)?;
            db.set_comment_head(addr, text);
        }
        "comment_tail" => {
            let addr = call.addr(line_no, 0, "addr")?;
            let text = as_str(line_no, call.arg(line_no, 1, "text")?)?;
            db.set_comment_tail(addr, text)
                .map_err(|e| err(line_no, e.to_string()))?;
        }
        other => return Err(err(line_no, format!("unknown directive: {other}"))),
    }
    Ok(())
}

fn parse_data_type(line_no: usize, name: &str) -> Result<DataType, ReachError> {
    match name {
        "BYTE" => Ok(DataType::Byte),
        "WORD" => Ok(DataType::Word),
        other => Err(err(line_no, format!("unknown data type: {other}"))),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Serializes `db` to an annotation script that [`apply_script`] can re-parse
/// into an equivalent database. Emission order: `org`, CODE cells ascending,
/// coalesced NOTCODE runs, non-BYTE data types, labels ascending by address,
/// non-default operand hints, then comments.
pub fn save_script(db: &Database) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# reach6502 annotation script");
    let _ = writeln!(out);
    let _ = writeln!(out, "org({:#06X})", db.org());
    let _ = writeln!(out);

    for addr in 0..=0xFFFFu32 {
        if db.is_code(addr as u16) {
            let _ = writeln!(out, "code({addr:#06X})");
        }
    }
    let _ = writeln!(out);

    let mut addr = 0u32;
    while addr <= 0xFFFF {
        if db.is_notcode(addr as u16) {
            let start = addr;
            while addr <= 0xFFFF && db.is_notcode(addr as u16) {
                addr += 1;
            }
            let max_ = addr - 1;
            if max_ == start {
                let _ = writeln!(out, "notcode({start:#06X})");
            } else {
                let _ = writeln!(out, "notcode({start:#06X}, max_={max_:#06X})");
            }
        } else {
            addr += 1;
        }
    }
    let _ = writeln!(out);

    for addr in 0..=0xFFFFu32 {
        if db.data_type(addr as u16) != DataType::Byte {
            let _ = writeln!(
                out,
                "data({addr:#06X}, type_={})",
                db.data_type(addr as u16).name()
            );
        }
    }
    let _ = writeln!(out);

    let mut labels: Vec<_> = db.labels().collect();
    labels.sort_by_key(|l| (l.addr, l.name.clone()));
    for label in &labels {
        if label.size == 1 {
            let _ = writeln!(out, "label({}, {:#06X})", quote(&label.name), label.addr);
        } else {
            let _ = writeln!(
                out,
                "label({}, {:#06X}, size={})",
                quote(&label.name),
                label.addr,
                label.size
            );
        }
    }
    let _ = writeln!(out);

    for addr in 0..=0xFFFFu32 {
        let addr = addr as u16;
        let hint = db.operand_hint(addr);
        if hint.disp != 0 {
            let _ = writeln!(out, "operand_disp({addr:#06X}, {})", hint.disp);
        }
        match &hint.label_policy {
            LabelPolicy::Auto => {}
            LabelPolicy::None => {
                let _ = writeln!(out, "operand_label({addr:#06X}, OPERAND_LABEL_NONE)");
            }
            LabelPolicy::Named(name) => {
                let _ = writeln!(out, "operand_label({addr:#06X}, {})", quote(name));
            }
        }
    }
    let _ = writeln!(out);

    for addr in 0..=0xFFFFu32 {
        let addr = addr as u16;
        let comment = db.comment(addr);
        if let Some(head) = &comment.head {
            let _ = writeln!(out, "comment_head({addr:#06X}, {})", quote(head));
        }
        if let Some(tail) = comment.tail() {
            let _ = writeln!(out, "comment_tail({addr:#06X}, {})", quote(tail));
        }
    }

    out
}
