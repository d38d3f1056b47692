//! Restricted literal parser for legacy dictionary strings.
//!
//! Older writers stored small dictionaries as their textual representation,
//! e.g. `{'n_pcs': 50, 'flavor': 'seurat'}`. This parser accepts only literal
//! syntax: dicts, lists, tuples, strings, byte strings, integers, floats,
//! `True`, `False` and `None`. Names, calls, operators and every other
//! expression form are rejected, so file content is never evaluated.

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, cut_err, opt, peek};
use winnow::error::{ContextError, ErrMode};
use winnow::token::{any, one_of, take, take_while};
use winnow::{ModalResult, Parser};

use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::models::Literal;

/// Containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 64;

/// Parses `text` as a single literal.
///
/// # Errors
/// Returns [`H5adError::Decode`] naming `path` when `text` is not exactly one
/// well-formed literal.
pub fn parse(path: &str, text: &str) -> Result<Literal> {
    document
        .parse(text)
        .map_err(|e| H5adError::decode(path, format!("not a valid literal: {}", e)))
}

fn document(input: &mut &str) -> ModalResult<Literal> {
    value(input, 0)
}

fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

fn value(input: &mut &str, depth: usize) -> ModalResult<Literal> {
    if depth > MAX_DEPTH {
        return Err(cut());
    }
    multispace0.parse_next(input)?;
    let literal = match peek(any).parse_next(input)? {
        '{' => dict(input, depth + 1)?,
        '[' => list(input, depth + 1)?,
        '(' => tuple(input, depth + 1)?,
        _ => alt((string, number, keyword)).parse_next(input)?,
    };
    multispace0.parse_next(input)?;
    Ok(literal)
}

/// Comma-separated values up to `close`. Returns the items and whether any
/// comma was seen.
fn sequence(input: &mut &str, close: char, depth: usize) -> ModalResult<(Vec<Literal>, bool)> {
    let mut items = Vec::new();
    let mut saw_comma = false;
    loop {
        multispace0.parse_next(input)?;
        if opt(close).parse_next(input)?.is_some() {
            return Ok((items, saw_comma));
        }
        items.push(cut_err(|i: &mut &str| value(i, depth)).parse_next(input)?);
        if opt(',').parse_next(input)?.is_some() {
            saw_comma = true;
            continue;
        }
        cut_err(close).parse_next(input)?;
        return Ok((items, saw_comma));
    }
}

fn list(input: &mut &str, depth: usize) -> ModalResult<Literal> {
    '['.parse_next(input)?;
    let (items, _) = sequence(input, ']', depth)?;
    Ok(Literal::List(items))
}

fn tuple(input: &mut &str, depth: usize) -> ModalResult<Literal> {
    '('.parse_next(input)?;
    let (mut items, saw_comma) = sequence(input, ')', depth)?;
    // `(x)` is a parenthesized value, `(x,)` a one-element tuple
    if items.len() == 1 && !saw_comma {
        return Ok(items.remove(0));
    }
    Ok(Literal::Tuple(items))
}

fn dict(input: &mut &str, depth: usize) -> ModalResult<Literal> {
    '{'.parse_next(input)?;
    let mut items: Vec<(Literal, Literal)> = Vec::new();
    loop {
        multispace0.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            return Ok(Literal::Dict(items));
        }
        let key = cut_err(|i: &mut &str| value(i, depth)).parse_next(input)?;
        if matches!(key, Literal::List(_) | Literal::Dict(_)) {
            // unhashable key
            return Err(cut());
        }
        cut_err(':').parse_next(input)?;
        let val = cut_err(|i: &mut &str| value(i, depth)).parse_next(input)?;
        match items.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = val,
            None => items.push((key, val)),
        }
        if opt(',').parse_next(input)?.is_some() {
            continue;
        }
        cut_err('}').parse_next(input)?;
        return Ok(Literal::Dict(items));
    }
}

fn string(input: &mut &str) -> ModalResult<Literal> {
    let prefix = opt(one_of(['b', 'B', 'u', 'U'])).parse_next(input)?;
    let is_bytes = matches!(prefix, Some('b' | 'B'));
    let quote = one_of(['\'', '"']).parse_next(input)?;

    let mut out: Vec<u8> = Vec::new();
    let mut utf8 = [0u8; 4];
    loop {
        let c = cut_err(any).parse_next(input)?;
        if c == quote {
            break;
        }
        let decoded = match c {
            '\n' => return Err(cut()),
            '\\' => match cut_err(any).parse_next(input)? {
                '\\' => '\\',
                '\'' => '\'',
                '"' => '"',
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                'x' => {
                    let code = hex_code(input, 2)?;
                    if is_bytes {
                        out.push(code as u8);
                        continue;
                    }
                    char::from_u32(code).ok_or_else(cut)?
                }
                'u' if !is_bytes => char::from_u32(hex_code(input, 4)?).ok_or_else(cut)?,
                'U' if !is_bytes => char::from_u32(hex_code(input, 8)?).ok_or_else(cut)?,
                other => {
                    // unknown escapes keep their backslash
                    out.push(b'\\');
                    other
                }
            },
            other => other,
        };
        out.extend_from_slice(decoded.encode_utf8(&mut utf8).as_bytes());
    }

    if is_bytes {
        Ok(Literal::Bytes(out))
    } else {
        String::from_utf8(out).map(Literal::Str).map_err(|_| cut())
    }
}

fn hex_code(input: &mut &str, digits: usize) -> ModalResult<u32> {
    let text: &str = cut_err(take(digits)).parse_next(input)?;
    u32::from_str_radix(text, 16).map_err(|_| cut())
}

fn number(input: &mut &str) -> ModalResult<Literal> {
    let text = (
        opt(one_of(['-', '+'])),
        alt(((digit1, opt(('.', opt(digit1)))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;

    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().map(Literal::Float).map_err(|_| cut())
    } else {
        text.trim_start_matches('+')
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| cut())
    }
}

fn keyword(input: &mut &str) -> ModalResult<Literal> {
    let word = take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)?;
    match word {
        "True" => Ok(Literal::Bool(true)),
        "False" => Ok(Literal::Bool(false)),
        "None" => Ok(Literal::None),
        _ => Err(backtrack()),
    }
}
