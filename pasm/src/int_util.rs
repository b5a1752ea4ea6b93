use crate::parser::Rule;
use crate::{new_parser_error, Result};
use num_traits::Num;
use pcpu::Word;
use pest::iterators::Pair;

/// Parses an integer literal pair into a machine word.
///
/// Accepts decimal and `0x` hexadecimal, optionally negated. Values in
/// `(i32::MAX, u32::MAX]` are reinterpreted as their two's-complement
/// word, so `0xFFFFFFFF` assembles to `-1`.
pub fn process_int(pair: &Pair<Rule>) -> Result<Word> {
    let span = pair.as_span();
    let text = span.as_str();

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (radix, digits) = if body.starts_with("0x") || body.starts_with("0X") {
        (16, &body[2..])
    } else {
        (10, body)
    };

    let magnitude = <i64 as Num>::from_str_radix(digits, radix)
        .map_err(|err| new_parser_error(span.clone(), format!("Parsing integer failed: {}", err)))?;
    let value = if negative { -magnitude } else { magnitude };

    if value < i64::from(Word::min_value()) || value > i64::from(u32::max_value()) {
        return Err(new_parser_error(
            span,
            "Integer literal out of range for a machine word".to_string(),
        ));
    }

    Ok(value as Word)
}
