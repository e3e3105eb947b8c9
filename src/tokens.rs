use crate::types::LispInt;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    OpenRoundBracket,
    CloseRoundBracket,
    Integer(LispInt),
    Float(f64),
    Symbol(String),
}

/// Integers take priority over floats so that exact arithmetic survives wherever the
/// source allows it, whatever the magnitude. Anything that is not a number is a symbol.
pub fn classify(token: &str) -> Token {
    if is_integer_literal(token) {
        if let Ok(value) = token.parse::<LispInt>() {
            return Token::Integer(value);
        }
    }
    if let Ok(value) = token.parse::<f64>() {
        return Token::Float(value);
    }
    Token::Symbol(String::from(token))
}

// An optional sign followed by decimal digits and nothing else.
fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix(&['+', '-'][..]).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Pads every bracket with whitespace and splits on whitespace runs. There are no
/// strings, comments or quote characters: anything that isn't a bracket or whitespace
/// ends up in a plain token.
pub fn tokenize(input: &str) -> Vec<Token> {
    lazy_static! {
        static ref BRACKET_RE: Regex = Regex::new(r"[()]").unwrap();
    }
    let padded = BRACKET_RE.replace_all(input, " $0 ");
    padded
        .split_whitespace()
        .map(|fragment| match fragment {
            "(" => Token::OpenRoundBracket,
            ")" => Token::CloseRoundBracket,
            _ => classify(fragment),
        })
        .collect()
}
