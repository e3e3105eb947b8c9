use crate::tokens::{tokenize, Token};
use crate::types::{LispList, LispObject};
use derive_more::Display;
use std::collections::VecDeque;

#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "unexpected EOF while reading")]
    UnexpectedEof,
    #[display(fmt = "unexpected ')'")]
    UnmatchedCloseParen,
}

pub type Result<T = LispObject> = std::result::Result<T, Error>;

/// Reads the first expression on a line. Anything after it is left for the caller.
pub fn read_str(input: &str) -> Result {
    let mut tokens: VecDeque<Token> = tokenize(input).into();
    let form = read_form(&mut tokens)?;
    if !tokens.is_empty() {
        log::debug!("ignoring {} trailing tokens after {}", tokens.len(), form);
    }
    Ok(form)
}

/// Reads every expression in `input`, in order.
pub fn read_all(input: &str) -> Result<Vec<LispObject>> {
    let mut tokens: VecDeque<Token> = tokenize(input).into();
    let mut forms = Vec::new();
    while !tokens.is_empty() {
        forms.push(read_form(&mut tokens)?);
    }
    Ok(forms)
}

/// Consumes one expression from the front of `tokens`.
pub fn read_form(tokens: &mut VecDeque<Token>) -> Result {
    match tokens.pop_front() {
        None => Err(Error::UnexpectedEof),
        Some(Token::OpenRoundBracket) => read_list(tokens).map(|list| LispObject::wrap_list(list.0)),
        Some(Token::CloseRoundBracket) => Err(Error::UnmatchedCloseParen),
        Some(token) => Ok(read_atom(token)),
    }
}

fn read_list(tokens: &mut VecDeque<Token>) -> Result<LispList> {
    let mut elements = LispList::default();
    loop {
        match tokens.front() {
            None => return Err(Error::UnexpectedEof),
            Some(Token::CloseRoundBracket) => {
                tokens.pop_front();
                return Ok(elements);
            }
            Some(_) => elements.push(read_form(tokens)?),
        }
    }
}

fn read_atom(token: Token) -> LispObject {
    match token {
        Token::Integer(value) => LispObject::Integer(value),
        Token::Float(value) => LispObject::Float(value),
        Token::Symbol(name) => LispObject::new_symbol(&name),
        Token::OpenRoundBracket | Token::CloseRoundBracket => {
            unreachable!("brackets are handled by read_form")
        }
    }
}
