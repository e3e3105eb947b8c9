use crate::environment::Environment;
use crate::{evaluator, printer, reader, LispObject};
use std::fmt;
use std::rc::Rc;

pub type Result = std::result::Result<LispObject, Error>;
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "read error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        Self::Read(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Self::Eval(e)
    }
}

#[allow(non_snake_case)]
pub fn READ(line: &str) -> Result {
    reader::read_str(line).map_err(Error::Read)
}

#[allow(non_snake_case)]
pub fn EVAL(obj: &LispObject, env: &Rc<Environment>) -> Result {
    evaluator::eval(obj, env).map_err(Error::Eval)
}

#[allow(non_snake_case)]
pub fn PRINT(obj: &LispObject) -> Option<String> {
    printer::print(obj)
}

/// Reads one expression from `line` and evaluates it.
pub fn evaluate(line: &str, env: &Rc<Environment>) -> Result {
    READ(line).and_then(|ast| EVAL(&ast, env))
}

pub fn rep(line: &str, env: &Rc<Environment>) -> std::result::Result<Option<String>, Error> {
    evaluate(line, env).map(|obj| PRINT(&obj))
}
