use crate::environment::Environment;
use crate::evaluator::{eval, Error, Result};
use crate::types::{truthy, Arity, Closure, LispObject, LispSymbol};
use std::rc::Rc;

/// The reserved heads. They are matched on the literal symbol before anything is
/// evaluated, so binding a variable with one of these names can't change their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Define,
    If,
    Quote,
    Set,
    Lambda,
}

impl SpecialForm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "define" => Some(Self::Define),
            "if" => Some(Self::If),
            "quote" => Some(Self::Quote),
            "set!" => Some(Self::Set),
            "lambda" => Some(Self::Lambda),
            _ => None,
        }
    }

    pub fn recognise(head: &LispObject) -> Option<Self> {
        match head {
            LispObject::Symbol(name) => Self::from_name(name),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Define => "define",
            Self::If => "if",
            Self::Quote => "quote",
            Self::Set => "set!",
            Self::Lambda => "lambda",
        }
    }

    // Operands after the head.
    fn arity(self) -> Arity {
        match self {
            Self::Define | Self::Set | Self::Lambda => Arity::exactly(2),
            Self::If => Arity::exactly(3),
            Self::Quote => Arity::exactly(1),
        }
    }
}

pub fn apply(form: SpecialForm, args: &[LispObject], env: &Rc<Environment>) -> Result {
    form.arity()
        .validate_for(args.len(), form.name())
        .map_err(Error::ArityMismatch)?;
    match form {
        SpecialForm::Define => apply_define(&args[0], &args[1], env),
        SpecialForm::If => apply_if(&args[0], &args[1], &args[2], env),
        SpecialForm::Quote => Ok(args[0].clone()),
        SpecialForm::Set => apply_set(&args[0], &args[1], env),
        SpecialForm::Lambda => apply_lambda(&args[0], &args[1], env),
    }
}

fn apply_define(key: &LispObject, value: &LispObject, env: &Rc<Environment>) -> Result {
    let key = key.as_symbol()?;
    let value = eval(value, env)?;
    log::debug!("define {} as {}", key, value);
    env.define(key.clone(), value);
    Ok(LispObject::Nil)
}

fn apply_set(key: &LispObject, value: &LispObject, env: &Rc<Environment>) -> Result {
    let key = key.as_symbol()?;
    let value = eval(value, env)?;
    log::debug!("set! {} to {}", key, value);
    if !env.deep_set(key, value) {
        log::warn!("set! on unbound name {} had no effect", key);
    }
    Ok(LispObject::Nil)
}

// Only the chosen branch is evaluated.
fn apply_if(
    test: &LispObject,
    consequent: &LispObject,
    alternative: &LispObject,
    env: &Rc<Environment>,
) -> Result {
    let condition = eval(test, env)?;
    if truthy(&condition) {
        eval(consequent, env)
    } else {
        eval(alternative, env)
    }
}

fn apply_lambda(parameters: &LispObject, body: &LispObject, env: &Rc<Environment>) -> Result {
    let parameters: std::result::Result<Vec<LispSymbol>, _> = parameters
        .as_list()?
        .iter()
        .map(|obj| obj.as_symbol().map(LispSymbol::clone))
        .collect();
    let closure = Closure {
        parameters: parameters?,
        body: body.clone(),
        parent: env.clone(),
    };
    Ok(LispObject::Closure(Rc::new(closure)))
}
