use crate::environment::{Environment, Scope, UnboundName};
use crate::special_forms::{self, SpecialForm};
use crate::types::{BadArgCount, Closure, Kind, LispObject, PrimitiveFn, TypeMismatch};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = LispObject> = std::result::Result<T, Error>;
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnboundName(UnboundName),
    ArityMismatch(BadArgCount),
    TypeMismatch(TypeMismatch),
    EmptyListAccess(&'static str),
    DivideByZero,
    IntegerOverflow(&'static str),
    MathDomain(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnboundName(e) => write!(f, "{}", e),
            Error::ArityMismatch(e) => write!(f, "{}", e),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {}", e),
            Error::EmptyListAccess(name) => write!(f, "{}: empty list", name),
            Error::DivideByZero => write!(f, "cannot divide by zero!"),
            Error::IntegerOverflow(name) => write!(f, "{}: integer overflow", name),
            Error::MathDomain(name) => write!(f, "{}: math domain error", name),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

/// Evaluates `ast` in `env`. Reserved heads are dispatched before the head is evaluated;
/// every other list is an application.
pub fn eval(ast: &LispObject, env: &Rc<Environment>) -> Result {
    log::trace!("eval {}", ast);
    match ast {
        LispObject::Symbol(s) => env.fetch(s).map_err(Error::UnboundName),
        LispObject::List(list) => match list.split_first() {
            None => Ok(ast.clone()),
            Some((head, rest)) => {
                if let Some(form) = SpecialForm::recognise(head) {
                    return special_forms::apply(form, rest, env);
                }
                let callable = eval(head, env)?;
                let args = evaluate_sequence_elementwise(rest, env)?;
                apply(&callable, &args)
            }
        },
        _ => Ok(ast.clone()),
    }
}

pub fn evaluate_sequence_elementwise(
    seq: &[LispObject],
    env: &Rc<Environment>,
) -> Result<Vec<LispObject>> {
    seq.iter().map(|obj| eval(obj, env)).collect()
}

pub fn apply(callable: &LispObject, args: &[LispObject]) -> Result {
    match callable {
        LispObject::Primitive(f) => call_primitive(f, args),
        LispObject::Closure(f) => call_closure(f, args),
        other => Err(Error::TypeMismatch(TypeMismatch {
            expected: Kind::Procedure,
            got: other.kind(),
        })),
    }
}

pub(crate) fn pretty_print_args(args: &[LispObject]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &PrimitiveFn, args: &[LispObject]) -> Result {
    func.arity
        .validate_for(args.len(), func.name)
        .map_err(Error::ArityMismatch)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

fn call_closure(func: &Closure, args: &[LispObject]) -> Result {
    let env = make_closure_env(func, args)?;
    eval(&func.body, &env)
}

fn make_closure_env(func: &Closure, args: &[LispObject]) -> Result<Rc<Environment>> {
    log::trace!("Call {} with {}", func, pretty_print_args(args));
    let arity = func.arity();
    if !arity.contains(args.len()) {
        return Err(Error::ArityMismatch(BadArgCount {
            name: func.to_string(),
            expected: arity,
            got: args.len(),
        }));
    }
    let bindings: Scope = func
        .parameters
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect();
    Ok(Environment::new_child(bindings, Some(&func.parent)))
}
